use crate::api::models::{ChatMessage, Role};
use crate::session::ConversationSession;
use colored::Colorize;

pub const DEFAULT_WIDTH: usize = 72;

/// Greedy word wrap; words longer than `width` are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(8);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word;
            while word.chars().count() > width {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let cut = word.char_indices().nth(width).map(|(i, _)| i).unwrap_or(word.len());
                lines.push(word[..cut].to_string());
                word = &word[cut..];
            }
            if line.is_empty() {
                line.push_str(word);
            } else if line.chars().count() + 1 + word.chars().count() <= width {
                line.push(' ');
                line.push_str(word);
            } else {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            }
        }
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// One message as a bubble: user text on the right, assistant on the left.
pub fn render_bubble(msg: &ChatMessage, width: usize) -> String {
    let inner = width * 3 / 4;
    let lines = wrap(&msg.text, inner);
    let bubble_width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for line in lines {
        let padded = format!(" {:<w$} ", line, w = bubble_width);
        match msg.role {
            Role::User => {
                let indent = width.saturating_sub(bubble_width + 2);
                out.push_str(&" ".repeat(indent));
                out.push_str(&padded.black().on_cyan().to_string());
            }
            Role::Assistant => {
                out.push_str(&padded.white().on_bright_black().to_string());
            }
        }
        out.push('\n');
    }
    out
}

/// Tracks what has been printed so only new messages are rendered.
#[derive(Debug, Default)]
pub struct ChatView {
    shown: Vec<ChatMessage>,
    width: usize,
}

impl ChatView {
    pub fn new(width: usize) -> Self {
        Self {
            shown: Vec::new(),
            width,
        }
    }

    /// Text to print for the new state. Reconciliation may rewrite earlier
    /// messages, in which case the whole conversation is printed again.
    pub fn update(&mut self, session: &ConversationSession) -> String {
        let mut out = String::new();
        let is_prefix = session.messages.len() >= self.shown.len()
            && session.messages[..self.shown.len()] == self.shown[..];
        let start = if is_prefix { self.shown.len() } else { 0 };
        if !is_prefix && !session.messages.is_empty() {
            out.push_str(&format!("{}\n", "── conversation ──".dimmed()));
        }
        for msg in &session.messages[start..] {
            out.push_str(&render_bubble(msg, self.width));
        }
        if session.messages.is_empty() {
            out.push_str(&format!(
                "{}\n",
                "Start a debate! Pick a profile and type your first message.".bold()
            ));
            if let Some(err) = &session.profiles_error {
                out.push_str(&format!("{}\n", err.red()));
            }
        }
        if session.pending {
            out.push_str(&format!("{}\n", "… thinking …".italic().dimmed()));
        }
        if let Some(err) = &session.last_error {
            out.push_str(&format!("{}\n", err.red()));
        }
        self.shown = session.messages.clone();
        out
    }

    pub fn reset(&mut self) {
        self.shown.clear();
    }
}
