use crate::api::ChatBackend;
use crate::sync::{SyncController, SyncOutcome};
use crate::ui::chat_view::ChatView;
use crate::ui::sidebar::{render_header, render_profiles};
use colored::Colorize;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const HELP: &str = "\
Type a message and press Enter to send it.
  /new            start a new conversation
  /profiles       list available profiles
  /profile <id>   switch profile
  /id             show the conversation id
  /refresh        reload history from the server
  /help           show this help
  /quit           exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    New,
    Profiles,
    Profile(String),
    Id,
    Refresh,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Send(line.to_string());
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name {
            "new" => Command::New,
            "profiles" => Command::Profiles,
            "profile" if !arg.is_empty() => Command::Profile(arg.to_string()),
            "profile" => Command::Profiles,
            "id" => Command::Id,
            "refresh" => Command::Refresh,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        }
    }
}

/// Read commands from `input` until EOF or `/quit`, printing to `out`.
pub async fn run<B, R, W>(
    controller: &SyncController<B>,
    input: R,
    out: &mut W,
    width: usize,
) -> std::io::Result<()>
where
    B: ChatBackend,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut view = ChatView::new(width);
    let mut lines = input.lines();

    writeln!(out, "{}", render_header(&controller.session()))?;
    write!(out, "{}", view.update(&controller.session()))?;
    out.flush()?;

    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Id => {
                let session = controller.session();
                writeln!(out, "{}", session.conversation_id.as_deref().unwrap_or("—"))?;
            }
            Command::Profiles => write!(out, "{}", render_profiles(&controller.session()))?,
            Command::Profile(id) => {
                let known = controller.session().profiles.iter().any(|p| p.id == id);
                if !known {
                    writeln!(out, "{}", format!("unknown profile: {}", id).red())?;
                    continue;
                }
                if controller.switch_profile(&id).await.is_ok() {
                    writeln!(out, "{}", render_header(&controller.session()))?;
                } else {
                    write!(out, "{}", view.update(&controller.session()))?;
                }
            }
            Command::New => {
                controller.start_new_conversation();
                view.reset();
                writeln!(out, "{}", render_header(&controller.session()))?;
                write!(out, "{}", view.update(&controller.session()))?;
            }
            Command::Refresh => {
                let outcome = controller.refresh_history().await;
                if outcome == SyncOutcome::Skipped {
                    writeln!(out, "{}", "nothing to refresh".dimmed())?;
                }
                write!(out, "{}", view.update(&controller.session()))?;
            }
            Command::Unknown(name) => {
                writeln!(out, "{}", format!("unknown command /{}; try /help", name).red())?;
            }
            Command::Send(text) => {
                let before = controller.session().conversation_id;
                // One poll appends the optimistic message; draw it before waiting on the reply.
                let mut submit = std::pin::pin!(controller.submit(&text));
                let finished = tokio::select! {
                    biased;
                    outcome = &mut submit => Some(outcome),
                    _ = std::future::ready(()) => None,
                };
                let outcome = match finished {
                    Some(outcome) => outcome,
                    None => {
                        write!(out, "{}", view.update(&controller.session()))?;
                        out.flush()?;
                        submit.await
                    }
                };
                log::debug!("submit finished: {:?}", outcome);
                let session = controller.session();
                if session.conversation_id != before {
                    writeln!(out, "{}", render_header(&session))?;
                }
                write!(out, "{}", view.update(&session))?;
            }
        }
        out.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_sent_trimmed() {
        assert_eq!(Command::parse("  hello there \n"), Command::Send("hello there".into()));
        assert_eq!(Command::parse("   "), Command::Empty);
    }

    #[test]
    fn slash_commands() {
        assert_eq!(Command::parse("/new"), Command::New);
        assert_eq!(Command::parse("/profile  general "), Command::Profile("general".into()));
        assert_eq!(Command::parse("/profile"), Command::Profiles);
        assert_eq!(Command::parse("/exit"), Command::Quit);
        assert_eq!(Command::parse("/frobnicate now"), Command::Unknown("frobnicate".into()));
    }
}
