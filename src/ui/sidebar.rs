use crate::session::ConversationSession;
use colored::Colorize;

/// Header line with the current conversation id and profile.
pub fn render_header(session: &ConversationSession) -> String {
    let id = session.conversation_id.as_deref().unwrap_or("—");
    let profile = session
        .active_profile()
        .map(|p| p.display_name.as_str())
        .unwrap_or(session.active_profile_id.as_str());
    format!(
        "{} {}   {} {}",
        "Conversation ID:".dimmed(),
        id,
        "Profile:".dimmed(),
        if profile.is_empty() { "—" } else { profile }
    )
}

/// Profile list with the active entry marked.
pub fn render_profiles(session: &ConversationSession) -> String {
    if session.profiles.is_empty() {
        return format!("{}\n", "No profiles available.".dimmed());
    }
    let mut out = String::new();
    for p in &session.profiles {
        let marker = if p.id == session.active_profile_id { "*" } else { " " };
        out.push_str(&format!("{} {:<20} {}\n", marker, p.id, p.display_name.dimmed()));
    }
    if let Some(err) = &session.profiles_error {
        out.push_str(&format!("{}\n", err.red()));
    }
    out
}
