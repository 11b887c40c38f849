//! Turning participants into Telegram HTML mentions.

use rollcall_core::Participant;

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// `@handle` when the participant has one, otherwise a user link.
pub fn mention(participant: &Participant) -> String {
    if let Some(handle) = participant.handle.as_deref().filter(|h| !h.is_empty()) {
        return format!("@{}", escape_html(handle));
    }
    let label = participant
        .full_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .map(escape_html)
        .unwrap_or_else(|| "👤".to_string());
    format!("<a href=\"tg://user?id={}\">{}</a>", participant.id, label)
}

/// Comma-separated mentions.
pub fn mention_list(participants: &[Participant]) -> String {
    participants
        .iter()
        .map(mention)
        .collect::<Vec<_>>()
        .join(", ")
}
