//! Message texts (Telegram HTML).

use rollcall_channels::mention::{escape_html, mention_list};
use rollcall_core::config::ReminderConfig;
use rollcall_poll::{ParticipantDirectory, PollState, ReminderPayload};

/// Reminder message for a closed round.
pub fn reminder(payload: &ReminderPayload, config: &ReminderConfig) -> String {
    let mut lines = vec![escape_html(&config.header)];

    if payload.escalated {
        lines.push(String::new());
        lines.push(escape_html(&config.escalation_label));
        lines.push(mention_list(&payload.recipients));
        return lines.join("\n");
    }

    let confirmed = payload.confirmed();
    if !confirmed.is_empty() {
        lines.push(String::new());
        lines.push(escape_html(&config.confirmed_label));
        lines.push(mention_list(confirmed));
    }
    let unanswered = payload.unanswered();
    if !unanswered.is_empty() {
        lines.push(String::new());
        lines.push(escape_html(&config.unanswered_label));
        lines.push(mention_list(unanswered));
    }
    lines.join("\n")
}

/// `/status` reply.
pub fn status(poll: Option<&PollState>) -> String {
    match poll {
        None => "📭 No open poll.".to_string(),
        Some(poll) => format!(
            "📊 Poll #{}: {} answer(s), {} yes.",
            poll.id,
            poll.answer_count(),
            poll.affirmative_count()
        ),
    }
}

/// `/answers` reply: one line per answer, in participant-id order.
pub fn answers(
    poll: Option<&PollState>,
    directory: &ParticipantDirectory,
    affirmative: &str,
    negative: &str,
) -> String {
    let Some(poll) = poll else {
        return "📭 No open poll.".to_string();
    };
    if poll.answer_count() == 0 {
        return "🤷 Nobody answered yet.".to_string();
    }
    poll.answers()
        .iter()
        .map(|(id, option)| {
            let name = directory
                .get(*id)
                .map(|p| p.display_name())
                .unwrap_or_else(|| id.to_string());
            let label = if option.is_affirmative() { affirmative } else { negative };
            format!("{}: {}", escape_html(&name), escape_html(label))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
