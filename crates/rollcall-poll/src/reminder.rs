//! Reminder computation: who gets mentioned after a round closes.
//!
//! Pure and deterministic. Confirmed participants come first, then those who
//! never answered, each group in roster order. Participants who answered
//! "no" are left out. When nobody confirmed, the whole roster is mentioned.

use std::collections::HashSet;

use rollcall_core::{Participant, PollId, PollOption};
use serde::{Deserialize, Serialize};

use crate::state::PollState;

/// Counts over the roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSummary {
    pub confirmed_count: usize,
    pub unanswered_count: usize,
    pub declined_count: usize,
}

/// What the follow-up message should address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderPayload {
    pub poll_id: PollId,
    /// Ordered, no duplicates.
    pub recipients: Vec<Participant>,
    pub summary: ReminderSummary,
    /// Nobody confirmed, so the whole roster is mentioned.
    pub escalated: bool,
}

impl ReminderPayload {
    /// Recipients who confirmed. Empty when escalated.
    pub fn confirmed(&self) -> &[Participant] {
        if self.escalated {
            return &[];
        }
        &self.recipients[..self.summary.confirmed_count]
    }

    /// Recipients who never answered. Empty when escalated.
    pub fn unanswered(&self) -> &[Participant] {
        if self.escalated {
            return &[];
        }
        &self.recipients[self.summary.confirmed_count..]
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }
}

/// Compute the mention list for a closed round.
pub fn compute(poll: &PollState, roster: &[Participant]) -> ReminderPayload {
    let mut seen = HashSet::new();
    let roster: Vec<&Participant> = roster.iter().filter(|p| seen.insert(p.id)).collect();

    let mut answered_yes = Vec::new();
    let mut unanswered = Vec::new();
    let mut declined_count = 0;

    for participant in &roster {
        match poll.answer_of(participant.id) {
            Some(PollOption::Affirmative) => answered_yes.push((*participant).clone()),
            Some(PollOption::Negative) => declined_count += 1,
            None => unanswered.push((*participant).clone()),
        }
    }

    let summary = ReminderSummary {
        confirmed_count: answered_yes.len(),
        unanswered_count: unanswered.len(),
        declined_count,
    };

    let escalated = answered_yes.is_empty() && !roster.is_empty();
    let recipients = if answered_yes.is_empty() {
        roster.into_iter().cloned().collect()
    } else {
        answered_yes.extend(unanswered);
        answered_yes
    };

    ReminderPayload {
        poll_id: poll.id,
        recipients,
        summary,
        escalated,
    }
}
