//! One attendance round.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rollcall_core::{ParticipantId, PollId, PollOption};
use serde::{Deserialize, Serialize};

/// Round status. A closed round is never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollStatus {
    Open,
    Closed,
}

/// A single poll round and the answers collected for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollState {
    pub id: PollId,
    pub opened_at: DateTime<Utc>,
    /// Next report instant known when the round was opened.
    pub expected_close_at: Option<DateTime<Utc>>,
    /// Transport-side poll id, set once the poll has been posted.
    #[serde(default)]
    pub external_ref: Option<String>,
    pub status: PollStatus,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    answers: BTreeMap<ParticipantId, PollOption>,
}

impl PollState {
    /// Fresh open round with no answers.
    pub fn open(id: PollId, opened_at: DateTime<Utc>, expected_close_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id,
            opened_at,
            expected_close_at,
            external_ref: None,
            status: PollStatus::Open,
            closed_at: None,
            answers: BTreeMap::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PollStatus::Open
    }

    pub fn answers(&self) -> &BTreeMap<ParticipantId, PollOption> {
        &self.answers
    }

    pub fn answer_of(&self, participant: ParticipantId) -> Option<PollOption> {
        self.answers.get(&participant).copied()
    }

    pub fn answer_count(&self) -> usize {
        self.answers.len()
    }

    pub fn affirmative_count(&self) -> usize {
        self.answers.values().filter(|o| o.is_affirmative()).count()
    }

    /// Crate-internal write access; callers go through the registry.
    pub(crate) fn answers_mut(&mut self) -> &mut BTreeMap<ParticipantId, PollOption> {
        &mut self.answers
    }

    pub(crate) fn close(&mut self, at: DateTime<Utc>) {
        self.status = PollStatus::Closed;
        self.closed_at = Some(at);
    }
}
