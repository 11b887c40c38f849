//! Shared domain types.

use serde::{Deserialize, Serialize};

/// Opaque participant identifier (Telegram user id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub i64);

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Poll round identifier, increasing by one per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PollId(pub u64);

impl std::fmt::Display for PollId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A person who may answer the poll. Supplied by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    /// Username without the leading `@`.
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl Participant {
    pub fn new(id: i64) -> Self {
        Self {
            id: ParticipantId(id),
            handle: None,
            full_name: None,
        }
    }

    pub fn with_handle(mut self, handle: &str) -> Self {
        self.handle = Some(handle.trim_start_matches('@').to_string());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.full_name = Some(name.to_string());
        self
    }

    /// Best human-readable label: full name, then handle, then the raw id.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.full_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        if let Some(handle) = &self.handle {
            return format!("@{handle}");
        }
        self.id.to_string()
    }
}

/// The two possible answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PollOption {
    Affirmative,
    Negative,
}

impl PollOption {
    /// Option index 0 is the affirmative answer, anything else is negative.
    pub fn from_index(index: u32) -> Self {
        if index == 0 {
            PollOption::Affirmative
        } else {
            PollOption::Negative
        }
    }

    pub fn is_affirmative(&self) -> bool {
        matches!(self, PollOption::Affirmative)
    }
}

impl std::fmt::Display for PollOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollOption::Affirmative => write!(f, "yes"),
            PollOption::Negative => write!(f, "no"),
        }
    }
}

/// Events delivered by a transport, already decoded into domain terms.
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingEvent {
    /// Someone voted in (or retracted from) a poll.
    Answer {
        /// Transport-side poll identifier the vote belongs to.
        poll_ref: String,
        participant: Participant,
        /// Chosen option indices; empty means the vote was retracted.
        option_ids: Vec<u32>,
    },
    /// A slash command posted in a chat.
    Command {
        chat_id: String,
        sender: Participant,
        /// Command name without the leading `/` and any `@botname` suffix.
        name: String,
        args: String,
    },
}
