//! Seams between the poll core and its collaborators.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::Participant;

/// Source of the current time. Injected so tests can drive it by hand.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// A recurring calendar trigger.
pub trait Schedule: Send + Sync {
    /// First fire instant strictly after `after`, if any.
    fn next_fire(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>>;

    /// Human-readable form used in logs.
    fn describe(&self) -> String;
}

/// Handle returned after a poll has been posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedPoll {
    /// Transport-side poll id, matched against incoming answers.
    pub poll_ref: String,
    pub message_id: i64,
}

/// Chat transport used by the bot runtime.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name (e.g. "telegram").
    fn name(&self) -> &str;

    /// Post a two-option, non-anonymous poll to the group chat.
    async fn send_poll(&self, question: &str, options: [&str; 2]) -> Result<PostedPoll>;

    /// Send an HTML-formatted text message to a chat.
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()>;

    /// Snapshot of known group members, bots excluded.
    async fn members(&self) -> Result<Vec<Participant>>;
}
