//! Rollcall error types.

use crate::types::PollId;

/// Unified error type for every Rollcall crate.
#[derive(Debug, thiserror::Error)]
pub enum RollcallError {
    #[error("Poll #{0} is already open")]
    AlreadyOpen(PollId),

    #[error("No poll is open to accept answers")]
    PollNotOpen,

    #[error("No open poll to close")]
    NoOpenPoll,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Data directory {0} is in use by another rollcall process")]
    Busy(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Schedule error: {0}")]
    Schedule(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl RollcallError {
    /// Lifecycle errors are expected during normal operation and never fatal.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            RollcallError::AlreadyOpen(_) | RollcallError::PollNotOpen | RollcallError::NoOpenPoll
        )
    }
}

pub type Result<T> = std::result::Result<T, RollcallError>;
