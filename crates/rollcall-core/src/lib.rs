//! # Rollcall Core
//! Shared types, traits, configuration and errors.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::RollcallConfig;
pub use error::{Result, RollcallError};
pub use types::{IncomingEvent, Participant, ParticipantId, PollId, PollOption};
