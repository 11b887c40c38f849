//! # Rollcall Poll
//!
//! The attendance round state machine.
//!
//! ```text
//! Coordinator (Idle → Open → Closed → Idle)
//!   ├── open_poll()          → PollState { status: Open }
//!   ├── record_answer()      → registry::submit (last write wins)
//!   └── close_and_report()   → reminder::compute(closed poll, roster)
//!                                └── ReminderPayload { recipients, summary }
//! ```
//!
//! Durability lives beside it: `SnapshotStore` keeps the open round across
//! restarts, `RoundArchive` records every closed round in SQLite, and
//! `DataDirLock` keeps a second process from writing the same directory.

pub mod archive;
pub mod directory;
pub mod lifecycle;
pub mod lock;
pub mod registry;
pub mod reminder;
pub mod state;
pub mod store;

pub use archive::{ArchivedRound, RoundArchive, RoundOutcome};
pub use directory::ParticipantDirectory;
pub use lifecycle::{ClosedRound, Coordinator, CoordinatorEvent, Phase};
pub use lock::DataDirLock;
pub use reminder::{ReminderPayload, ReminderSummary};
pub use state::{PollState, PollStatus};
pub use store::{Snapshot, SnapshotStore};
