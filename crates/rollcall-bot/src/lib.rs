//! # Rollcall Bot
//!
//! The single-writer event loop that ties the round coordinator to Telegram.
//!
//! ```text
//! TelegramPoller ─┐
//! webhook route  ─┼─► mpsc<BotEvent> ─► Bot::handle ─► Coordinator
//! trigger loop   ─┘                         ├── SnapshotStore (state.json)
//!                                           ├── RoundArchive  (rollcall.db)
//!                                           └── Transport     (sendPoll / sendMessage)
//! ```

pub mod commands;
pub mod events;
pub mod render;
pub mod runtime;

pub use commands::Command;
pub use events::BotEvent;
pub use runtime::Bot;
