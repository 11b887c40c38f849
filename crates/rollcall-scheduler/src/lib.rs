//! # Rollcall Scheduler
//!
//! Weekly triggers for opening the poll and sending the reminder.
//!
//! ```text
//! trigger loop (tokio interval)
//!   ├── open_poll#0  "0 18 * * 6"   (Saturday 18:00 local)
//!   ├── open_poll#1  "59 23 * * 6"  (safety net)
//!   └── reminder#0   "0 8 * * 0"    (Sunday 08:00 local)
//!         └── on fire → FireLedger (ledger.json) → event channel
//! ```

pub mod clock;
pub mod cron;
pub mod engine;
pub mod ledger;

pub use clock::{ManualClock, SystemClock};
pub use cron::{CompositeSchedule, CronSchedule, local_date};
pub use engine::{Fired, Trigger, TriggerEngine, TriggerKind, spawn_trigger_loop};
pub use ledger::FireLedger;
