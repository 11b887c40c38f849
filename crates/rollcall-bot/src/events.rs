//! Everything the event loop consumes, from any source.

use rollcall_core::IncomingEvent;
use rollcall_scheduler::Fired;

#[derive(Debug, Clone, PartialEq)]
pub enum BotEvent {
    /// From Telegram (polling or webhook).
    Incoming(IncomingEvent),
    /// From the trigger loop.
    Trigger(Fired),
}

impl From<IncomingEvent> for BotEvent {
    fn from(event: IncomingEvent) -> Self {
        BotEvent::Incoming(event)
    }
}

impl From<Fired> for BotEvent {
    fn from(fired: Fired) -> Self {
        BotEvent::Trigger(fired)
    }
}
