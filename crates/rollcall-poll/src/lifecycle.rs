//! Round lifecycle coordinator.
//!
//! Owns the only `PollState`. Every mutation goes through `&mut self`, so the
//! owner (the bot's event loop) serializes opens, answers and reports.

use std::sync::Arc;

use rollcall_core::traits::{Clock, Schedule};
use rollcall_core::{Participant, ParticipantId, PollId, PollOption, Result, RollcallError};

use crate::registry;
use crate::reminder::{self, ReminderPayload};
use crate::state::PollState;

/// Observable coordinator phase. `Closed` only exists inside `close_and_report`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Open,
}

/// Side effects for the transport to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent {
    /// A round was opened and should be posted to the chat.
    Announce(PollId),
}

/// A consumed round together with its computed reminder.
#[derive(Debug, Clone)]
pub struct ClosedRound {
    pub poll: PollState,
    pub payload: ReminderPayload,
}

pub struct Coordinator {
    clock: Arc<dyn Clock>,
    /// Used to stamp `expected_close_at` on new rounds.
    report_schedule: Option<Arc<dyn Schedule>>,
    current: Option<PollState>,
    last_id: u64,
    events: Vec<CoordinatorEvent>,
}

impl Coordinator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            report_schedule: None,
            current: None,
            last_id: 0,
            events: Vec::new(),
        }
    }

    /// Resume from a persisted snapshot. Only an open round is restored.
    pub fn restore(clock: Arc<dyn Clock>, last_id: u64, current: Option<PollState>) -> Self {
        let current = match current {
            Some(poll) if poll.is_open() => {
                tracing::info!(
                    "Restored open poll #{} with {} answer(s)",
                    poll.id,
                    poll.answer_count()
                );
                Some(poll)
            }
            Some(poll) => {
                tracing::warn!("Discarding closed poll #{} found in snapshot", poll.id);
                None
            }
            None => None,
        };
        let last_id = current.as_ref().map_or(last_id, |p| last_id.max(p.id.0));
        Self {
            clock,
            report_schedule: None,
            current,
            last_id,
            events: Vec::new(),
        }
    }

    pub fn with_report_schedule(mut self, schedule: Arc<dyn Schedule>) -> Self {
        self.report_schedule = Some(schedule);
        self
    }

    pub fn phase(&self) -> Phase {
        match &self.current {
            Some(_) => Phase::Open,
            None => Phase::Idle,
        }
    }

    /// The open round, if any.
    pub fn current(&self) -> Option<&PollState> {
        self.current.as_ref()
    }

    /// Highest id handed out so far.
    pub fn last_id(&self) -> u64 {
        self.last_id
    }

    /// Open a new round and queue an `Announce` event.
    pub fn open_poll(&mut self) -> Result<PollId> {
        if let Some(poll) = &self.current {
            return Err(RollcallError::AlreadyOpen(poll.id));
        }
        let now = self.clock.now();
        let expected_close_at = self
            .report_schedule
            .as_ref()
            .and_then(|s| s.next_fire(now));
        self.last_id += 1;
        let id = PollId(self.last_id);
        self.current = Some(PollState::open(id, now, expected_close_at));
        self.events.push(CoordinatorEvent::Announce(id));
        tracing::info!("📊 Poll #{id} opened (report due {expected_close_at:?})");
        Ok(id)
    }

    /// Record an answer in the open round. Returns the replaced option.
    pub fn record_answer(&mut self, participant: ParticipantId, option: PollOption) -> Result<Option<PollOption>> {
        let poll = self.current.as_mut().ok_or(RollcallError::PollNotOpen)?;
        Ok(registry::submit(poll, participant, option))
    }

    /// Remove an answer from the open round (vote retracted).
    pub fn retract_answer(&mut self, participant: ParticipantId) -> Result<Option<PollOption>> {
        let poll = self.current.as_mut().ok_or(RollcallError::PollNotOpen)?;
        Ok(registry::withdraw(poll, participant))
    }

    /// Remember the transport's id for the open round's posted poll.
    pub fn attach_external_ref(&mut self, poll_ref: &str) -> Result<()> {
        let poll = self.current.as_mut().ok_or(RollcallError::PollNotOpen)?;
        poll.external_ref = Some(poll_ref.to_string());
        Ok(())
    }

    /// Whether `poll_ref` names the open round's posted poll.
    pub fn matches_external_ref(&self, poll_ref: &str) -> bool {
        self.current
            .as_ref()
            .and_then(|p| p.external_ref.as_deref())
            .is_some_and(|r| r == poll_ref)
    }

    /// Close the open round and compute its reminder. The round is consumed.
    pub fn close_and_report(&mut self, roster: &[Participant]) -> Result<ClosedRound> {
        let mut poll = self.current.take().ok_or(RollcallError::NoOpenPoll)?;
        poll.close(self.clock.now());
        let payload = reminder::compute(&poll, roster);
        tracing::info!(
            "📋 Poll #{} closed: {} confirmed, {} unanswered, {} declined",
            poll.id,
            payload.summary.confirmed_count,
            payload.summary.unanswered_count,
            payload.summary.declined_count
        );
        Ok(ClosedRound { poll, payload })
    }

    /// Take the queued side effects.
    pub fn drain_events(&mut self) -> Vec<CoordinatorEvent> {
        std::mem::take(&mut self.events)
    }
}
