//! Answer ingestion for an open round.
//!
//! The coordinator checks the round is open before calling in here.

use rollcall_core::{ParticipantId, PollOption};

use crate::state::PollState;

/// Record an answer. A repeated answer replaces the earlier one.
/// Returns the option it replaced, if any.
pub fn submit(poll: &mut PollState, participant: ParticipantId, option: PollOption) -> Option<PollOption> {
    debug_assert!(poll.is_open(), "submit on a closed poll");
    let previous = poll.answers_mut().insert(participant, option);
    match previous {
        Some(prev) if prev == option => {
            tracing::debug!("Poll #{}: {participant} repeated '{option}'", poll.id);
        }
        Some(prev) => {
            tracing::info!("Poll #{}: {participant} changed '{prev}' → '{option}'", poll.id);
        }
        None => {
            tracing::info!("Poll #{}: {participant} answered '{option}'", poll.id);
        }
    }
    previous
}

/// Drop a participant's answer (vote retracted). Returns the removed option.
pub fn withdraw(poll: &mut PollState, participant: ParticipantId) -> Option<PollOption> {
    debug_assert!(poll.is_open(), "withdraw on a closed poll");
    let removed = poll.answers_mut().remove(&participant);
    if removed.is_some() {
        tracing::info!("Poll #{}: {participant} retracted their answer", poll.id);
    }
    removed
}
