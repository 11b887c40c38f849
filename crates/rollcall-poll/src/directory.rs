//! Everyone the bot has seen answer, in first-seen order.

use std::collections::HashSet;

use rollcall_core::{Participant, ParticipantId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipantDirectory {
    participants: Vec<Participant>,
}

impl ParticipantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a participant the first time they are seen. Returns true if new.
    pub fn observe(&mut self, participant: &Participant) -> bool {
        if self.get(participant.id).is_some() {
            return false;
        }
        tracing::debug!("New participant {} ({})", participant.id, participant.display_name());
        self.participants.push(participant.clone());
        true
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn all(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Roster snapshot: `members` first, then tracked participants not among them.
    pub fn roster_with(&self, members: &[Participant]) -> Vec<Participant> {
        let mut seen = HashSet::new();
        members
            .iter()
            .chain(self.participants.iter())
            .filter(|p| seen.insert(p.id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_once() {
        let mut dir = ParticipantDirectory::new();
        assert!(dir.observe(&Participant::new(1).with_name("Ana")));
        assert!(!dir.observe(&Participant::new(1).with_name("Someone else")));
        assert_eq!(dir.len(), 1);
        assert_eq!(dir.get(ParticipantId(1)).unwrap().display_name(), "Ana");
    }

    #[test]
    fn test_roster_merges_members_first() {
        let mut dir = ParticipantDirectory::new();
        dir.observe(&Participant::new(3));
        dir.observe(&Participant::new(1));
        let members = vec![Participant::new(1).with_handle("admin"), Participant::new(2)];
        let roster = dir.roster_with(&members);
        let ids: Vec<i64> = roster.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(roster[0].handle.as_deref(), Some("admin"));
    }

    #[test]
    fn test_roster_without_members() {
        let mut dir = ParticipantDirectory::new();
        dir.observe(&Participant::new(5));
        assert_eq!(dir.roster_with(&[]).len(), 1);
    }
}
