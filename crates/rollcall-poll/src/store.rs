//! File-based snapshot of the live round.
//! Saved as `state.json`: human-readable, rewritten after every change.

use std::path::{Path, PathBuf};

use rollcall_core::{Result, RollcallError};
use serde::{Deserialize, Serialize};

use crate::directory::ParticipantDirectory;
use crate::state::PollState;

/// Everything needed to resume after a restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub last_id: u64,
    #[serde(default)]
    pub poll: Option<PollState>,
    #[serde(default)]
    pub directory: ParticipantDirectory,
}

/// JSON snapshot store.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Create a store in the given directory.
    pub fn new(dir: &Path) -> Self {
        std::fs::create_dir_all(dir).ok();
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file(&self) -> PathBuf {
        self.dir.join("state.json")
    }

    /// Write the snapshot via a temp file and rename.
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let file = self.file();
        let tmp = self.dir.join("state.json.tmp");
        let json = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&tmp, json)
            .map_err(|e| RollcallError::Store(format!("Write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &file)
            .map_err(|e| RollcallError::Store(format!("Replace {}: {e}", file.display())))?;
        tracing::debug!(
            "💾 Saved snapshot (poll: {:?}, {} participant(s))",
            snapshot.poll.as_ref().map(|p| p.id),
            snapshot.directory.len()
        );
        Ok(())
    }

    /// Load the snapshot. Missing or unreadable files yield an empty one.
    pub fn load(&self) -> Snapshot {
        let file = self.file();
        if !file.exists() {
            return Snapshot::default();
        }
        match std::fs::read_to_string(&file) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("⚠️ Failed to parse {}: {e}", file.display());
                Snapshot::default()
            }),
            Err(e) => {
                tracing::warn!("⚠️ Failed to read {}: {e}", file.display());
                Snapshot::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;
    use chrono::Utc;
    use rollcall_core::{Participant, ParticipantId, PollId, PollOption};

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        assert_eq!(store.load(), Snapshot::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        let mut poll = PollState::open(PollId(4), Utc::now(), None);
        registry::submit(&mut poll, ParticipantId(10), PollOption::Affirmative);
        registry::submit(&mut poll, ParticipantId(11), PollOption::Negative);
        let mut directory = ParticipantDirectory::new();
        directory.observe(&Participant::new(10).with_handle("ten"));

        let snapshot = Snapshot { last_id: 4, poll: Some(poll), directory };
        store.save(&snapshot).unwrap();

        let loaded = store.load();
        assert_eq!(loaded, snapshot);
        let poll = loaded.poll.unwrap();
        assert!(poll.is_open());
        assert_eq!(poll.answer_of(ParticipantId(11)), Some(PollOption::Negative));
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        std::fs::write(store.file(), "{not json").unwrap();
        assert_eq!(store.load(), Snapshot::default());
    }
}
