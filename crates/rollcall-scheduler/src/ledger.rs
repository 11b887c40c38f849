//! File-based fire ledger: trigger name → last scheduled instant it fired for.
//! Only written when a trigger fires, not on every tick.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rollcall_core::{Result, RollcallError};

pub struct FireLedger {
    path: Option<PathBuf>,
    entries: BTreeMap<String, DateTime<Utc>>,
}

impl FireLedger {
    /// Open (or start) the ledger in `dir/ledger.json`.
    pub fn open(dir: &Path) -> Self {
        std::fs::create_dir_all(dir).ok();
        let path = dir.join("ledger.json");
        let entries = Self::read(&path);
        Self {
            path: Some(path),
            entries,
        }
    }

    /// A ledger that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: BTreeMap::new(),
        }
    }

    fn read(path: &Path) -> BTreeMap<String, DateTime<Utc>> {
        if !path.exists() {
            return BTreeMap::new();
        }
        match std::fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("⚠️ Failed to parse {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(e) => {
                tracing::warn!("⚠️ Failed to read {}: {e}", path.display());
                BTreeMap::new()
            }
        }
    }

    pub fn last_fired(&self, name: &str) -> Option<DateTime<Utc>> {
        self.entries.get(name).copied()
    }

    /// Record a fire and persist.
    pub fn record(&mut self, name: &str, scheduled_for: DateTime<Utc>) -> Result<()> {
        self.entries.insert(name.to_string(), scheduled_for);
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, json)
            .map_err(|e| RollcallError::Store(format!("Write {}: {e}", path.display())))?;
        tracing::debug!("💾 Ledger: '{name}' fired for {scheduled_for}");
        Ok(())
    }
}
