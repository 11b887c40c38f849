//! Exclusive ownership of the data directory.
//!
//! Every process that mutates `state.json` holds `rollcall.lock` for its
//! lifetime. The OS releases the lock when the process exits, so a crash
//! never leaves the directory stuck.

use std::fs::{File, OpenOptions, TryLockError};
use std::io::Write;
use std::path::{Path, PathBuf};

use rollcall_core::{Result, RollcallError};

pub struct DataDirLock {
    _file: File,
    path: PathBuf,
}

impl DataDirLock {
    /// Take the lock, failing with `Busy` if another holder exists.
    pub fn acquire(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join("rollcall.lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                return Err(RollcallError::Busy(dir.display().to_string()));
            }
            Err(TryLockError::Error(e)) => return Err(e.into()),
        }

        file.set_len(0)?;
        let mut handle = &file;
        writeln!(handle, "{}", std::process::id())?;
        tracing::debug!("🔒 Locked {}", path.display());
        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
