//! Best-effort serialization of sync runs
//!
//! Uses an `fs2` advisory lock on `<data-dir>/sync.lock`. Concurrent runs
//! are rare and merge semantics cover the race anyway; the lock only keeps
//! two local processes from sharing the worktree at once.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::SyncError;
use crate::store::StoreError;

pub const LOCK_FILE: &str = "sync.lock";

/// Held for the duration of a sync; released on drop
#[derive(Debug)]
pub struct SyncLock {
    file: File,
    path: PathBuf,
}

impl SyncLock {
    /// Take the lock without blocking. A held lock is [`SyncError::Locked`].
    pub fn acquire(data_dir: &Path) -> Result<Self, SyncError> {
        fs::create_dir_all(data_dir).map_err(|e| StoreError::io(data_dir, e))?;
        let path = data_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;

        if file.try_lock_exclusive().is_err() {
            return Err(SyncError::Locked(path.display().to_string()));
        }
        debug!(path = %path.display(), "sync lock acquired");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SyncLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_acquire_fails_until_drop() {
        let temp = TempDir::new().unwrap();
        let lock = SyncLock::acquire(temp.path()).unwrap();
        assert!(lock.path().ends_with(LOCK_FILE));

        let err = SyncLock::acquire(temp.path()).unwrap_err();
        assert!(matches!(err, SyncError::Locked(_)));

        drop(lock);
        assert!(SyncLock::acquire(temp.path()).is_ok());
    }
}
