//! The attic: an append-only log of values lost in merges
//!
//! One file per conflict record, named `<UTC timestamp>-<uuid>.json`.
//! Files are created once and never rewritten, so the log survives
//! concurrent appends and crashes without a lock.

use chrono::Utc;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use crate::models::ConflictRecord;
use crate::store::{read_json, write_new_atomic, StoreError};

pub const ATTIC_DIR: &str = "attic";

#[derive(Debug, Clone)]
pub struct Attic {
    dir: PathBuf,
}

impl Attic {
    /// Attic of the workspace at `workspace_dir`
    pub fn new(workspace_dir: &Path) -> Self {
        Self {
            dir: workspace_dir.join(ATTIC_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `record` as a new entry and return its path
    pub fn append(&self, record: &ConflictRecord) -> Result<PathBuf, StoreError> {
        let mut content = serde_json::to_vec_pretty(record)
            .map_err(|e| StoreError::io(&self.dir, io::Error::other(e)))?;
        content.push(b'\n');

        loop {
            let path = self.dir.join(entry_name());
            match write_new_atomic(&path, &content) {
                Ok(()) => {
                    debug!(
                        issue = %record.issue_id,
                        field = %record.field,
                        path = %path.display(),
                        "conflict recorded"
                    );
                    return Ok(path);
                }
                // Name collision: draw a new uuid.
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(StoreError::io(&path, e)),
            }
        }
    }

    pub fn append_all(&self, records: &[ConflictRecord]) -> Result<usize, StoreError> {
        for record in records {
            self.append(record)?;
        }
        Ok(records.len())
    }

    /// Every entry, oldest first
    pub fn list(&self) -> Result<Vec<ConflictRecord>, StoreError> {
        self.entry_paths()?
            .iter()
            .map(|path| read_json(path))
            .collect()
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entry_paths()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn entry_paths(&self) -> Result<Vec<PathBuf>, StoreError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))? {
            let path = entry.map_err(|e| StoreError::io(&self.dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        // Timestamp prefix makes name order chronological.
        paths.sort();
        Ok(paths)
    }
}

fn entry_name() -> String {
    format!(
        "{}-{}.json",
        Utc::now().format("%Y%m%dT%H%M%S%.6fZ"),
        Uuid::new_v4()
    )
}
