//! One-file-per-record issue storage
//!
//! Records live at `<data-dir>/issues/<id>.json`. Listing scans the
//! directory lazily and parses large corpora in parallel, since each
//! record is independent of every other.

use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use crate::models::Issue;

use super::atomic::write_json_atomic;
use super::error::StoreError;

/// Subdirectory of a data dir holding issue records
pub const ISSUES_DIR: &str = "issues";

const RECORD_EXTENSION: &str = "json";

/// Below this many files the listing is parsed on the calling thread
const PARALLEL_THRESHOLD: usize = 64;

/// Store for issue records under one data directory
#[derive(Debug, Clone)]
pub struct IssueStore {
    dir: PathBuf,
}

impl IssueStore {
    /// Store rooted at `<data_dir>/issues`
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join(ISSUES_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{id}.{RECORD_EXTENSION}")))
    }

    pub fn exists(&self, id: &str) -> bool {
        self.path_for(id).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Read one record. Fails with `NotFound` when no file exists for `id`.
    pub fn read(&self, id: &str) -> Result<Issue, StoreError> {
        let path = self.path_for(id)?;
        if !path.is_file() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        read_record(&path)
    }

    /// Read one record, returning `None` instead of `NotFound`
    pub fn get(&self, id: &str) -> Result<Option<Issue>, StoreError> {
        match self.read(id) {
            Ok(issue) => Ok(Some(issue)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Atomically write a record, replacing any previous version
    pub fn write(&self, issue: &Issue) -> Result<PathBuf, StoreError> {
        let path = self.path_for(&issue.id)?;
        write_json_atomic(&path, issue).map_err(|e| StoreError::io(&path, e))?;
        Ok(path)
    }

    pub fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
        Ok(true)
    }

    /// Paths of every record file, in directory order. A missing directory is empty.
    pub fn record_paths(&self) -> Result<Vec<PathBuf>, StoreError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, e))?;
            let path = entry.path();
            if path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION)
            {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    /// Ids of every stored record, derived from file names without parsing
    pub fn ids(&self) -> Result<Vec<String>, StoreError> {
        let mut ids: Vec<String> = self
            .record_paths()?
            .iter()
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Every stored record, sorted by id
    pub fn list(&self) -> Result<Vec<Issue>, StoreError> {
        let paths = self.record_paths()?;
        let mut issues = if paths.len() < PARALLEL_THRESHOLD {
            read_all(&paths)?
        } else {
            read_all_parallel(&paths)?
        };
        issues.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(issues)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.record_paths()?.len())
    }
}

fn validate_id(id: &str) -> Result<(), StoreError> {
    let bad = id.is_empty()
        || id.starts_with('.')
        || id.contains(['/', '\\'])
        || id.chars().any(char::is_control);
    if bad {
        return Err(StoreError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Read and deserialize one JSON file
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn read_record(path: &Path) -> Result<Issue, StoreError> {
    read_json(path)
}

fn read_all(paths: &[PathBuf]) -> Result<Vec<Issue>, StoreError> {
    paths.iter().map(|p| read_record(p)).collect()
}

fn read_all_parallel(paths: &[PathBuf]) -> Result<Vec<Issue>, StoreError> {
    let workers = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(paths.len());
    let chunk_size = paths.len().div_ceil(workers.max(1));

    thread::scope(|scope| -> Result<Vec<Issue>, StoreError> {
        let handles: Vec<_> = paths
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || read_all(chunk)))
            .collect();

        let mut issues = Vec::with_capacity(paths.len());
        for handle in handles {
            match handle.join() {
                Ok(result) => issues.extend(result?),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        Ok(issues)
    })
}
