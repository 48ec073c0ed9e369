//! Short-id to full-id mapping store
//!
//! Each mapping is one file, `<data-dir>/mappings/<short>.json`, so two
//! replicas adding different mappings never touch the same file.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::atomic::write_json_atomic;
use super::error::StoreError;
use super::issues::read_json;

pub const MAPPINGS_DIR: &str = "mappings";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdMapping {
    pub short_id: String,
    pub full_id: String,
}

impl IdMapping {
    pub fn new(short_id: impl Into<String>, full_id: impl Into<String>) -> Self {
        Self {
            short_id: short_id.into(),
            full_id: full_id.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MappingStore {
    dir: PathBuf,
}

impl MappingStore {
    /// Store rooted at `<data_dir>/mappings`
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join(MAPPINGS_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load every mapping, keyed by short id
    pub fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let mut map = BTreeMap::new();
        if !self.dir.exists() {
            return Ok(map);
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let mapping: IdMapping = read_json(&path)?;
            map.insert(mapping.short_id, mapping.full_id);
        }
        Ok(map)
    }

    pub fn save(&self, mapping: &IdMapping) -> Result<(), StoreError> {
        let short = &mapping.short_id;
        if short.is_empty() || short.starts_with('.') || short.contains(['/', '\\']) {
            return Err(StoreError::InvalidId(short.clone()));
        }
        let path = self.dir.join(format!("{short}.json"));
        write_json_atomic(&path, mapping).map_err(|e| StoreError::io(&path, e))
    }

    /// Mappings whose full id is in `ids`
    pub fn entries_for(&self, ids: &BTreeSet<String>) -> Result<Vec<IdMapping>, StoreError> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|(_, full)| ids.contains(full))
            .map(|(short, full)| IdMapping::new(short, full))
            .collect())
    }

    /// Delete every mapping file. Returns how many were removed.
    pub fn clear(&self) -> Result<usize, StoreError> {
        if !self.dir.exists() {
            return Ok(0);
        }
        let mut removed = 0;
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&self.dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Set-union `mappings` into this store. Existing short ids keep their
    /// current target; a disagreeing entry is skipped with a warning.
    ///
    /// Returns the number of mappings added.
    pub fn union_from(&self, mappings: &[IdMapping]) -> Result<usize, StoreError> {
        let existing = self.load()?;
        let mut added = 0;
        for mapping in mappings {
            match existing.get(&mapping.short_id) {
                Some(full) if *full == mapping.full_id => {}
                Some(full) => warn!(
                    short_id = %mapping.short_id,
                    existing = %full,
                    incoming = %mapping.full_id,
                    "short id already maps elsewhere, keeping existing mapping"
                ),
                None => {
                    self.save(mapping)?;
                    added += 1;
                }
            }
        }
        Ok(added)
    }
}
