//! Workspace save and import
//!
//! A workspace is a snapshot directory with the same layout as a data dir
//! (`issues/`, `mappings/`) plus an `attic/`. Saving and importing both
//! merge field by field against whatever the destination already holds,
//! using the destination copy as the ancestor. Repeating either operation
//! with unchanged input never records a conflict or bumps a version.

use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::SyncConfig;
use crate::merge::merge;
use crate::models::{ConflictRecord, Issue};
use crate::store::{IdMapping, IssueStore, MappingStore};
use crate::sync::get_updated_issues;

use super::attic::Attic;
use super::error::WorkspaceError;
use super::target::WorkspaceTarget;

pub const WORKSPACES_DIR: &str = "workspaces";

/// Attics of deleted workspaces, `<workspaces>/.retired/<name>-<timestamp>/`.
/// Workspace names cannot start with a dot, so this never collides.
pub const RETIRED_ATTICS_DIR: &str = ".retired";

/// Which source records a save copies
#[derive(Debug, Clone, Default)]
pub enum SaveFilter {
    #[default]
    All,
    /// Only records new relative to, or substantively different from, `remote`
    UpdatesOnly { remote: Vec<Issue> },
}

/// Result of merging one record set into another directory
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransferReport {
    /// Records created or changed in the destination
    pub written: usize,
    /// Records already identical in the destination
    pub unchanged: usize,
    /// Source records excluded by the filter
    pub filtered: usize,
    pub mappings_added: usize,
    /// Conflicts recorded in the destination workspace's attic
    pub conflicts: Vec<ConflictRecord>,
    /// Workspace deleted (or, for a plain directory, emptied) after a
    /// successful import
    pub cleared: bool,
}

#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    workspaces_dir: PathBuf,
}

impl WorkspaceManager {
    /// Workspaces under `<root>/<data-dir>/workspaces`
    pub fn new(root: &Path, config: &SyncConfig) -> Self {
        Self {
            workspaces_dir: config.root_data_dir(root).join(WORKSPACES_DIR),
        }
    }

    pub fn with_dir(workspaces_dir: impl Into<PathBuf>) -> Self {
        Self {
            workspaces_dir: workspaces_dir.into(),
        }
    }

    pub fn workspaces_dir(&self) -> &Path {
        &self.workspaces_dir
    }

    pub fn path(&self, target: &WorkspaceTarget) -> Result<PathBuf, WorkspaceError> {
        target.resolve(&self.workspaces_dir)
    }

    pub fn exists(&self, target: &WorkspaceTarget) -> Result<bool, WorkspaceError> {
        Ok(self.path(target)?.is_dir())
    }

    pub fn attic(&self, target: &WorkspaceTarget) -> Result<Attic, WorkspaceError> {
        Ok(Attic::new(&self.path(target)?))
    }

    /// Records held by a workspace; a missing workspace is `NotFound`
    pub fn records(&self, target: &WorkspaceTarget) -> Result<Vec<Issue>, WorkspaceError> {
        let dir = self.existing(target)?;
        Ok(IssueStore::new(&dir).list()?)
    }

    /// Names of the named workspaces, sorted
    pub fn list(&self) -> Result<Vec<String>, WorkspaceError> {
        if !self.workspaces_dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.workspaces_dir)
            .map_err(|e| WorkspaceError::io(&self.workspaces_dir, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| WorkspaceError::io(&self.workspaces_dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.path().is_dir() && !name.starts_with('.') {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Copy the records of `source_dir` into the workspace.
    ///
    /// A record the workspace already holds is merged with the held copy
    /// as the ancestor. Mapping entries are copied only for ids written by
    /// this save.
    pub fn save(
        &self,
        source_dir: &Path,
        target: &WorkspaceTarget,
        filter: &SaveFilter,
    ) -> Result<TransferReport, WorkspaceError> {
        let dest = self.path(target)?;
        let source = IssueStore::new(source_dir).list()?;
        let total = source.len();

        let selected = match filter {
            SaveFilter::All => source,
            SaveFilter::UpdatesOnly { remote } => get_updated_issues(&source, remote),
        };
        let mut report = TransferReport {
            filtered: total - selected.len(),
            ..TransferReport::default()
        };

        let written = merge_into(&selected, &dest, &mut report)?;
        let entries = MappingStore::new(source_dir).entries_for(&written)?;
        report.mappings_added = MappingStore::new(&dest).union_from(&entries)?;
        Attic::new(&dest).append_all(&report.conflicts)?;

        info!(
            workspace = %target,
            written = report.written,
            unchanged = report.unchanged,
            filtered = report.filtered,
            "workspace saved"
        );
        Ok(report)
    }

    /// Merge the workspace's records into `dest_dir`.
    ///
    /// The destination's current record is the ancestor for each id.
    /// Mappings are set-unioned. The workspace is emptied afterwards when
    /// `clear_on_success` is set; importing the outbox always empties it.
    pub fn import(
        &self,
        dest_dir: &Path,
        target: &WorkspaceTarget,
        clear_on_success: bool,
    ) -> Result<TransferReport, WorkspaceError> {
        let source_dir = self.existing(target)?;
        let records = IssueStore::new(&source_dir).list()?;

        let mut report = TransferReport::default();
        merge_into(&records, dest_dir, &mut report)?;

        let mappings: Vec<_> = MappingStore::new(&source_dir)
            .load()?
            .into_iter()
            .map(|(short, full)| IdMapping::new(short, full))
            .collect();
        report.mappings_added = MappingStore::new(dest_dir).union_from(&mappings)?;

        if clear_on_success || target.is_outbox() {
            match target {
                WorkspaceTarget::Dir(_) => {
                    self.clear(target)?;
                }
                _ => self.remove(target)?,
            }
            report.cleared = true;
        }

        info!(
            workspace = %target,
            written = report.written,
            unchanged = report.unchanged,
            cleared = report.cleared,
            "workspace imported"
        );
        Ok(report)
    }

    /// Delete a workspace directory. A non-empty attic is moved under
    /// [`RETIRED_ATTICS_DIR`] first, so no conflict record is lost.
    pub fn remove(&self, target: &WorkspaceTarget) -> Result<(), WorkspaceError> {
        let dir = self.path(target)?;
        if !dir.is_dir() {
            return Ok(());
        }

        let attic = Attic::new(&dir);
        if !attic.is_empty()? {
            let retired = self.retire_attic(target, attic.dir())?;
            info!(workspace = %target, attic = %retired.display(), "attic retired");
        }

        fs::remove_dir_all(&dir).map_err(|e| WorkspaceError::io(&dir, e))?;
        debug!(workspace = %target, "workspace removed");
        Ok(())
    }

    fn retire_attic(
        &self,
        target: &WorkspaceTarget,
        attic_dir: &Path,
    ) -> Result<PathBuf, WorkspaceError> {
        let retired_root = self.workspaces_dir.join(RETIRED_ATTICS_DIR);
        fs::create_dir_all(&retired_root).map_err(|e| WorkspaceError::io(&retired_root, e))?;

        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.6fZ");
        let mut dest = retired_root.join(format!("{target}-{stamp}"));
        let mut n = 1;
        while dest.exists() {
            dest = retired_root.join(format!("{target}-{stamp}-{n}"));
            n += 1;
        }
        fs::rename(attic_dir, &dest).map_err(|e| WorkspaceError::io(attic_dir, e))?;
        Ok(dest)
    }

    /// Remove a workspace's records and mappings. The attic is kept.
    pub fn clear(&self, target: &WorkspaceTarget) -> Result<usize, WorkspaceError> {
        let dir = self.path(target)?;
        let issues = IssueStore::new(&dir);
        let mut removed = 0;
        for id in issues.ids()? {
            if issues.remove(&id)? {
                removed += 1;
            }
        }
        MappingStore::new(&dir).clear()?;
        debug!(workspace = %target, removed, "workspace cleared");
        Ok(removed)
    }

    fn existing(&self, target: &WorkspaceTarget) -> Result<PathBuf, WorkspaceError> {
        let dir = self.path(target)?;
        if !dir.is_dir() {
            return Err(WorkspaceError::NotFound(target.to_string()));
        }
        Ok(dir)
    }
}

/// Merge `records` into the issue store at `dest_dir`, field by field with
/// the stored copy as ancestor. Returns the ids written.
fn merge_into(
    records: &[Issue],
    dest_dir: &Path,
    report: &mut TransferReport,
) -> Result<BTreeSet<String>, WorkspaceError> {
    let store = IssueStore::new(dest_dir);
    let mut written = BTreeSet::new();

    for incoming in records {
        let merged = match store.get(&incoming.id)? {
            None => incoming.clone(),
            Some(current) => {
                let outcome = merge(Some(&current), incoming, &current);
                report.conflicts.extend(outcome.conflicts);
                if outcome.merged == current {
                    report.unchanged += 1;
                    continue;
                }
                outcome.merged
            }
        };
        store.write(&merged)?;
        written.insert(merged.id.clone());
        report.written += 1;
    }
    Ok(written)
}
