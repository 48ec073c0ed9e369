//! Legacy data migration
//!
//! Records written straight into `<root>/<data-dir>` (outside the sync
//! worktree) are never synced. Migration moves them into the worktree's
//! data directory, merging with whatever is already there.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::merge::merge;
use crate::models::Issue;
use crate::store::{IdMapping, IssueStore, MappingStore, ISSUES_DIR, MAPPINGS_DIR};

use super::error::WorktreeError;
use super::manager::WorktreeManager;

#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    /// Records written into the worktree
    pub issues_migrated: usize,
    /// Mappings added to the worktree
    pub mappings_migrated: usize,
    /// Backup of the legacy files, taken before anything changed
    pub backup_path: Option<PathBuf>,
    /// Legacy files deleted after copying
    pub sources_removed: usize,
}

impl MigrationReport {
    pub fn migrated(&self) -> bool {
        self.issues_migrated > 0 || self.mappings_migrated > 0 || self.sources_removed > 0
    }
}

impl WorktreeManager {
    /// True when record or mapping files exist in the legacy location
    pub fn has_misplaced_data(&self) -> Result<bool, WorktreeError> {
        let legacy = self.root_data_dir();
        Ok(IssueStore::new(&legacy).count()? > 0 || !MappingStore::new(&legacy).load()?.is_empty())
    }

    /// Copy legacy records and mappings into the worktree.
    ///
    /// A record already present in the worktree is merged field by field,
    /// with the worktree copy as the ancestor, so the legacy edits win and
    /// nothing is flagged as a conflict. Running this twice is a no-op:
    /// the second run writes nothing and reports 0.
    ///
    /// The legacy files are backed up before the first write, and only
    /// deleted when `remove_source` is set.
    pub fn migrate_data_to_worktree(
        &self,
        remove_source: bool,
    ) -> Result<MigrationReport, WorktreeError> {
        let legacy_dir = self.root_data_dir();
        let legacy_issues = IssueStore::new(&legacy_dir);
        let legacy_mappings = MappingStore::new(&legacy_dir);
        let dest_issues = IssueStore::new(&self.data_dir());
        let dest_mappings = MappingStore::new(&self.data_dir());

        let records = legacy_issues.list()?;
        let mappings = legacy_mappings.load()?;
        if records.is_empty() && mappings.is_empty() {
            return Ok(MigrationReport::default());
        }

        let writes = plan_writes(&records, &dest_issues)?;
        let existing = dest_mappings.load()?;
        let new_mappings: Vec<IdMapping> = mappings
            .iter()
            .filter(|(short, _)| !existing.contains_key(*short))
            .map(|(short, full)| IdMapping::new(short.clone(), full.clone()))
            .collect();

        if writes.is_empty() && new_mappings.is_empty() && !remove_source {
            debug!("legacy data already present in worktree");
            return Ok(MigrationReport::default());
        }

        let mut report = MigrationReport {
            backup_path: Some(self.backup_entries(
                "migration",
                &legacy_dir,
                &[ISSUES_DIR, MAPPINGS_DIR],
            )?),
            ..MigrationReport::default()
        };

        for issue in &writes {
            dest_issues.write(issue)?;
        }
        report.issues_migrated = writes.len();
        report.mappings_migrated = dest_mappings.union_from(&new_mappings)?;

        if remove_source {
            for issue in &records {
                if legacy_issues.remove(&issue.id)? {
                    report.sources_removed += 1;
                }
            }
            report.sources_removed += legacy_mappings.clear()?;
        }

        info!(
            issues = report.issues_migrated,
            mappings = report.mappings_migrated,
            removed = report.sources_removed,
            "migrated legacy data into sync worktree"
        );
        Ok(report)
    }
}

/// Records that would change the worktree copy
fn plan_writes(records: &[Issue], dest: &IssueStore) -> Result<Vec<Issue>, WorktreeError> {
    let mut writes = BTreeMap::new();
    for record in records {
        match dest.get(&record.id)? {
            None => {
                writes.insert(record.id.clone(), record.clone());
            }
            Some(current) => {
                let outcome = merge(Some(&current), record, &current);
                if outcome.merged != current {
                    writes.insert(record.id.clone(), outcome.merged);
                }
            }
        }
    }
    Ok(writes.into_values().collect())
}
