//! One end-to-end sync run
//!
//! Sequence:
//! 1. Take the sync lock (skipped for dry runs)
//! 2. Make sure the worktree is healthy and attached to the sync branch
//! 3. Move legacy data into the worktree
//! 4. Drain the outbox left by an interrupted run
//! 5. Journal local changes into the outbox
//! 6. Fetch, merge, and push with bounded retry
//! 7. Record conflicts in the `sync` workspace attic, then empty the outbox
//!
//! A dry run fetches and merges, and reports what would be pushed. It
//! never repairs, migrates, or writes records.

use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::git::records::read_records_at;
use crate::git::worktree::{MigrationReport, WorktreeError, WorktreeManager};
use crate::models::WorktreeHealth;
use crate::store::IssueStore;
use crate::workspace::{SaveFilter, WorkspaceManager, WorkspaceTarget};

use super::error::SyncError;
use super::filter::get_updated_issues;
use super::lock::SyncLock;
use super::retry::{plan_sync, sync_with_retry, SyncOutcome};
use super::transport::GitTransport;

/// Workspace whose attic collects conflicts found while syncing
pub const SYNC_WORKSPACE: &str = "sync";

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub dry_run: bool,
    pub health: WorktreeHealth,
    pub migration: Option<MigrationReport>,
    /// Records recovered from the outbox of an earlier run
    pub outbox_drained: usize,
    /// Local records changed since the last sync
    pub pending: usize,
    pub outcome: SyncOutcome,
    /// Conflicts written to the attic
    pub conflicts_recorded: usize,
}

pub struct SyncSession {
    config: SyncConfig,
    worktree: WorktreeManager,
    workspaces: WorkspaceManager,
}

impl SyncSession {
    pub fn new(root: &Path, config: SyncConfig) -> Result<Self, SyncError> {
        let worktree = WorktreeManager::new(root, &config)?;
        let workspaces = WorkspaceManager::new(worktree.root(), &config);
        Ok(Self {
            config,
            worktree,
            workspaces,
        })
    }

    pub fn worktree(&self) -> &WorktreeManager {
        &self.worktree
    }

    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    pub fn run(&self, dry_run: bool) -> Result<SyncReport, SyncError> {
        let _lock = if dry_run {
            None
        } else {
            Some(SyncLock::acquire(&self.worktree.root_data_dir())?)
        };

        let health = self.worktree.ensure_healthy(dry_run)?;
        self.ensure_consistent(dry_run)?;

        let migration = if dry_run || !self.worktree.has_misplaced_data()? {
            None
        } else {
            Some(self.worktree.migrate_data_to_worktree(true)?)
        };

        let outbox_drained = if !dry_run && self.workspaces.exists(&WorkspaceTarget::Outbox)? {
            self.workspaces
                .import(&self.worktree.data_dir(), &WorkspaceTarget::Outbox, true)?
                .written
        } else {
            0
        };

        let data_dir = self.worktree.data_dir();
        let local = IssueStore::new(&data_dir).list()?;
        let last_synced = read_records_at(
            self.worktree.repo_git(),
            &format!("refs/heads/{}", self.worktree.branch()),
            self.worktree.data_dir_name(),
        )?;

        let pending = if dry_run {
            get_updated_issues(&local, &last_synced).len()
        } else {
            let filter = SaveFilter::UpdatesOnly {
                remote: last_synced,
            };
            let saved = self
                .workspaces
                .save(&data_dir, &WorkspaceTarget::Outbox, &filter)?;
            saved.written + saved.unchanged
        };

        let mut transport = GitTransport::new(&self.worktree);
        let outcome = if dry_run {
            plan_sync(&mut transport, &local)?
        } else {
            sync_with_retry(&mut transport, &local, self.config.max_push_retries)?
        };

        let conflicts_recorded = if dry_run || outcome.conflicts.is_empty() {
            0
        } else {
            let attic = self
                .workspaces
                .attic(&WorkspaceTarget::named(SYNC_WORKSPACE))?;
            attic.append_all(&outcome.conflicts)?
        };

        if !dry_run {
            self.workspaces.clear(&WorkspaceTarget::Outbox)?;
        }

        info!(
            dry_run,
            pending,
            updated = outcome.updated.len(),
            conflicts = outcome.conflicts.len(),
            attempts = outcome.attempts,
            "sync finished"
        );

        Ok(SyncReport {
            dry_run,
            health,
            migration,
            outbox_drained,
            pending,
            outcome,
            conflicts_recorded,
        })
    }

    /// Mismatches between the worktree and the local branch are repaired,
    /// never merged around. Dry runs only report them.
    fn ensure_consistent(&self, dry_run: bool) -> Result<(), SyncError> {
        let consistency = self.worktree.check_consistency()?;
        let Some(defect) = consistency.defect(self.worktree.branch()) else {
            return Ok(());
        };

        if dry_run {
            return Err(WorktreeError::RepairRefused {
                problem: defect.to_string(),
            }
            .into());
        }

        warn!(%defect, "sync worktree inconsistent, reattaching");
        self.worktree.reattach()?;

        let consistency = self.worktree.check_consistency()?;
        match consistency.defect(self.worktree.branch()) {
            None => Ok(()),
            Some(defect) => Err(SyncError::Inconsistent(defect)),
        }
    }
}
