//! Worktree repair
//!
//! Moves a prunable, corrupted, or detached worktree back to `Valid` on the
//! sync branch. Corrupted contents are always backed up before anything is
//! deleted.

use anyhow::Context;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::git::branch::{branch_exists, is_ancestor_of};
use crate::models::{WorktreeHealth, WorktreeStatus};

use super::error::WorktreeError;
use super::manager::WorktreeManager;
use super::operations::{prune_worktrees, require_branch};

/// What a repair did
#[derive(Debug, Clone, Serialize)]
pub struct RepairReport {
    /// Status before the repair
    pub previous: WorktreeStatus,
    /// Health after the repair
    pub health: WorktreeHealth,
    /// Backup of the pre-repair contents, when anything was at risk
    pub backup_path: Option<PathBuf>,
}

impl WorktreeManager {
    /// Repair the worktree from the given observed status.
    pub fn repair(&self, status: WorktreeStatus) -> Result<RepairReport, WorktreeError> {
        info!(status = %status, path = %self.path().display(), "repairing sync worktree");

        let mut backup_path = None;
        let health = match status {
            WorktreeStatus::Missing => self.init()?,
            WorktreeStatus::Prunable => {
                prune_worktrees(self.repo_git())?;
                self.init()?
            }
            WorktreeStatus::Corrupted => {
                if self.path().exists() {
                    backup_path = Some(self.backup("corrupted", self.path())?);
                }
                self.remove()?;
                self.init()?
            }
            WorktreeStatus::Valid => {
                let health = self.health()?;
                if health.branch.as_deref() == Some(self.branch()) {
                    health
                } else {
                    self.reattach()?
                }
            }
        };

        Ok(RepairReport {
            previous: status,
            health,
            backup_path,
        })
    }

    /// Check the worktree back out onto the sync branch.
    ///
    /// Commits made on a detached HEAD that descend from the branch are kept
    /// by fast-forwarding the branch to them first. Anything else is left
    /// reachable only by hash, which is logged.
    pub fn reattach(&self) -> Result<WorktreeHealth, WorktreeError> {
        let wt = self.worktree_git();
        let health = self.health()?;
        let head = health.commit.clone().unwrap_or_default();

        if !branch_exists(self.repo_git(), self.branch()) {
            wt.checked(&["checkout", "-q", "-b", self.branch()])
                .context("Failed to create sync branch at worktree HEAD")?;
        } else {
            if !head.is_empty() && is_ancestor_of(&wt, self.branch(), &head)? {
                wt.checked(&["branch", "-f", self.branch(), &head])
                    .context("Failed to fast-forward sync branch")?;
            } else if !head.is_empty() {
                warn!(
                    head = %head,
                    branch = self.branch(),
                    "detached commits are not on the sync branch; recover them by hash if needed"
                );
            }
            wt.checked(&["checkout", "-q", self.branch()])
                .context("Failed to check out sync branch")?;
        }

        require_branch(&wt, self.branch())?;
        info!(branch = self.branch(), "sync worktree reattached");
        self.health()
    }

    /// Return a healthy worktree, repairing it first if needed.
    ///
    /// Under `dry_run` nothing is repaired or created; an unhealthy
    /// worktree is reported as [`WorktreeError::RepairRefused`].
    pub fn ensure_healthy(&self, dry_run: bool) -> Result<WorktreeHealth, WorktreeError> {
        let health = self.health()?;
        let attached = health.branch.as_deref() == Some(self.branch());
        if health.valid && attached {
            return Ok(health);
        }

        if dry_run {
            let problem = if health.valid {
                "detached HEAD".to_string()
            } else {
                health.status.to_string()
            };
            return Err(WorktreeError::RepairRefused { problem });
        }

        Ok(self.repair(health.status)?.health)
    }
}
