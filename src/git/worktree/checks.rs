//! Worktree health checks
//!
//! Classifies the sync worktree by comparing what is on disk with what
//! git's worktree registry says.

use anyhow::{Context, Result};
use std::path::Path;

use crate::git::branch::{current_branch, rev_parse};
use crate::models::{WorktreeHealth, WorktreeStatus};

use super::error::WorktreeError;
use super::manager::WorktreeManager;
use super::operations::list_worktrees;
use super::parser::WorktreeInfo;

impl WorktreeManager {
    /// Registry entry for this worktree's path, if git knows about it
    pub fn registration(&self) -> Result<Option<WorktreeInfo>> {
        let worktrees = list_worktrees(self.repo_git())?;
        Ok(worktrees
            .into_iter()
            .find(|wt| same_path(&wt.path, self.path())))
    }

    /// Inspect the worktree and classify it.
    ///
    /// - no directory, no registration: `Missing`
    /// - registration without directory: `Prunable`
    /// - directory that git cannot use as this worktree: `Corrupted`
    /// - otherwise `Valid`, with the checked-out branch and HEAD commit
    pub fn health(&self) -> Result<WorktreeHealth, WorktreeError> {
        let path = self.path();
        let exists = path.exists();
        let registration = self.registration()?;

        let status = match (exists, &registration) {
            (false, None) => WorktreeStatus::Missing,
            (false, Some(_)) => WorktreeStatus::Prunable,
            (true, Some(info)) if info.prunable.is_some() => WorktreeStatus::Corrupted,
            (true, Some(_)) => {
                if self.metadata_intact()? {
                    WorktreeStatus::Valid
                } else {
                    WorktreeStatus::Corrupted
                }
            }
            (true, None) => WorktreeStatus::Corrupted,
        };

        let health = WorktreeHealth::new(status, path, exists);
        if status != WorktreeStatus::Valid {
            return Ok(health);
        }

        let git = self.worktree_git();
        let branch = current_branch(&git)?;
        let commit = rev_parse(&git, "HEAD")?;
        Ok(health.with_head(branch, commit))
    }

    /// The directory's `.git` link resolves, and git run inside it reports
    /// this directory as the top level. A missing or broken link would
    /// otherwise let git walk up into the main repository.
    fn metadata_intact(&self) -> Result<bool> {
        let dot_git = self.path().join(".git");
        if !dot_git.is_file() {
            return Ok(false);
        }

        let output = self
            .worktree_git()
            .run(&["rev-parse", "--show-toplevel"])
            .context("Failed to probe worktree metadata")?;
        if !output.success() {
            return Ok(false);
        }

        Ok(same_path(Path::new(output.stdout.trim()), self.path()))
    }
}

/// Compare paths by canonical form when both exist, literally otherwise
pub(super) fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
