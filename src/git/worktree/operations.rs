//! Worktree operations
//!
//! Creating, listing, removing, and pruning the sync worktree.

use anyhow::{bail, Context, Result};
use std::fs;
use tracing::{debug, info, warn};

use crate::git::branch::{branch_exists, current_branch, remote_branch_exists, rev_parse};
use crate::git::runner::Git;
use crate::models::{WorktreeHealth, WorktreeStatus};

use super::error::WorktreeError;
use super::manager::WorktreeManager;
use super::parser::{parse_worktree_list, WorktreeInfo};

const INIT_COMMIT_MESSAGE: &str = "trackline: initialize sync branch";

/// List all worktrees registered with the repository
pub fn list_worktrees(git: &Git) -> Result<Vec<WorktreeInfo>> {
    let stdout = git
        .checked(&["worktree", "list", "--porcelain"])
        .context("Failed to list worktrees")?;
    Ok(parse_worktree_list(&stdout))
}

/// Drop registrations whose directories no longer exist
pub fn prune_worktrees(git: &Git) -> Result<()> {
    git.checked(&["worktree", "prune"])
        .context("Failed to prune worktrees")?;
    Ok(())
}

impl WorktreeManager {
    /// Create the sync worktree, or reuse it if it is already valid.
    ///
    /// The worktree is always checked out on the sync branch, never on a
    /// detached HEAD: commits made on a detached HEAD do not advance the
    /// branch and would be lost to the next push.
    ///
    /// Branch source, in order of preference: the existing local branch,
    /// the remote-tracking branch, or a new orphan branch with an empty
    /// root commit.
    pub fn init(&self) -> Result<WorktreeHealth, WorktreeError> {
        let health = self.health()?;
        match health.status {
            WorktreeStatus::Valid => {
                if health.branch.as_deref() == Some(self.branch()) {
                    return Ok(health);
                }
                return self.reattach();
            }
            WorktreeStatus::Missing => {}
            other => {
                return Err(WorktreeError::for_status(other, self.path().to_path_buf())
                    .unwrap_or_else(|| WorktreeError::Corrupted(self.path().to_path_buf())));
            }
        }

        if let Some(parent) = self.path().parent() {
            fs::create_dir_all(parent).map_err(|e| WorktreeError::io(parent, e))?;
        }

        let git = self.repo_git();
        let path_str = self.path().to_string_lossy().to_string();
        let remote_ref = format!("{}/{}", self.remote(), self.branch());

        if branch_exists(git, self.branch()) {
            debug!(branch = self.branch(), "attaching worktree to existing branch");
            git.checked(&["worktree", "add", &path_str, self.branch()])
                .context("Failed to add worktree for existing branch")?;
        } else if remote_branch_exists(git, self.remote(), self.branch()) {
            debug!(branch = self.branch(), "creating branch from {remote_ref}");
            git.checked(&[
                "worktree",
                "add",
                "--track",
                "-b",
                self.branch(),
                &path_str,
                &remote_ref,
            ])
            .context("Failed to add worktree tracking remote branch")?;
        } else {
            self.create_orphan_worktree(&path_str)?;
        }

        self.ensure_data_dirs()?;

        let health = self.health()?;
        if health.branch.as_deref() != Some(self.branch()) {
            return Err(WorktreeError::Detached {
                path: self.path().to_path_buf(),
                branch: self.branch().to_string(),
                head: health.commit.unwrap_or_default(),
            });
        }

        info!(
            path = %self.path().display(),
            branch = self.branch(),
            "sync worktree initialized"
        );
        Ok(health)
    }

    /// New worktree on a fresh orphan branch, so sync history never mixes
    /// with the user's project history.
    fn create_orphan_worktree(&self, path_str: &str) -> Result<()> {
        let git = self.repo_git();
        debug!(branch = self.branch(), "creating orphan sync branch");

        if rev_parse(git, "HEAD")?.is_some() {
            git.checked(&["worktree", "add", "--detach", path_str, "HEAD"])
                .context("Failed to add worktree")?;
        } else {
            // Repository without commits: let git create the orphan directly.
            git.checked(&["worktree", "add", "--orphan", "-b", self.branch(), path_str])
                .context("Failed to add orphan worktree")?;
        }

        let wt = self.worktree_git();
        if current_branch(&wt)?.as_deref() != Some(self.branch()) {
            wt.checked(&["checkout", "-q", "--orphan", self.branch()])
                .context("Failed to create orphan branch")?;
            // The orphan starts with the project's files staged; drop them
            // from the index and the directory.
            wt.run(&["rm", "-r", "-q", "--cached", "--ignore-unmatch", "."])?;
            self.clear_worktree_files()?;
        }

        wt.checked(&["commit", "-q", "--allow-empty", "-m", INIT_COMMIT_MESSAGE])
            .context("Failed to create initial sync commit")?;
        Ok(())
    }

    fn clear_worktree_files(&self) -> Result<()> {
        for entry in fs::read_dir(self.path())
            .with_context(|| format!("Failed to read {}", self.path().display()))?
        {
            let entry = entry?;
            if entry.file_name() == ".git" {
                continue;
            }
            let path = entry.path();
            if path.is_dir() && !path.is_symlink() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            }
            .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }

    fn ensure_data_dirs(&self) -> Result<(), WorktreeError> {
        for sub in [crate::store::ISSUES_DIR, crate::store::MAPPINGS_DIR] {
            let dir = self.data_dir().join(sub);
            fs::create_dir_all(&dir).map_err(|e| WorktreeError::io(&dir, e))?;
        }
        Ok(())
    }

    /// Remove the worktree registration and directory.
    ///
    /// Falls back to deleting the directory and pruning when
    /// `git worktree remove` refuses.
    pub fn remove(&self) -> Result<(), WorktreeError> {
        let git = self.repo_git();
        let path_str = self.path().to_string_lossy().to_string();

        if self.path().exists() {
            let output = git.run(&["worktree", "remove", "--force", &path_str])?;
            if !output.success() {
                warn!(
                    path = %self.path().display(),
                    "git worktree remove failed, deleting directory: {}",
                    output.stderr.trim()
                );
                fs::remove_dir_all(self.path())
                    .map_err(|e| WorktreeError::io(self.path(), e))?;
            }
        }

        prune_worktrees(git)?;
        Ok(())
    }

    /// Prune stale registrations
    pub fn prune(&self) -> Result<(), WorktreeError> {
        prune_worktrees(self.repo_git())?;
        Ok(())
    }
}

/// Bail unless HEAD of `git` is attached to `branch`
pub(super) fn require_branch(git: &Git, branch: &str) -> Result<()> {
    match current_branch(git)? {
        Some(current) if current == branch => Ok(()),
        Some(current) => bail!("worktree is on branch {current}, expected {branch}"),
        None => bail!("worktree HEAD is detached, expected branch {branch}"),
    }
}
