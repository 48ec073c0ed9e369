//! The sync worktree manager
//!
//! Owns one worktree: the isolated checkout of the sync branch where
//! records are staged, committed, and pushed. Every path is derived from
//! an explicit repository root; nothing depends on the process's current
//! directory.

use std::path::{Path, PathBuf};

use crate::config::SyncConfig;
use crate::git::runner::Git;

use super::error::WorktreeError;

#[derive(Debug, Clone)]
pub struct WorktreeManager {
    root: PathBuf,
    path: PathBuf,
    branch: String,
    remote: String,
    data_dir: PathBuf,
    git: Git,
}

impl WorktreeManager {
    /// Build a manager for the repository at `root` using `config`.
    ///
    /// The root is canonicalized so paths compare equal to what
    /// `git worktree list` prints.
    pub fn new(root: &Path, config: &SyncConfig) -> Result<Self, WorktreeError> {
        let root = root
            .canonicalize()
            .map_err(|e| WorktreeError::io(root, e))?;
        let git = Git::new(&root).with_timeout(config.git_timeout());
        Ok(Self {
            path: config.worktree_path(&root),
            branch: config.branch.clone(),
            remote: config.remote.clone(),
            data_dir: config.data_dir.clone(),
            root,
            git,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Worktree directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// Data directory name, relative to either checkout
    pub fn data_dir_name(&self) -> &Path {
        &self.data_dir
    }

    /// Data directory inside the worktree, where synced records live
    pub fn data_dir(&self) -> PathBuf {
        self.path.join(&self.data_dir)
    }

    /// Data directory in the main checkout: legacy record location, and
    /// home of workspaces and backups
    pub fn root_data_dir(&self) -> PathBuf {
        self.root.join(&self.data_dir)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root_data_dir().join("backups")
    }

    /// Git runner for the main repository
    pub fn repo_git(&self) -> &Git {
        &self.git
    }

    /// Git runner inside the worktree
    pub fn worktree_git(&self) -> Git {
        self.git.at(&self.path)
    }
}
