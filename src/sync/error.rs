//! Sync error types.

use thiserror::Error;

use crate::git::worktree::WorktreeError;
use crate::models::ConsistencyDefect;
use crate::store::StoreError;
use crate::workspace::WorkspaceError;

/// Errors that can end a sync run.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("push rejected after {0} attempts; remote keeps moving, try again later")]
    TooManyRetries(usize),

    #[error("another sync is running (lock held on {0})")]
    Locked(String),

    #[error("sync worktree is inconsistent: {0}")]
    Inconsistent(ConsistencyDefect),

    #[error(transparent)]
    Worktree(#[from] WorktreeError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("transport failed: {0:#}")]
    Transport(#[from] anyhow::Error),
}

impl SyncError {
    /// Whether running the sync again later may succeed without intervention
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::TooManyRetries(_) | SyncError::Locked(_))
    }
}
