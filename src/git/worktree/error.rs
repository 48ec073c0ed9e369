use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::WorktreeStatus;
use crate::store::StoreError;

/// Errors from the sync worktree manager
#[derive(Error, Debug)]
pub enum WorktreeError {
    #[error("sync worktree is missing at {0}; run init")]
    Missing(PathBuf),

    #[error("sync worktree at {0} is prunable (directory gone, registration stale); run repair")]
    Prunable(PathBuf),

    #[error("sync worktree at {0} is corrupted; run repair")]
    Corrupted(PathBuf),

    #[error("sync worktree at {path} is not on branch {branch} (HEAD {head}); run repair")]
    Detached {
        path: PathBuf,
        branch: String,
        head: String,
    },

    #[error("sync worktree needs repair ({problem}); refusing to repair during a dry run")]
    RepairRefused { problem: String },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Git(#[from] anyhow::Error),
}

impl WorktreeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        WorktreeError::Io {
            path: path.into(),
            source,
        }
    }

    /// Error describing a worktree that cannot be used in the given state
    pub(crate) fn for_status(status: WorktreeStatus, path: PathBuf) -> Option<Self> {
        match status {
            WorktreeStatus::Valid => None,
            WorktreeStatus::Missing => Some(WorktreeError::Missing(path)),
            WorktreeStatus::Prunable => Some(WorktreeError::Prunable(path)),
            WorktreeStatus::Corrupted => Some(WorktreeError::Corrupted(path)),
        }
    }

    /// True for states an explicit repair can fix
    pub fn is_repairable(&self) -> bool {
        matches!(
            self,
            WorktreeError::Missing(_)
                | WorktreeError::Prunable(_)
                | WorktreeError::Corrupted(_)
                | WorktreeError::Detached { .. }
        )
    }
}
