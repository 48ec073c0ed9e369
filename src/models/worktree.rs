use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Health of the sync worktree, as observed on disk and in git's registry.
///
/// Lifecycle:
/// `Missing -> Valid` (init), `Valid -> Prunable` (directory deleted while
/// still registered), `Valid -> Corrupted` (registered but internal
/// metadata broken), `Prunable | Corrupted -> Valid` (repair).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorktreeStatus {
    /// Directory exists, is registered, and git can resolve its HEAD
    Valid,
    /// Neither the directory nor a registration exists
    Missing,
    /// Registration exists but the directory is gone
    Prunable,
    /// Directory exists but git cannot use it
    Corrupted,
}

impl fmt::Display for WorktreeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorktreeStatus::Valid => write!(f, "valid"),
            WorktreeStatus::Missing => write!(f, "missing"),
            WorktreeStatus::Prunable => write!(f, "prunable"),
            WorktreeStatus::Corrupted => write!(f, "corrupted"),
        }
    }
}

/// Snapshot of the worktree's health
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorktreeHealth {
    pub status: WorktreeStatus,
    pub path: PathBuf,
    /// Directory exists on disk
    pub exists: bool,
    /// Status is `Valid`
    pub valid: bool,
    /// Branch checked out in the worktree; `None` when HEAD is detached or unreadable
    pub branch: Option<String>,
    /// Commit at the worktree's HEAD
    pub commit: Option<String>,
}

impl WorktreeHealth {
    pub fn new(status: WorktreeStatus, path: &Path, exists: bool) -> Self {
        Self {
            status,
            path: path.to_path_buf(),
            exists,
            valid: status == WorktreeStatus::Valid,
            branch: None,
            commit: None,
        }
    }

    pub fn with_head(mut self, branch: Option<String>, commit: Option<String>) -> Self {
        self.branch = branch;
        self.commit = commit;
        self
    }

    /// Valid and checked out on a named branch
    pub fn is_attached(&self) -> bool {
        self.valid && self.branch.is_some()
    }

    /// True when an explicit repair is needed before the worktree can be used
    pub fn needs_repair(&self) -> bool {
        matches!(
            self.status,
            WorktreeStatus::Prunable | WorktreeStatus::Corrupted
        )
    }
}

/// Relative positions of the worktree HEAD, the local sync branch, and
/// its remote-tracking counterpart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncConsistency {
    pub worktree_head: Option<String>,
    pub local_head: Option<String>,
    /// Branch the worktree HEAD points at (`None` when detached)
    pub worktree_branch: Option<String>,
    /// Commits on the local branch not on the remote-tracking branch
    pub local_ahead: u32,
    /// Commits on the remote-tracking branch not on the local branch
    pub local_behind: u32,
    pub worktree_matches_local: bool,
}

/// A consistency defect that must be fixed by the worktree manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyDefect {
    /// Worktree HEAD is not attached to the sync branch
    DetachedHead { head: Option<String> },
    /// Worktree is on the sync branch but points at a different commit than the local ref
    HeadMismatch {
        worktree_head: Option<String>,
        local_head: Option<String>,
    },
}

impl fmt::Display for ConsistencyDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyDefect::DetachedHead { head } => write!(
                f,
                "worktree HEAD is detached at {}",
                head.as_deref().unwrap_or("<unknown>")
            ),
            ConsistencyDefect::HeadMismatch {
                worktree_head,
                local_head,
            } => write!(
                f,
                "worktree HEAD {} does not match local branch {}",
                worktree_head.as_deref().unwrap_or("<none>"),
                local_head.as_deref().unwrap_or("<none>")
            ),
        }
    }
}

impl SyncConsistency {
    /// Classify a mismatch as a health defect. Mismatches are never merged around.
    pub fn defect(&self, expected_branch: &str) -> Option<ConsistencyDefect> {
        if self.worktree_branch.as_deref() != Some(expected_branch) {
            return Some(ConsistencyDefect::DetachedHead {
                head: self.worktree_head.clone(),
            });
        }
        if !self.worktree_matches_local {
            return Some(ConsistencyDefect::HeadMismatch {
                worktree_head: self.worktree_head.clone(),
                local_head: self.local_head.clone(),
            });
        }
        None
    }

    pub fn is_diverged(&self) -> bool {
        self.local_ahead > 0 && self.local_behind > 0
    }
}
