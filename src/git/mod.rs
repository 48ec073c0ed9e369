//! Git operations for the sync layer
//!
//! This module provides:
//! - A subprocess runner with timeouts for every git call
//! - Branch helpers (existence, current branch, ahead/behind)
//! - The sync worktree manager (init, health, repair, migration)
//! - Consistency checks between the worktree and the sync branch
//! - Reading records straight from commits

pub mod branch;
pub mod consistency;
pub mod records;
pub mod runner;
#[cfg(test)]
pub(crate) mod test_support;
pub mod worktree;

pub use branch::{
    ahead_behind, branch_exists, current_branch, is_ancestor_of, remote_branch_exists, rev_parse,
};
pub use consistency::check_sync_consistency;
pub use records::read_records_at;
pub use runner::{check_git_available, Git, GitOutput, DEFAULT_GIT_TIMEOUT};
pub use worktree::{
    list_worktrees, MigrationReport, RepairReport, WorktreeError, WorktreeInfo, WorktreeManager,
};
