//! Sync worktree management
//!
//! Sync data lives on its own branch, checked out in a dedicated worktree
//! so staging and committing records never touches the user's checkout.
//!
//! ## Module structure
//!
//! - `manager`: The [`WorktreeManager`] and its derived paths
//! - `checks`: Health classification (missing, valid, prunable, corrupted)
//! - `operations`: Init, remove, prune, and worktree listing
//! - `repair`: Repair, reattach, and `ensure_healthy`
//! - `backup`: Timestamped backups taken before destructive steps
//! - `migrate`: Moving legacy data into the worktree
//! - `parser`: `git worktree list --porcelain` parsing

mod backup;
mod checks;
mod error;
mod manager;
mod migrate;
mod operations;
mod parser;
mod repair;

pub use error::WorktreeError;
pub use manager::WorktreeManager;
pub use migrate::MigrationReport;
pub use operations::{list_worktrees, prune_worktrees};
pub use parser::{parse_worktree_list, WorktreeInfo};
pub use repair::RepairReport;
