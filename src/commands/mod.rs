//! CLI command implementations

pub mod check;
pub mod common;
pub mod migrate;
pub mod sync;
pub mod workspace;
pub mod worktree_cmd;
