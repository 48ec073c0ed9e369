//! Integration tests for trackline sync
//!
//! These tests drive real git repositories: replicas sharing a bare
//! remote, worktree damage and repair, and workspace round trips.

pub mod helpers;
pub mod sync_replicas;
pub mod workspace_roundtrip;
pub mod worktree_lifecycle;
