//! Named record snapshots
//!
//! This module provides:
//! - Save/import between a data directory and a workspace
//! - The outbox workspace, holding records waiting to be synced
//! - The attic, an append-only log of merge conflicts per workspace

mod attic;
mod error;
mod manager;
mod target;

pub use attic::{Attic, ATTIC_DIR};
pub use error::WorkspaceError;
pub use manager::{
    SaveFilter, TransferReport, WorkspaceManager, RETIRED_ATTICS_DIR, WORKSPACES_DIR,
};
pub use target::{WorkspaceTarget, OUTBOX};
