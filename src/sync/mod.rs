//! Replica synchronization
//!
//! This module provides:
//! - The update filter that drops bookkeeping-only changes
//! - A transport abstraction with a git implementation
//! - Bounded push retry with re-fetch and re-merge
//! - The end-to-end sync session

mod error;
mod filter;
mod lock;
mod retry;
mod session;
mod transport;

pub use error::SyncError;
pub use filter::get_updated_issues;
pub use lock::{SyncLock, LOCK_FILE};
pub use retry::{plan_sync, sync_with_retry, SyncOutcome};
pub use session::{SyncReport, SyncSession, SYNC_WORKSPACE};
pub use transport::{Fetched, GitTransport, PushOutcome, SyncTransport};
