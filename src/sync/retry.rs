//! Sync with bounded retry on non-fast-forward
//!
//! - Fetch the remote state and the common ancestor
//! - Merge local records against it
//! - Publish; if the remote moved meanwhile, fetch again and re-merge

use serde::Serialize;
use tracing::{debug, warn};

use crate::merge::merge_sets;
use crate::models::{ConflictRecord, Issue};

use super::error::SyncError;
use super::filter::get_updated_issues;
use super::transport::{PushOutcome, SyncTransport};

/// Result of one successful (or planned) sync cycle
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncOutcome {
    pub merged: Vec<Issue>,
    pub conflicts: Vec<ConflictRecord>,
    /// Merged records that differ substantively from the remote
    pub updated: Vec<Issue>,
    /// Fetch/merge/publish rounds, including the successful one
    pub attempts: usize,
}

/// Fetch and merge once without publishing
pub fn plan_sync<T: SyncTransport>(
    transport: &mut T,
    local: &[Issue],
) -> Result<SyncOutcome, SyncError> {
    let fetched = transport.fetch()?;
    let outcome = merge_sets(&fetched.base, local, &fetched.remote);
    let updated = get_updated_issues(&outcome.merged, &fetched.remote);
    Ok(SyncOutcome {
        merged: outcome.merged,
        conflicts: outcome.conflicts,
        updated,
        attempts: 1,
    })
}

/// Run sync cycles until a publish is accepted.
///
/// A rejected publish is retried up to `max_retries` times; after that the
/// run fails with [`SyncError::TooManyRetries`] rather than spinning.
///
/// A rejected round has already committed its merge on top of the remote
/// head it fetched, so that head becomes the next base. The next round
/// merges the rejected result, not the original local records, against it.
pub fn sync_with_retry<T: SyncTransport>(
    transport: &mut T,
    local: &[Issue],
    max_retries: usize,
) -> Result<SyncOutcome, SyncError> {
    let mut retries = 0;
    let mut local = local.to_vec();
    let mut earlier_conflicts = Vec::new();

    loop {
        let mut outcome = plan_sync(transport, &local)?;
        outcome.attempts = retries + 1;

        match transport.publish(&outcome.merged)? {
            PushOutcome::Pushed => {
                if !earlier_conflicts.is_empty() {
                    earlier_conflicts.append(&mut outcome.conflicts);
                    outcome.conflicts = earlier_conflicts;
                }
                debug!(
                    attempts = outcome.attempts,
                    updated = outcome.updated.len(),
                    conflicts = outcome.conflicts.len(),
                    "sync cycle complete"
                );
                return Ok(outcome);
            }
            PushOutcome::Rejected => {
                retries += 1;
                if retries > max_retries {
                    return Err(SyncError::TooManyRetries(retries));
                }
                warn!(retry = retries, max_retries, "push rejected, re-fetching");
                earlier_conflicts.append(&mut outcome.conflicts);
                local = outcome.merged;
            }
        }
    }
}
