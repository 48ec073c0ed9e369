//! Merging whole record sets, one id at a time

use std::collections::BTreeMap;

use crate::models::{ConflictRecord, Issue};

use super::engine::merge;

/// Result of merging two replicas' record sets
#[derive(Debug, Clone, Default)]
pub struct SetMergeOutcome {
    /// Every record present on either side, sorted by id
    pub merged: Vec<Issue>,
    pub conflicts: Vec<ConflictRecord>,
}

/// Merge `local` and `remote` record sets, using `base` as the per-id ancestor.
///
/// Records that exist on one side only pass through untouched. Records on
/// both sides are merged with their base entry when one exists, otherwise
/// they are treated as independent creations.
pub fn merge_sets(base: &[Issue], local: &[Issue], remote: &[Issue]) -> SetMergeOutcome {
    let base_by_id: BTreeMap<&str, &Issue> = base.iter().map(|i| (i.id.as_str(), i)).collect();
    let remote_by_id: BTreeMap<&str, &Issue> =
        remote.iter().map(|i| (i.id.as_str(), i)).collect();
    let local_by_id: BTreeMap<&str, &Issue> = local.iter().map(|i| (i.id.as_str(), i)).collect();

    let mut outcome = SetMergeOutcome::default();

    for (id, local_issue) in &local_by_id {
        match remote_by_id.get(id) {
            Some(remote_issue) => {
                let base_issue = base_by_id.get(id).copied();
                let result = merge(base_issue, local_issue, remote_issue);
                outcome.merged.push(result.merged);
                outcome.conflicts.extend(result.conflicts);
            }
            None => outcome.merged.push((*local_issue).clone()),
        }
    }

    for (id, remote_issue) in &remote_by_id {
        if !local_by_id.contains_key(id) {
            outcome.merged.push((*remote_issue).clone());
        }
    }

    outcome.merged.sort_by(|a, b| a.id.cmp(&b.id));
    outcome
}
