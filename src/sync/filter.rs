//! Update filter
//!
//! A bulk merge bumps `version` and `updated_at` on records whose content
//! did not change. Only records that actually differ are worth pushing.

use std::collections::HashMap;

use crate::models::Issue;

/// Records in `local` that are absent from `remote` or differ from their
/// remote counterpart in more than `version`/`updated_at`.
///
/// Order follows `local`.
pub fn get_updated_issues(local: &[Issue], remote: &[Issue]) -> Vec<Issue> {
    let remote_by_id: HashMap<&str, &Issue> =
        remote.iter().map(|issue| (issue.id.as_str(), issue)).collect();

    local
        .iter()
        .filter(|issue| match remote_by_id.get(issue.id.as_str()) {
            Some(theirs) => !issue.substantively_eq(theirs),
            None => true,
        })
        .cloned()
        .collect()
}
