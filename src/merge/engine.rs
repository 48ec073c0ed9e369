//! Three-way field-level merge of two issue records

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use tracing::debug;

use crate::models::{ConflictRecord, Issue, Resolution, WHOLE_ISSUE_FIELD};

use super::strategy::{FieldSpec, Strategy, FIELD_TABLE};

/// Result of merging one record. Conflicts are part of the result, never an error.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub merged: Issue,
    pub conflicts: Vec<ConflictRecord>,
}

impl MergeOutcome {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Which side's value a last-write-wins decision picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Local,
    Remote,
}

/// Merge `local` and `remote` against their common ancestor.
///
/// With no ancestor the two records were created independently under the
/// same id; the earlier creation wins whole and the loser is recorded as a
/// single `whole_issue` conflict.
pub fn merge(base: Option<&Issue>, local: &Issue, remote: &Issue) -> MergeOutcome {
    let now = Utc::now();
    let outcome = match base {
        Some(base) => merge_fields(base, local, remote, now),
        None => merge_independent(local, remote, now),
    };

    if outcome.has_conflicts() {
        debug!(
            issue = %outcome.merged.id,
            conflicts = outcome.conflicts.len(),
            "merge recorded conflicts"
        );
    }
    outcome
}

fn merge_fields(base: &Issue, local: &Issue, remote: &Issue, now: DateTime<Utc>) -> MergeOutcome {
    let mut merged = local.clone();
    let mut conflicts = Vec::new();

    for spec in FIELD_TABLE {
        match spec.strategy {
            Strategy::Immutable => (spec.copy)(&mut merged, base),
            Strategy::Union => (spec.union)(&mut merged, remote),
            Strategy::Latest => {
                if remote.updated_at > local.updated_at {
                    (spec.copy)(&mut merged, remote);
                }
            }
            Strategy::LastWriteWins => {
                if let Some(conflict) = merge_lww_field(spec, base, local, remote, &mut merged, now)
                {
                    conflicts.push(conflict);
                }
            }
            Strategy::Counter => {}
        }
    }

    merged.version = resolve_version(&merged, local, remote);
    MergeOutcome { merged, conflicts }
}

/// Resolve one last-write-wins field into `merged`, which starts as a copy of `local`.
fn merge_lww_field(
    spec: &FieldSpec,
    base: &Issue,
    local: &Issue,
    remote: &Issue,
    merged: &mut Issue,
    now: DateTime<Utc>,
) -> Option<ConflictRecord> {
    if !(spec.differs)(local, remote) {
        return None;
    }

    let local_changed = (spec.differs)(local, base);
    let remote_changed = (spec.differs)(remote, base);

    match (local_changed, remote_changed) {
        (true, false) => None,
        (false, true) => {
            (spec.copy)(merged, remote);
            None
        }
        _ => {
            let winner = lww_winner(spec, local, remote);
            let (won, lost) = match winner {
                Side::Local => (local, remote),
                Side::Remote => (remote, local),
            };
            (spec.copy)(merged, won);
            Some(ConflictRecord {
                issue_id: local.id.clone(),
                field: spec.name.to_string(),
                lost_value: (spec.value)(lost),
                winner_value: (spec.value)(won),
                local_version: local.version,
                remote_version: remote.version,
                resolution: Resolution::LastWriteWins,
                timestamp: now,
            })
        }
    }
}

/// Later `updated_at` wins. On equal timestamps the value whose JSON form
/// sorts greater wins, so every replica picks the same value no matter
/// which side it calls local.
fn lww_winner(spec: &FieldSpec, local: &Issue, remote: &Issue) -> Side {
    match local.updated_at.cmp(&remote.updated_at) {
        Ordering::Greater => Side::Local,
        Ordering::Less => Side::Remote,
        Ordering::Equal => {
            let local_value = (spec.value)(local).to_string();
            let remote_value = (spec.value)(remote).to_string();
            if local_value >= remote_value {
                Side::Local
            } else {
                Side::Remote
            }
        }
    }
}

/// `max(local, remote)`, bumped by one only when the merge produced content
/// that neither side had.
fn resolve_version(merged: &Issue, local: &Issue, remote: &Issue) -> u64 {
    let candidate = local.version.max(remote.version);
    if merged.substantively_eq(local) || merged.substantively_eq(remote) {
        candidate
    } else {
        candidate + 1
    }
}

fn merge_independent(local: &Issue, remote: &Issue, now: DateTime<Utc>) -> MergeOutcome {
    let updated_at = local.updated_at.max(remote.updated_at);

    if local.substantively_eq(remote) {
        let mut merged = local.clone();
        merged.version = local.version.max(remote.version);
        merged.updated_at = updated_at;
        return MergeOutcome {
            merged,
            conflicts: Vec::new(),
        };
    }

    let (winner, loser) = match earliest_created(local, remote) {
        Side::Local => (local, remote),
        Side::Remote => (remote, local),
    };

    let mut merged = winner.clone();
    merged.version = resolve_version(winner, local, remote);

    let conflict = ConflictRecord {
        issue_id: winner.id.clone(),
        field: WHOLE_ISSUE_FIELD.to_string(),
        lost_value: serde_json::to_value(loser).unwrap_or(serde_json::Value::Null),
        winner_value: serde_json::to_value(winner).unwrap_or(serde_json::Value::Null),
        local_version: local.version,
        remote_version: remote.version,
        resolution: Resolution::EarliestCreated,
        timestamp: now,
    };

    MergeOutcome {
        merged,
        conflicts: vec![conflict],
    }
}

/// Earlier `created_at` wins; equal creation times fall back to the
/// record whose JSON form sorts first.
fn earliest_created(local: &Issue, remote: &Issue) -> Side {
    match local.created_at.cmp(&remote.created_at) {
        Ordering::Less => Side::Local,
        Ordering::Greater => Side::Remote,
        Ordering::Equal => {
            let local_json = serde_json::to_string(local).unwrap_or_default();
            let remote_json = serde_json::to_string(remote).unwrap_or_default();
            if local_json <= remote_json {
                Side::Local
            } else {
                Side::Remote
            }
        }
    }
}
