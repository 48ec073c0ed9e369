use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Field name used when two replicas created the same id independently
pub const WHOLE_ISSUE_FIELD: &str = "whole_issue";

/// A value lost during a merge, kept so nothing is silently discarded.
///
/// Conflict records are append-only: once written to an attic they are
/// never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub issue_id: String,
    pub field: String,
    pub lost_value: serde_json::Value,
    pub winner_value: serde_json::Value,
    pub local_version: u64,
    pub remote_version: u64,
    pub resolution: Resolution,
    pub timestamp: DateTime<Utc>,
}

/// How a conflict was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Later `updated_at` won; equal timestamps fall back to value ordering
    LastWriteWins,
    /// Independent creations on both sides; the earlier `created_at` won
    EarliestCreated,
}

impl ConflictRecord {
    pub fn is_whole_issue(&self) -> bool {
        self.field == WHOLE_ISSUE_FIELD
    }
}
