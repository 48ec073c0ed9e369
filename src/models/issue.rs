use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// An issue record as stored on disk, one JSON file per record.
///
/// `id` and `created_at` never change after creation. `version` is a
/// monotonic counter maintained by the merge engine, and `updated_at`
/// drives last-write-wins resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Globally unique identifier
    pub id: String,
    #[serde(default = "initial_version")]
    pub version: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: IssueStatus,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(rename = "type", default)]
    pub issue_type: IssueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub dependencies: BTreeSet<Dependency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Preferred ordering of children; resolved as one value, never element-wise
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_order_hints: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_issue_url: Option<String>,
    /// Open map for fields owned by other subsystems
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

fn initial_version() -> u64 {
    1
}

fn default_priority() -> u8 {
    2
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    #[default]
    Open,
    InProgress,
    Blocked,
    Deferred,
    Closed,
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueStatus::Open => write!(f, "open"),
            IssueStatus::InProgress => write!(f, "in_progress"),
            IssueStatus::Blocked => write!(f, "blocked"),
            IssueStatus::Deferred => write!(f, "deferred"),
            IssueStatus::Closed => write!(f, "closed"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Bug,
    Feature,
    #[default]
    Task,
    Epic,
    Chore,
}

/// A typed edge to another issue. Two edges are the same edge when both
/// the type and the target match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
    pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyType {
    Blocks,
    Related,
    ParentChild,
    DiscoveredFrom,
}

impl Dependency {
    pub fn new(dep_type: DependencyType, target: impl Into<String>) -> Self {
        Self {
            dep_type,
            target: target.into(),
        }
    }
}

impl Issue {
    /// Create a new open task with `version = 1` and both timestamps set to now
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self::with_timestamp(id, title, now)
    }

    /// Create a new issue with an explicit creation time (used by tests and importers)
    pub fn with_timestamp(
        id: impl Into<String>,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            version: initial_version(),
            title: title.into(),
            description: String::new(),
            notes: String::new(),
            status: IssueStatus::default(),
            priority: default_priority(),
            issue_type: IssueType::default(),
            assignee: None,
            labels: BTreeSet::new(),
            dependencies: BTreeSet::new(),
            parent_id: None,
            child_order_hints: Vec::new(),
            created_at,
            updated_at: created_at,
            closed_at: None,
            close_reason: None,
            spec_path: None,
            external_issue_url: None,
            extensions: BTreeMap::new(),
        }
    }

    /// Structural equality ignoring `version` and `updated_at`.
    ///
    /// Two records that differ only in bookkeeping carry the same content
    /// and must not be reported as changed or trigger a version bump.
    pub fn substantively_eq(&self, other: &Issue) -> bool {
        self.without_bookkeeping() == other.without_bookkeeping()
    }

    fn without_bookkeeping(&self) -> Issue {
        let mut stripped = self.clone();
        stripped.version = 0;
        stripped.updated_at = DateTime::<Utc>::UNIX_EPOCH;
        stripped
    }

    /// Fill inheritable fields that are unset on this record from its parent
    pub fn inherit_from_parent(&mut self, parent: &Issue) {
        if self.spec_path.is_none() {
            self.spec_path = parent.spec_path.clone();
        }
        if self.external_issue_url.is_none() {
            self.external_issue_url = parent.external_issue_url.clone();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.status == IssueStatus::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_substantively_eq_ignores_bookkeeping() {
        let a = Issue::with_timestamp("tl-1", "Fix sync", at(1));
        let mut b = a.clone();
        b.version = 9;
        b.updated_at = at(5);

        assert!(a.substantively_eq(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_substantively_eq_detects_content_change() {
        let a = Issue::with_timestamp("tl-1", "Fix sync", at(1));
        let mut b = a.clone();
        b.labels.insert("sync".to_string());

        assert!(!a.substantively_eq(&b));
    }

    #[test]
    fn test_inherit_from_parent_keeps_own_values() {
        let mut parent = Issue::with_timestamp("tl-1", "Epic", at(1));
        parent.spec_path = Some("specs/epic.md".to_string());
        parent.external_issue_url = Some("https://tracker.example/1".to_string());

        let mut child = Issue::with_timestamp("tl-2", "Child", at(2));
        child.spec_path = Some("specs/child.md".to_string());
        child.inherit_from_parent(&parent);

        assert_eq!(child.spec_path.as_deref(), Some("specs/child.md"));
        assert_eq!(
            child.external_issue_url.as_deref(),
            Some("https://tracker.example/1")
        );
    }

    #[test]
    fn test_json_uses_type_keys() {
        let mut issue = Issue::with_timestamp("tl-1", "Fix sync", at(1));
        issue
            .dependencies
            .insert(Dependency::new(DependencyType::Blocks, "tl-2"));

        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["type"], "task");
        assert_eq!(json["dependencies"][0]["type"], "blocks");
        assert_eq!(json["dependencies"][0]["target"], "tl-2");
        assert!(json.get("assignee").is_none());
    }

    #[test]
    fn test_deserialize_minimal_record() {
        let raw = r#"{
            "id": "tl-9",
            "title": "Minimal",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        }"#;
        let issue: Issue = serde_json::from_str(raw).unwrap();
        assert_eq!(issue.version, 1);
        assert_eq!(issue.status, IssueStatus::Open);
        assert!(issue.labels.is_empty());
    }
}
