//! Field-to-strategy table
//!
//! Each issue field is listed once with the rule used to reconcile it.
//! Adding a field to [`Issue`] means adding one line here; the engine
//! interprets the table generically.

use serde_json::Value;

use crate::models::Issue;

/// Reconciliation rule for a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Set at creation, never changed: the ancestor's value is kept
    Immutable,
    /// Later `updated_at` wins; two divergent edits produce a conflict record
    LastWriteWins,
    /// Deduplicated union of both sides
    Union,
    /// The later of the two timestamps
    Latest,
    /// Monotonic counter, resolved after every other field
    Counter,
}

/// One row of the field table
pub struct FieldSpec {
    /// JSON key of the field
    pub name: &'static str,
    pub strategy: Strategy,
    /// True when the field differs between two records
    pub differs: fn(&Issue, &Issue) -> bool,
    /// Copy the field from `src` into `dst`
    pub copy: fn(&mut Issue, &Issue),
    /// Add the elements of `src` into `dst`; a no-op for scalar fields
    pub union: fn(&mut Issue, &Issue),
    /// Field value as JSON, for conflict records and tie-breaks
    pub value: fn(&Issue) -> Value,
}

macro_rules! field {
    (union $name:literal, $field:ident) => {
        FieldSpec {
            name: $name,
            strategy: Strategy::Union,
            differs: |a, b| a.$field != b.$field,
            copy: |dst, src| dst.$field = src.$field.clone(),
            union: |dst, src| dst.$field.extend(src.$field.iter().cloned()),
            value: |issue| serde_json::to_value(&issue.$field).unwrap_or(Value::Null),
        }
    };
    ($name:literal, $field:ident, $strategy:expr) => {
        FieldSpec {
            name: $name,
            strategy: $strategy,
            differs: |a, b| a.$field != b.$field,
            copy: |dst, src| dst.$field = src.$field.clone(),
            union: |_, _| {},
            value: |issue| serde_json::to_value(&issue.$field).unwrap_or(Value::Null),
        }
    };
}

pub const FIELD_TABLE: &[FieldSpec] = &[
    field!("id", id, Strategy::Immutable),
    field!("type", issue_type, Strategy::Immutable),
    field!("created_at", created_at, Strategy::Immutable),
    field!("title", title, Strategy::LastWriteWins),
    field!("description", description, Strategy::LastWriteWins),
    field!("notes", notes, Strategy::LastWriteWins),
    field!("status", status, Strategy::LastWriteWins),
    field!("priority", priority, Strategy::LastWriteWins),
    field!("assignee", assignee, Strategy::LastWriteWins),
    field!("parent_id", parent_id, Strategy::LastWriteWins),
    field!("child_order_hints", child_order_hints, Strategy::LastWriteWins),
    field!("closed_at", closed_at, Strategy::LastWriteWins),
    field!("close_reason", close_reason, Strategy::LastWriteWins),
    field!("spec_path", spec_path, Strategy::LastWriteWins),
    field!("external_issue_url", external_issue_url, Strategy::LastWriteWins),
    field!("extensions", extensions, Strategy::LastWriteWins),
    field!(union "labels", labels),
    field!(union "dependencies", dependencies),
    field!("updated_at", updated_at, Strategy::Latest),
    field!("version", version, Strategy::Counter),
];

/// Look up the strategy for a field name. Unknown fields resolve as LWW.
pub fn strategy_for(name: &str) -> Strategy {
    FIELD_TABLE
        .iter()
        .find(|spec| spec.name == name)
        .map(|spec| spec.strategy)
        .unwrap_or(Strategy::LastWriteWins)
}
