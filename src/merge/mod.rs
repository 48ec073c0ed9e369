//! Field-level three-way merge for issue records
//!
//! - `strategy`: the declarative field table (field -> rule)
//! - `engine`: the generic interpreter that merges two records
//! - `sets`: per-id merging across whole replica snapshots

mod engine;
mod sets;
pub mod strategy;


pub use engine::{merge, MergeOutcome};
pub use sets::{merge_sets, SetMergeOutcome};
pub use strategy::{strategy_for, Strategy, FIELD_TABLE};
