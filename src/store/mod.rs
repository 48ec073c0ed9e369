//! File-backed record storage
//!
//! This module provides:
//! - Atomic replace-on-write for single files
//! - The issue record store (`issues/<id>.json`)
//! - The short-id mapping store (`mappings/<short>.json`)

pub mod atomic;
mod error;
mod issues;
mod mappings;

pub use atomic::{write_atomic, write_json_atomic, write_new_atomic};
pub use error::StoreError;
pub use issues::{IssueStore, ISSUES_DIR};
pub(crate) use issues::read_json;
pub use mappings::{IdMapping, MappingStore, MAPPINGS_DIR};
