//! Git branch helpers used by the sync layer
//!
//! - `operations`: current branch and existence checks
//! - `ancestry`: commit resolution and ahead/behind counting

mod ancestry;
mod operations;

pub use ancestry::{ahead_behind, is_ancestor_of, rev_parse};
pub use operations::{branch_exists, current_branch, remote_branch_exists};
