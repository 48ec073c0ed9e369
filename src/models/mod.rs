pub mod conflict;
pub mod issue;
pub mod worktree;

pub use conflict::{ConflictRecord, Resolution, WHOLE_ISSUE_FIELD};
pub use issue::{Dependency, DependencyType, Issue, IssueStatus, IssueType};
pub use worktree::{ConsistencyDefect, SyncConsistency, WorktreeHealth, WorktreeStatus};
