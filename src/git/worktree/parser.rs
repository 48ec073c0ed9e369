//! Worktree output parsing
//!
//! Parses `git worktree list --porcelain` output into structured data.

use std::path::PathBuf;

/// Parsed worktree information from git worktree list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorktreeInfo {
    pub path: PathBuf,
    pub head: String,
    pub branch: Option<String>,
    pub is_bare: bool,
    pub detached: bool,
    /// Lock reason (empty string when locked without a reason)
    pub locked: Option<String>,
    /// Set when git considers the registration stale
    pub prunable: Option<String>,
}

/// Parse git worktree list --porcelain output
///
/// Example input:
/// ```text
/// worktree /home/user/repo
/// HEAD abc123def456
/// branch refs/heads/main
///
/// worktree /home/user/repo/.worktrees/trackline-sync
/// HEAD def789abc012
/// branch refs/heads/trackline-sync
/// prunable gitdir file points to non-existent location
/// ```
pub fn parse_worktree_list(output: &str) -> Vec<WorktreeInfo> {
    let mut worktrees = Vec::new();
    let mut current: Option<WorktreeInfo> = None;

    for line in output.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            if let Some(wt) = current.take() {
                worktrees.push(wt);
            }
            current = Some(WorktreeInfo {
                path: PathBuf::from(path),
                ..WorktreeInfo::default()
            });
            continue;
        }

        let Some(wt) = current.as_mut() else {
            continue;
        };

        if let Some(head) = line.strip_prefix("HEAD ") {
            wt.head = head.to_string();
        } else if let Some(branch_line) = line.strip_prefix("branch ") {
            let branch_name = branch_line
                .strip_prefix("refs/heads/")
                .unwrap_or(branch_line);
            wt.branch = Some(branch_name.to_string());
        } else if line == "bare" {
            wt.is_bare = true;
        } else if line == "detached" {
            wt.detached = true;
        } else if line == "locked" || line.starts_with("locked ") {
            wt.locked = Some(line.trim_start_matches("locked").trim().to_string());
        } else if line == "prunable" || line.starts_with("prunable ") {
            wt.prunable = Some(line.trim_start_matches("prunable").trim().to_string());
        }
    }

    if let Some(wt) = current {
        worktrees.push(wt);
    }

    worktrees
}
