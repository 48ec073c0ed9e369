//! Sync consistency checks
//!
//! Compares the worktree HEAD with the local sync branch and the
//! remote-tracking branch. Any disagreement between the worktree and the
//! local branch is a defect for the worktree manager to repair; sync does
//! not try to merge around it.

use anyhow::{Context, Result};
use std::path::Path;

use crate::models::SyncConsistency;

use super::branch::{ahead_behind, current_branch, rev_parse};
use super::runner::Git;
use super::worktree::WorktreeManager;

/// Report where the worktree, the local branch, and `<remote>/<branch>` stand.
///
/// A missing remote-tracking branch counts every local commit as ahead.
pub fn check_sync_consistency(
    repo: &Git,
    worktree: &Path,
    branch: &str,
    remote: &str,
) -> Result<SyncConsistency> {
    let (worktree_head, worktree_branch) = if worktree.is_dir() {
        let wt = repo.at(worktree);
        (rev_parse(&wt, "HEAD")?, current_branch(&wt)?)
    } else {
        (None, None)
    };

    let local_ref = format!("refs/heads/{branch}");
    let remote_ref = format!("refs/remotes/{remote}/{branch}");
    let local_head = rev_parse(repo, &local_ref)?;
    let remote_head = rev_parse(repo, &remote_ref)?;

    let (local_ahead, local_behind) = match (&local_head, &remote_head) {
        (Some(_), Some(_)) => ahead_behind(repo, &local_ref, &remote_ref)?,
        (Some(_), None) => {
            let count = repo.checked(&["rev-list", "--count", &local_ref])?;
            let ahead = count
                .parse()
                .with_context(|| format!("invalid rev-list count '{count}'"))?;
            (ahead, 0)
        }
        _ => (0, 0),
    };

    let worktree_matches_local = worktree_head.is_some() && worktree_head == local_head;

    Ok(SyncConsistency {
        worktree_head,
        local_head,
        worktree_branch,
        local_ahead,
        local_behind,
        worktree_matches_local,
    })
}

impl WorktreeManager {
    /// [`check_sync_consistency`] for this manager's worktree
    pub fn check_consistency(&self) -> Result<SyncConsistency> {
        check_sync_consistency(self.repo_git(), self.path(), self.branch(), self.remote())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::git::test_support::{add_bare_remote, init_test_repo};

    fn setup() -> (tempfile::TempDir, WorktreeManager) {
        let (temp, _git) = init_test_repo();
        let manager = WorktreeManager::new(temp.path(), &SyncConfig::default()).unwrap();
        manager.init().unwrap();
        (temp, manager)
    }

    #[test]
    fn test_fresh_worktree_is_consistent() {
        let (_temp, manager) = setup();
        let report = manager.check_consistency().unwrap();

        assert!(report.worktree_matches_local);
        assert_eq!(report.worktree_branch.as_deref(), Some("trackline-sync"));
        assert_eq!(report.local_ahead, 1);
        assert_eq!(report.local_behind, 0);
        assert_eq!(report.defect("trackline-sync"), None);
    }

    #[test]
    fn test_detached_head_is_a_defect() {
        let (_temp, manager) = setup();
        manager
            .worktree_git()
            .checked(&["checkout", "-q", "--detach"])
            .unwrap();

        let report = manager.check_consistency().unwrap();
        assert_eq!(report.worktree_branch, None);
        assert!(report.defect("trackline-sync").is_some());
    }

    #[test]
    fn test_counts_against_remote_tracking_branch() {
        let (_temp, manager) = setup();
        let _remote = add_bare_remote(manager.repo_git());
        let wt = manager.worktree_git();
        wt.checked(&["push", "-q", "-u", "origin", "trackline-sync"])
            .unwrap();
        wt.checked(&["commit", "-q", "--allow-empty", "-m", "local only"])
            .unwrap();

        let report = manager.check_consistency().unwrap();
        assert_eq!((report.local_ahead, report.local_behind), (1, 0));
        assert!(!report.is_diverged());
    }

    #[test]
    fn test_missing_worktree_does_not_match() {
        let (temp, _git) = init_test_repo();
        let manager = WorktreeManager::new(temp.path(), &SyncConfig::default()).unwrap();
        let report = manager.check_consistency().unwrap();
        assert!(!report.worktree_matches_local);
        assert_eq!(report.local_head, None);
    }
}
