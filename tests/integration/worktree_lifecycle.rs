//! Sync worktree damage and repair against a real repository

use std::fs;

use trackline::config::SyncConfig;
use trackline::git::{list_worktrees, Git, WorktreeManager};
use trackline::models::{ConsistencyDefect, WorktreeStatus};
use trackline::store::IssueStore;

use super::helpers::*;

fn manager(repo: &tempfile::TempDir) -> WorktreeManager {
    WorktreeManager::new(repo.path(), &SyncConfig::default()).unwrap()
}

#[test]
fn test_init_creates_attached_worktree_with_data_dirs() {
    let repo = init_test_repo();
    let wt = manager(&repo);

    let health = wt.init().unwrap();
    assert_eq!(health.status, WorktreeStatus::Valid);
    assert!(health.is_attached());
    assert_eq!(health.branch.as_deref(), Some("trackline-sync"));
    assert!(wt.data_dir().join("issues").is_dir());
    assert!(wt.data_dir().join("mappings").is_dir());

    // User content never reaches the sync branch.
    assert!(!wt.path().join("README.md").exists());

    let registered = list_worktrees(&Git::new(repo.path())).unwrap();
    assert!(registered
        .iter()
        .any(|info| info.branch.as_deref() == Some("trackline-sync")));
}

#[test]
fn test_deleted_directory_is_prunable_and_repaired() {
    let repo = init_test_repo();
    let wt = manager(&repo);
    wt.init().unwrap();
    let branch_head = wt.health().unwrap().commit;

    fs::remove_dir_all(wt.path()).unwrap();
    assert_eq!(wt.health().unwrap().status, WorktreeStatus::Prunable);

    let report = wt.repair(WorktreeStatus::Prunable).unwrap();
    assert_eq!(report.previous, WorktreeStatus::Prunable);
    assert_eq!(report.health.status, WorktreeStatus::Valid);
    assert_eq!(report.health.commit, branch_head);
    assert!(report.backup_path.is_none());
}

#[test]
fn test_corrupted_worktree_is_backed_up_before_rebuild() {
    let repo = init_test_repo();
    let wt = manager(&repo);
    wt.init().unwrap();
    IssueStore::new(&wt.data_dir())
        .write(&issue("tl-1", "Unsynced"))
        .unwrap();

    fs::write(wt.path().join(".git"), "not a gitdir link\n").unwrap();
    assert_eq!(wt.health().unwrap().status, WorktreeStatus::Corrupted);

    let health = wt.ensure_healthy(false).unwrap();
    assert_eq!(health.status, WorktreeStatus::Valid);

    let backups: Vec<_> = fs::read_dir(wt.backups_dir())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(backups.len(), 1);
    assert!(backups[0]
        .join(".trackline/issues/tl-1.json")
        .is_file());
    assert!(!backups[0].join(".git").exists());
}

#[test]
fn test_detached_head_is_reported_then_reattached_by_sync() {
    let remote = init_bare_remote();
    let a = Replica::new(&remote);
    let wt_path = a.worktree.path().to_path_buf();

    git(&["checkout", "-q", "--detach"], &wt_path);
    a.store().write(&issue("tl-1", "Made while detached")).unwrap();
    git(&["add", "-A"], &wt_path);
    git(&["commit", "-q", "-m", "detached edit"], &wt_path);

    let consistency = a.worktree.check_consistency().unwrap();
    assert!(matches!(
        consistency.defect("trackline-sync"),
        Some(ConsistencyDefect::DetachedHead { .. })
    ));

    let report = a.session().run(false).unwrap();
    assert!(report.health.is_attached());
    assert!(a
        .worktree
        .check_consistency()
        .unwrap()
        .defect("trackline-sync")
        .is_none());

    // The detached commit was kept on the branch and published.
    let b = Replica::new(&remote);
    b.session().run(false).unwrap();
    assert_eq!(b.read("tl-1").title, "Made while detached");
}

#[test]
fn test_dry_run_check_leaves_missing_worktree_alone() {
    let repo = init_test_repo();
    let wt = manager(&repo);
    assert_eq!(wt.health().unwrap().status, WorktreeStatus::Missing);

    assert!(wt.ensure_healthy(true).is_err());
    assert!(!wt.path().exists());
    assert_eq!(wt.health().unwrap().status, WorktreeStatus::Missing);
}
