//! Workspaces against a live sync worktree

use trackline::config::SyncConfig;
use trackline::store::{IdMapping, MappingStore};
use trackline::workspace::{SaveFilter, WorkspaceError, WorkspaceManager, WorkspaceTarget};

use super::helpers::*;

fn workspaces(replica: &Replica) -> WorkspaceManager {
    WorkspaceManager::new(replica.root(), &SyncConfig::default())
}

#[test]
fn test_snapshot_of_worktree_saves_twice_without_conflicts() {
    let remote = init_bare_remote();
    let a = Replica::new(&remote);
    for n in 0..3 {
        a.store().write(&issue(&format!("tl-{n}"), "Snapshot me")).unwrap();
    }
    MappingStore::new(&a.worktree.data_dir())
        .save(&IdMapping::new("1", "tl-1"))
        .unwrap();

    let manager = workspaces(&a);
    let target = WorkspaceTarget::named("before-release");
    let data_dir = a.worktree.data_dir();

    let first = manager.save(&data_dir, &target, &SaveFilter::All).unwrap();
    assert_eq!(first.written, 3);
    assert_eq!(first.mappings_added, 1);

    let second = manager.save(&data_dir, &target, &SaveFilter::All).unwrap();
    assert!(second.conflicts.is_empty());
    assert_eq!(second.unchanged, 3);
    assert!(manager
        .records(&target)
        .unwrap()
        .iter()
        .all(|i| i.version == 1));
    assert_eq!(manager.list().unwrap(), vec!["before-release"]);
}

#[test]
fn test_restore_snapshot_then_sync_publishes_it() {
    let remote = init_bare_remote();
    let a = Replica::new(&remote);
    let b = Replica::new(&remote);

    a.store().write(&issue("tl-1", "Kept")).unwrap();
    let manager = workspaces(&a);
    let target = WorkspaceTarget::named("stash");
    manager
        .save(&a.worktree.data_dir(), &target, &SaveFilter::All)
        .unwrap();

    a.store().remove("tl-1").unwrap();
    assert!(a.store().ids().unwrap().is_empty());

    let report = manager.import(&a.worktree.data_dir(), &target, true).unwrap();
    assert_eq!(report.written, 1);
    assert!(report.cleared);
    assert!(!manager.exists(&target).unwrap());
    assert!(manager.list().unwrap().is_empty());

    a.session().run(false).unwrap();
    b.session().run(false).unwrap();
    assert_eq!(b.read("tl-1").title, "Kept");
}

#[test]
fn test_import_applies_snapshot_edits_over_live_copy() {
    let remote = init_bare_remote();
    let a = Replica::new(&remote);
    a.store().write(&issue("tl-1", "Title")).unwrap();

    let manager = workspaces(&a);
    let target = WorkspaceTarget::named("draft");
    manager
        .save(&a.worktree.data_dir(), &target, &SaveFilter::All)
        .unwrap();

    // Edit the snapshot copy's description, and the live copy's title.
    let snapshot_dir = manager.path(&target).unwrap();
    let snapshot = trackline::store::IssueStore::new(&snapshot_dir);
    let mut draft = snapshot.read("tl-1").unwrap();
    draft.description = "Written in the draft".to_string();
    draft.updated_at = draft.created_at + chrono::Duration::minutes(5);
    snapshot.write(&draft).unwrap();

    a.edit("tl-1", 1, |i| i.title = "Live title".to_string());

    manager.import(&a.worktree.data_dir(), &target, false).unwrap();
    let merged = a.read("tl-1");
    assert_eq!(merged.description, "Written in the draft");
    assert_eq!(merged.title, "Title");
}

#[test]
fn test_import_of_unknown_workspace_fails() {
    let remote = init_bare_remote();
    let a = Replica::new(&remote);
    let err = workspaces(&a)
        .import(&a.worktree.data_dir(), &WorkspaceTarget::named("nope"), false)
        .unwrap_err();
    assert!(matches!(err, WorkspaceError::NotFound(_)));
}
