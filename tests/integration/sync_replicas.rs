//! Two replicas syncing through a shared bare remote

use trackline::store::IssueStore;
use trackline::models::Issue;
use trackline::sync::{
    sync_with_retry, Fetched, GitTransport, PushOutcome, SyncError, SyncTransport, SYNC_WORKSPACE,
};
use trackline::workspace::{WorkspaceManager, WorkspaceTarget};
use trackline::config::SyncConfig;
use trackline::git::WorktreeError;

use super::helpers::*;

#[test]
fn test_first_sync_publishes_and_second_replica_receives() {
    let remote = init_bare_remote();
    let a = Replica::new(&remote);
    let b = Replica::new(&remote);

    a.store().write(&issue("tl-1", "Shared")).unwrap();
    let report = a.session().run(false).unwrap();
    assert_eq!(report.outcome.updated.len(), 1);
    assert_eq!(report.outcome.attempts, 1);

    // B has unrelated sync history (its own orphan root) and still merges.
    let report = b.session().run(false).unwrap();
    assert!(report.outcome.conflicts.is_empty());
    assert_eq!(b.read("tl-1").title, "Shared");
}

#[test]
fn test_disjoint_field_edits_merge_without_conflict() {
    let remote = init_bare_remote();
    let a = Replica::new(&remote);
    let b = Replica::new(&remote);

    a.store().write(&issue("tl-1", "Original")).unwrap();
    a.session().run(false).unwrap();
    b.session().run(false).unwrap();

    b.edit("tl-1", 10, |i| i.title = "Renamed by B".to_string());
    b.session().run(false).unwrap();

    a.edit("tl-1", 5, |i| {
        i.labels.insert("from-a".to_string());
    });
    let report = a.session().run(false).unwrap();
    assert!(report.outcome.conflicts.is_empty());

    let merged = a.read("tl-1");
    assert_eq!(merged.title, "Renamed by B");
    assert!(merged.labels.contains("from-a"));
    assert_eq!(merged.updated_at, merged.created_at + chrono::Duration::minutes(10));

    b.session().run(false).unwrap();
    assert_eq!(b.read("tl-1"), merged);
}

#[test]
fn test_concurrent_title_edits_record_conflict_in_attic() {
    let remote = init_bare_remote();
    let a = Replica::new(&remote);
    let b = Replica::new(&remote);

    a.store().write(&issue("tl-1", "Original")).unwrap();
    a.session().run(false).unwrap();
    b.session().run(false).unwrap();

    b.edit("tl-1", 20, |i| i.title = "Later edit".to_string());
    b.session().run(false).unwrap();

    a.edit("tl-1", 10, |i| i.title = "Earlier edit".to_string());
    let session = a.session();
    let report = session.run(false).unwrap();

    assert_eq!(a.read("tl-1").title, "Later edit");
    assert_eq!(report.outcome.conflicts.len(), 1);
    assert_eq!(report.conflicts_recorded, 1);

    let attic = session
        .workspaces()
        .attic(&WorkspaceTarget::named(SYNC_WORKSPACE))
        .unwrap()
        .list()
        .unwrap();
    assert_eq!(attic.len(), 1);
    assert_eq!(attic[0].field, "title");
    assert_eq!(attic[0].lost_value, serde_json::json!("Earlier edit"));
}

#[test]
fn test_push_rejected_when_remote_moves_after_fetch() {
    let remote = init_bare_remote();
    let a = Replica::new(&remote);
    let b = Replica::new(&remote);

    a.store().write(&issue("tl-1", "First")).unwrap();
    a.session().run(false).unwrap();

    // A fetches, then B pushes before A publishes.
    let mut transport = GitTransport::new(&a.worktree);
    let fetched = transport.fetch().unwrap();
    assert_eq!(fetched.remote.len(), 1);

    b.store().write(&issue("tl-2", "From B")).unwrap();
    b.session().run(false).unwrap();

    let mut merged = fetched.remote.clone();
    merged.push(issue("tl-3", "From A"));
    let outcome = transport.publish(&merged).unwrap();
    assert_eq!(outcome, PushOutcome::Rejected);

    // A full sync re-fetches and succeeds.
    let report = a.session().run(false).unwrap();
    assert_eq!(report.outcome.attempts, 1);
    let ids = a.store().ids().unwrap();
    assert_eq!(ids, vec!["tl-1", "tl-2", "tl-3"]);
}

/// Git transport that lets another replica push right before the first publish
struct RacedTransport<'a, F: FnMut()> {
    inner: GitTransport<'a>,
    race: Option<F>,
}

impl<F: FnMut()> SyncTransport for RacedTransport<'_, F> {
    fn fetch(&mut self) -> anyhow::Result<Fetched> {
        self.inner.fetch()
    }

    fn publish(&mut self, merged: &[Issue]) -> anyhow::Result<PushOutcome> {
        if let Some(mut race) = self.race.take() {
            race();
        }
        self.inner.publish(merged)
    }
}

#[test]
fn test_retry_after_rejection_keeps_remote_edit() {
    let remote = init_bare_remote();
    let a = Replica::new(&remote);
    let b = Replica::new(&remote);

    a.store().write(&issue("tl-1", "Original")).unwrap();
    a.session().run(false).unwrap();
    b.session().run(false).unwrap();

    b.edit("tl-1", 10, |i| i.title = "Renamed by B".to_string());
    b.session().run(false).unwrap();

    a.store().write(&issue("tl-3", "From A")).unwrap();
    let local = a.store().list().unwrap();

    let mut transport = RacedTransport {
        inner: GitTransport::new(&a.worktree),
        race: Some(|| {
            b.store().write(&issue("tl-2", "From B")).unwrap();
            b.session().run(false).unwrap();
        }),
    };
    let outcome = sync_with_retry(&mut transport, &local, 3).unwrap();

    assert_eq!(outcome.attempts, 2);
    assert!(outcome.conflicts.is_empty());
    assert_eq!(a.read("tl-1").title, "Renamed by B");
    assert_eq!(a.store().ids().unwrap(), vec!["tl-1", "tl-2", "tl-3"]);

    b.session().run(false).unwrap();
    assert_eq!(b.read("tl-1").title, "Renamed by B");
    assert_eq!(b.store().ids().unwrap(), vec!["tl-1", "tl-2", "tl-3"]);
}

#[test]
fn test_bookkeeping_only_changes_are_not_updates() {
    let remote = init_bare_remote();
    let a = Replica::new(&remote);

    for n in 0..50 {
        a.store().write(&issue(&format!("tl-{n:02}"), "Same")).unwrap();
    }
    a.session().run(false).unwrap();

    for n in 0..50 {
        a.edit(&format!("tl-{n:02}"), 30, |i| i.version += 1);
    }
    let report = a.session().run(true).unwrap();
    assert!(report.outcome.updated.is_empty());
    assert_eq!(report.pending, 0);
}

#[test]
fn test_dry_run_never_creates_or_repairs_worktree() {
    let remote = init_bare_remote();
    let a = Replica::new(&remote);
    a.worktree.remove().unwrap();

    let err = a.session().run(true).unwrap_err();
    assert!(matches!(
        err,
        SyncError::Worktree(WorktreeError::RepairRefused { .. })
    ));
    assert!(!a.worktree.path().exists());

    a.session().run(false).unwrap();
    assert!(a.worktree.health().unwrap().is_attached());
}

#[test]
fn test_sync_migrates_legacy_records_and_drains_outbox() {
    let remote = init_bare_remote();
    let a = Replica::new(&remote);
    let legacy = SyncConfig::default().root_data_dir(a.root());
    IssueStore::new(&legacy)
        .write(&issue("tl-legacy", "Old location"))
        .unwrap();

    let workspaces = WorkspaceManager::new(a.root(), &SyncConfig::default());
    let outbox = workspaces.path(&WorkspaceTarget::Outbox).unwrap();
    IssueStore::new(&outbox)
        .write(&issue("tl-pending", "Left from a failed run"))
        .unwrap();

    let report = a.session().run(false).unwrap();
    assert_eq!(report.migration.unwrap().issues_migrated, 1);
    assert_eq!(report.outbox_drained, 1);
    assert_eq!(a.store().ids().unwrap(), vec!["tl-legacy", "tl-pending"]);
    assert!(workspaces.records(&WorkspaceTarget::Outbox).unwrap().is_empty());
    assert_eq!(IssueStore::new(&legacy).count().unwrap(), 0);
}
