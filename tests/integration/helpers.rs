//! Shared test helpers for sync integration tests

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

use trackline::config::SyncConfig;
use trackline::git::WorktreeManager;
use trackline::models::Issue;
use trackline::store::IssueStore;
use trackline::sync::SyncSession;

/// Run git in `dir`, failing the test on a non-zero exit
pub fn git(args: &[&str], dir: &Path) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Test helper: Create a temporary git repository with initial commit on main
pub fn init_test_repo() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let repo_root = temp_dir.path();

    git(&["init", "-q"], repo_root);
    git(&["symbolic-ref", "HEAD", "refs/heads/main"], repo_root);
    git(&["config", "user.email", "test@test.com"], repo_root);
    git(&["config", "user.name", "Test User"], repo_root);
    git(&["config", "commit.gpgsign", "false"], repo_root);

    fs::write(repo_root.join("README.md"), "# Test Repository\n")
        .expect("Failed to write README.md");
    git(&["add", "."], repo_root);
    git(&["commit", "-q", "-m", "Initial commit"], repo_root);

    temp_dir
}

/// Test helper: Create a bare repository to act as the shared remote
pub fn init_bare_remote() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    git(&["init", "-q", "--bare"], temp_dir.path());
    temp_dir
}

/// One replica: a repository with `origin` pointing at the shared remote
pub struct Replica {
    pub dir: TempDir,
    pub worktree: WorktreeManager,
}

impl Replica {
    pub fn new(remote: &TempDir) -> Self {
        let dir = init_test_repo();
        let url = remote.path().to_string_lossy().to_string();
        git(&["remote", "add", "origin", &url], dir.path());

        let worktree = WorktreeManager::new(dir.path(), &SyncConfig::default())
            .expect("Failed to create worktree manager");
        worktree.init().expect("Failed to init sync worktree");
        Self { dir, worktree }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn store(&self) -> IssueStore {
        IssueStore::new(&self.worktree.data_dir())
    }

    pub fn session(&self) -> SyncSession {
        SyncSession::new(self.root(), SyncConfig::default()).expect("Failed to open session")
    }

    pub fn read(&self, id: &str) -> Issue {
        self.store().read(id).expect("record should exist")
    }

    /// Apply `edit` to a stored record and stamp it `minutes` after creation
    pub fn edit(&self, id: &str, minutes: i64, edit: impl FnOnce(&mut Issue)) {
        let mut issue = self.read(id);
        edit(&mut issue);
        issue.updated_at = issue.created_at + Duration::minutes(minutes);
        self.store().write(&issue).expect("Failed to write record");
    }
}

/// Fixed creation time so timestamps compare predictably
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()
}

pub fn issue(id: &str, title: &str) -> Issue {
    Issue::with_timestamp(id, title, t0())
}
