//! Throwaway git repositories for unit tests

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use super::runner::Git;

/// Repository on branch `main` with one commit containing `README.md`
pub fn init_test_repo() -> (TempDir, Git) {
    let temp = TempDir::new().expect("create temp dir");
    let git = Git::new(temp.path());

    git.checked(&["init", "-q"]).expect("git init");
    git.checked(&["symbolic-ref", "HEAD", "refs/heads/main"])
        .expect("set initial branch");
    configure_identity(&git);

    commit_file(&git, temp.path(), "README.md", "# test\n");
    (temp, git)
}

/// Bare repository registered as `origin` of `git`
pub fn add_bare_remote(git: &Git) -> TempDir {
    let remote = TempDir::new().expect("create temp dir");
    Git::new(remote.path())
        .checked(&["init", "-q", "--bare"])
        .expect("git init --bare");
    let url = remote.path().to_string_lossy().to_string();
    git.checked(&["remote", "add", "origin", &url])
        .expect("git remote add");
    remote
}

/// Second clone of `remote`, as another replica would have
pub fn clone_repo(remote: &Path) -> (TempDir, Git) {
    let temp = TempDir::new().expect("create temp dir");
    let url = remote.to_string_lossy().to_string();
    let dest = temp.path().to_string_lossy().to_string();
    Git::new(temp.path())
        .checked(&["clone", "-q", &url, &dest])
        .expect("git clone");
    let git = Git::new(temp.path());
    configure_identity(&git);
    (temp, git)
}

pub fn commit_file(git: &Git, dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).expect("write file");
    git.checked(&["add", name]).expect("git add");
    git.checked(&["commit", "-q", "-m", &format!("add {name}")])
        .expect("git commit");
}

fn configure_identity(git: &Git) {
    git.checked(&["config", "user.email", "test@example.com"])
        .expect("set email");
    git.checked(&["config", "user.name", "Test"]).expect("set name");
    git.checked(&["config", "commit.gpgsign", "false"])
        .expect("disable signing");
}
