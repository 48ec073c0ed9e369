//! Moving records between the sync worktree and the remote
//!
//! The retry loop only needs two things from a transport: the latest remote
//! state (with its common ancestor) and a way to publish a merged result
//! that may be rejected because the remote moved.

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::git::branch::rev_parse;
use crate::git::records::read_records_at;
use crate::git::worktree::WorktreeManager;
use crate::models::Issue;
use crate::store::IssueStore;

/// Remote state as of the latest fetch
#[derive(Debug, Clone, Default)]
pub struct Fetched {
    /// Records at the common ancestor of local and remote; empty when the
    /// two share no history
    pub base: Vec<Issue>,
    pub remote: Vec<Issue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed,
    /// Non-fast-forward: the remote moved since the fetch
    Rejected,
}

pub trait SyncTransport {
    fn fetch(&mut self) -> Result<Fetched>;

    /// Make `merged` the new remote state
    fn publish(&mut self, merged: &[Issue]) -> Result<PushOutcome>;
}

const DEFAULT_COMMIT_MESSAGE: &str = "trackline: sync records";

/// [`SyncTransport`] over the sync worktree and its git remote
pub struct GitTransport<'a> {
    worktree: &'a WorktreeManager,
    remote_head: Option<String>,
    message: String,
}

impl<'a> GitTransport<'a> {
    pub fn new(worktree: &'a WorktreeManager) -> Self {
        Self {
            worktree,
            remote_head: None,
            message: DEFAULT_COMMIT_MESSAGE.to_string(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    fn local_ref(&self) -> String {
        format!("refs/heads/{}", self.worktree.branch())
    }

    fn remote_ref(&self) -> String {
        format!(
            "refs/remotes/{}/{}",
            self.worktree.remote(),
            self.worktree.branch()
        )
    }

    /// Common ancestor of the local branch and the fetched remote head
    fn merge_base(&self, remote_head: &str) -> Result<Option<String>> {
        let output = self
            .worktree
            .repo_git()
            .run(&["merge-base", &self.local_ref(), remote_head])?;
        if !output.success() {
            return Ok(None);
        }
        Ok(Some(output.stdout.trim().to_string()))
    }

    /// Write records whose on-disk copy differs
    fn write_merged(&self, merged: &[Issue]) -> Result<usize> {
        let store = IssueStore::new(&self.worktree.data_dir());
        let mut written = 0;
        for issue in merged {
            if store.get(&issue.id)?.as_ref() != Some(issue) {
                store.write(issue)?;
                written += 1;
            }
        }
        Ok(written)
    }
}

impl SyncTransport for GitTransport<'_> {
    fn fetch(&mut self) -> Result<Fetched> {
        let repo = self.worktree.repo_git();
        let refspec = format!("+refs/heads/{}:{}", self.worktree.branch(), self.remote_ref());
        let output = repo.run(&["fetch", "-q", self.worktree.remote(), &refspec])?;
        if !output.success() {
            if !is_missing_remote_ref(&output.stderr) {
                bail!("git fetch failed: {}", output.stderr.trim());
            }
            debug!(
                branch = self.worktree.branch(),
                "remote has no sync branch yet"
            );
        }

        self.remote_head = rev_parse(repo, &self.remote_ref())?;
        let Some(remote_head) = self.remote_head.clone() else {
            return Ok(Fetched::default());
        };

        let data_dir = self.worktree.data_dir_name();
        let base = match self.merge_base(&remote_head)? {
            Some(base) => read_records_at(repo, &base, data_dir)?,
            None => Vec::new(),
        };
        let remote = read_records_at(repo, &remote_head, data_dir)?;
        Ok(Fetched { base, remote })
    }

    fn publish(&mut self, merged: &[Issue]) -> Result<PushOutcome> {
        let wt = self.worktree.worktree_git();
        let written = self.write_merged(merged)?;

        // Commit on top of the fetched remote head so the push fast-forwards.
        if let Some(remote_head) = &self.remote_head {
            wt.checked(&["reset", "-q", "--soft", remote_head])
                .context("Failed to move sync branch onto remote head")?;
        }

        let data_dir = self.worktree.data_dir_name().to_string_lossy().to_string();
        wt.checked(&["add", "-A", "--", &data_dir])
            .context("Failed to stage records")?;
        let staged = !wt.ok(&["diff", "--cached", "--quiet"]);
        if staged {
            wt.checked(&["commit", "-q", "-m", &self.message])
                .context("Failed to commit records")?;
        }

        let head = rev_parse(&wt, "HEAD")?;
        if head.is_some() && head == self.remote_head {
            debug!("nothing to push");
            return Ok(PushOutcome::Pushed);
        }

        let output = wt.run(&["push", "-q", "-u", self.worktree.remote(), self.worktree.branch()])?;
        if output.success() {
            info!(records = written, "sync pushed");
            return Ok(PushOutcome::Pushed);
        }
        if is_non_fast_forward(&output.stderr) {
            debug!("push rejected: {}", output.stderr.trim());
            return Ok(PushOutcome::Rejected);
        }
        bail!("git push failed: {}", output.stderr.trim())
    }
}

fn is_missing_remote_ref(stderr: &str) -> bool {
    stderr.contains("couldn't find remote ref")
}

fn is_non_fast_forward(stderr: &str) -> bool {
    ["non-fast-forward", "fetch first", "[rejected]", "stale info"]
        .iter()
        .any(|marker| stderr.contains(marker))
}
