//! Shared setup for command implementations.
//!
//! Every command works on an explicit repository root. When `--root` is not
//! given, the top level of the git repository containing the current
//! directory is used.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::config::SyncConfig;
use crate::git::runner::{check_git_available, Git};
use crate::git::worktree::WorktreeManager;
use crate::models::{WorktreeHealth, WorktreeStatus};
use crate::workspace::WorkspaceTarget;

/// Repository root, its configuration, and a worktree manager for it
pub struct CommandContext {
    pub root: PathBuf,
    pub config: SyncConfig,
    pub worktree: WorktreeManager,
}

impl CommandContext {
    pub fn load(root: Option<PathBuf>) -> Result<Self> {
        check_git_available()?;
        let root = resolve_root(root)?;
        let config = SyncConfig::load(&root)?;
        let worktree = WorktreeManager::new(&root, &config)?;
        Ok(Self {
            root,
            config,
            worktree,
        })
    }
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(root) = root {
        return Ok(root);
    }
    let cwd = std::env::current_dir()?;
    let toplevel = Git::new(&cwd)
        .checked(&["rev-parse", "--show-toplevel"])
        .context("Not inside a git repository; pass --root")?;
    Ok(PathBuf::from(toplevel))
}

/// Build a workspace target from the mutually exclusive CLI flags
pub fn workspace_target(
    name: Option<String>,
    outbox: bool,
    dir: Option<PathBuf>,
) -> Result<WorkspaceTarget> {
    match (name, outbox, dir) {
        (Some(name), false, None) => Ok(WorkspaceTarget::named(name)),
        (None, true, None) => Ok(WorkspaceTarget::Outbox),
        (None, false, Some(dir)) => Ok(WorkspaceTarget::Dir(dir)),
        _ => anyhow::bail!("Specify exactly one of --name, --outbox, or --dir"),
    }
}

/// Colored status label
pub fn status_label(status: WorktreeStatus) -> colored::ColoredString {
    match status {
        WorktreeStatus::Valid => "valid".green().bold(),
        WorktreeStatus::Missing => "missing".yellow().bold(),
        WorktreeStatus::Prunable => "prunable".yellow().bold(),
        WorktreeStatus::Corrupted => "corrupted".red().bold(),
    }
}

pub fn print_health(health: &WorktreeHealth) {
    println!("  {:<10} {}", "Status:".dimmed(), status_label(health.status));
    println!("  {:<10} {}", "Path:".dimmed(), health.path.display());
    match &health.branch {
        Some(branch) => println!("  {:<10} {}", "Branch:".dimmed(), branch.cyan()),
        None if health.valid => println!("  {:<10} {}", "Branch:".dimmed(), "detached".red()),
        None => {}
    }
    if let Some(commit) = &health.commit {
        println!("  {:<10} {}", "Commit:".dimmed(), short_sha(commit));
    }
}

pub fn short_sha(sha: &str) -> &str {
    sha.get(..8).unwrap_or(sha)
}

pub fn display_path<'a>(path: &'a Path, root: &Path) -> std::path::Display<'a> {
    path.strip_prefix(root).unwrap_or(path).display()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_target_requires_exactly_one() {
        assert_eq!(
            workspace_target(Some("a".into()), false, None).unwrap(),
            WorkspaceTarget::Named("a".into())
        );
        assert_eq!(
            workspace_target(None, true, None).unwrap(),
            WorkspaceTarget::Outbox
        );
        assert!(workspace_target(None, false, None).is_err());
        assert!(workspace_target(Some("a".into()), true, None).is_err());
    }

    #[test]
    fn test_short_sha() {
        assert_eq!(short_sha("0123456789abcdef"), "01234567");
        assert_eq!(short_sha("abc"), "abc");
    }
}
