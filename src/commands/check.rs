//! Consistency check
//! Usage: trackline check

use anyhow::{bail, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::commands::common::{print_health, short_sha, CommandContext};

/// Report worktree health, HEAD agreement, and ahead/behind counts.
///
/// Exits with an error when a defect needs repair.
pub fn execute(root: Option<PathBuf>) -> Result<()> {
    let ctx = CommandContext::load(root)?;
    let health = ctx.worktree.health()?;

    println!("Sync worktree:");
    println!("{}", "─".repeat(50).dimmed());
    print_health(&health);

    let consistency = ctx.worktree.check_consistency()?;
    let sha = |s: &Option<String>| s.as_deref().map(short_sha).unwrap_or("-").to_string();
    println!();
    println!("Branch {}:", ctx.worktree.branch().cyan());
    println!("  {:<16} {}", "Worktree HEAD:".dimmed(), sha(&consistency.worktree_head));
    println!("  {:<16} {}", "Local branch:".dimmed(), sha(&consistency.local_head));
    println!(
        "  {:<16} {} ahead, {} behind {}",
        "Remote:".dimmed(),
        consistency.local_ahead,
        consistency.local_behind,
        ctx.config.remote_ref()
    );

    let misplaced = health.valid && ctx.worktree.has_misplaced_data()?;
    if misplaced {
        println!();
        println!(
            "{} records found outside the worktree; run {}",
            "!".yellow().bold(),
            "trackline migrate".cyan()
        );
    }

    println!();
    if !health.valid {
        bail!("sync worktree is {}; run `trackline worktree repair`", health.status);
    }
    match consistency.defect(ctx.worktree.branch()) {
        Some(defect) => bail!("{defect}; run `trackline worktree repair`"),
        None => {
            println!("{} Consistent", "✓".green().bold());
            Ok(())
        }
    }
}
