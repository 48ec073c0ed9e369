//! Sync worktree commands
//! Usage: trackline worktree [status|init|repair]

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::commands::common::{display_path, print_health, status_label, CommandContext};

/// Show the worktree's health
pub fn status(root: Option<PathBuf>) -> Result<()> {
    let ctx = CommandContext::load(root)?;
    let health = ctx.worktree.health()?;

    println!("Sync worktree:");
    println!("{}", "─".repeat(50).dimmed());
    print_health(&health);

    if health.needs_repair() {
        println!();
        println!(
            "{} run {} to fix",
            "!".yellow().bold(),
            "trackline worktree repair".cyan()
        );
    } else if !health.exists {
        println!();
        println!("Run {} to create it", "trackline worktree init".cyan());
    }
    Ok(())
}

/// Create the worktree if it is missing
pub fn init(root: Option<PathBuf>) -> Result<()> {
    let ctx = CommandContext::load(root)?;
    let health = ctx.worktree.init()?;
    println!(
        "{} Sync worktree ready at {}",
        "✓".green().bold(),
        display_path(&health.path, ctx.worktree.root())
    );
    print_health(&health);
    Ok(())
}

/// Repair a prunable, corrupted, or detached worktree
pub fn repair(root: Option<PathBuf>, dry_run: bool) -> Result<()> {
    let ctx = CommandContext::load(root)?;
    let health = ctx.worktree.health()?;
    let attached = health.branch.as_deref() == Some(ctx.worktree.branch());

    if health.valid && attached {
        println!("{} Sync worktree is healthy", "✓".green().bold());
        return Ok(());
    }

    if dry_run {
        println!(
            "Sync worktree is {}{}; would repair",
            status_label(health.status),
            if health.valid { " (detached HEAD)" } else { "" }
        );
        return Ok(());
    }

    let report = ctx.worktree.repair(health.status)?;
    println!(
        "{} Repaired sync worktree ({} → {})",
        "✓".green().bold(),
        status_label(report.previous),
        status_label(report.health.status)
    );
    if let Some(backup) = &report.backup_path {
        println!(
            "  {} previous contents backed up to {}",
            "→".dimmed(),
            display_path(backup, ctx.worktree.root())
        );
    }
    Ok(())
}
