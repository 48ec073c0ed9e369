//! Workspace commands
//! Usage: trackline save|import|attic

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::commands::common::CommandContext;
use crate::git::records::read_records_at;
use crate::workspace::{SaveFilter, TransferReport, WorkspaceManager, WorkspaceTarget};

/// Save the worktree's records into a workspace.
///
/// With `updates_only`, only records that differ from the remote-tracking
/// sync branch are saved.
pub fn save(root: Option<PathBuf>, target: WorkspaceTarget, updates_only: bool) -> Result<()> {
    let ctx = CommandContext::load(root)?;
    let workspaces = WorkspaceManager::new(ctx.worktree.root(), &ctx.config);

    let filter = if updates_only {
        let remote = read_records_at(
            ctx.worktree.repo_git(),
            &format!("refs/remotes/{}", ctx.config.remote_ref()),
            ctx.worktree.data_dir_name(),
        )?;
        SaveFilter::UpdatesOnly { remote }
    } else {
        SaveFilter::All
    };

    let report = workspaces.save(&ctx.worktree.data_dir(), &target, &filter)?;
    println!("{} Saved to workspace {}", "✓".green().bold(), target.to_string().cyan());
    print_transfer(&report);
    Ok(())
}

/// Merge a workspace's records into the worktree
pub fn import(root: Option<PathBuf>, target: WorkspaceTarget, clear: bool) -> Result<()> {
    let ctx = CommandContext::load(root)?;
    ctx.worktree.ensure_healthy(false)?;
    let workspaces = WorkspaceManager::new(ctx.worktree.root(), &ctx.config);

    let report = workspaces.import(&ctx.worktree.data_dir(), &target, clear)?;
    println!(
        "{} Imported workspace {}",
        "✓".green().bold(),
        target.to_string().cyan()
    );
    print_transfer(&report);
    if report.cleared {
        println!("  {} workspace removed", "→".dimmed());
    }
    Ok(())
}

/// List the conflict records in a workspace's attic
pub fn attic(root: Option<PathBuf>, target: WorkspaceTarget) -> Result<()> {
    let ctx = CommandContext::load(root)?;
    let workspaces = WorkspaceManager::new(ctx.worktree.root(), &ctx.config);
    let records = workspaces.attic(&target)?.list()?;

    if records.is_empty() {
        println!("No conflicts recorded in {}", target.to_string().cyan());
        return Ok(());
    }

    println!("Attic of {} ({} entries):", target.to_string().cyan(), records.len());
    println!("{}", "─".repeat(50).dimmed());
    for record in &records {
        println!(
            "{} {} {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            record.issue_id.bold(),
            record.field.yellow()
        );
        println!("    lost: {}", record.lost_value.to_string().red());
        println!("    kept: {}", record.winner_value.to_string().green());
    }
    Ok(())
}

fn print_transfer(report: &TransferReport) {
    println!(
        "  {} written, {} unchanged, {} filtered, {} mappings added",
        report.written, report.unchanged, report.filtered, report.mappings_added
    );
    if !report.conflicts.is_empty() {
        println!(
            "  {} {} conflicts recorded in the attic",
            "!".yellow().bold(),
            report.conflicts.len()
        );
    }
}
