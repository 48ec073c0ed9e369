//! Sync command
//! Usage: trackline sync [--dry-run]

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::commands::common::CommandContext;
use crate::sync::{SyncSession, SYNC_WORKSPACE};

pub fn execute(root: Option<PathBuf>, dry_run: bool) -> Result<()> {
    let ctx = CommandContext::load(root)?;
    let session = SyncSession::new(ctx.worktree.root(), ctx.config)?;
    let report = session.run(dry_run)?;

    if let Some(migration) = &report.migration {
        if migration.migrated() {
            println!(
                "{} migrated {} legacy records into the worktree",
                "→".dimmed(),
                migration.issues_migrated
            );
        }
    }
    if report.outbox_drained > 0 {
        println!(
            "{} recovered {} records from the outbox",
            "→".dimmed(),
            report.outbox_drained
        );
    }

    let outcome = &report.outcome;
    if dry_run {
        println!("{}", "Dry run: nothing written or pushed".yellow());
        println!(
            "  would push {} updated records ({} local changes pending)",
            outcome.updated.len(),
            report.pending
        );
    } else {
        println!(
            "{} Synced {} records ({} updated, {} attempt{})",
            "✓".green().bold(),
            outcome.merged.len(),
            outcome.updated.len(),
            outcome.attempts,
            if outcome.attempts == 1 { "" } else { "s" }
        );
    }

    if !outcome.conflicts.is_empty() {
        println!(
            "  {} {} conflicts resolved; see {}",
            "!".yellow().bold(),
            outcome.conflicts.len(),
            format!("trackline attic --name {SYNC_WORKSPACE}").cyan()
        );
    }
    Ok(())
}
