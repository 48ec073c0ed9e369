//! Legacy data migration
//! Usage: trackline migrate [--remove-source]

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::commands::common::{display_path, CommandContext};

pub fn execute(root: Option<PathBuf>, remove_source: bool) -> Result<()> {
    let ctx = CommandContext::load(root)?;
    ctx.worktree.ensure_healthy(false)?;

    let report = ctx.worktree.migrate_data_to_worktree(remove_source)?;
    if !report.migrated() {
        println!("Nothing to migrate");
        return Ok(());
    }

    println!(
        "{} Migrated {} records and {} mappings into the sync worktree",
        "✓".green().bold(),
        report.issues_migrated,
        report.mappings_migrated
    );
    if let Some(backup) = &report.backup_path {
        println!(
            "  {} backup at {}",
            "→".dimmed(),
            display_path(backup, ctx.worktree.root())
        );
    }
    if report.sources_removed > 0 {
        println!(
            "  {} removed {} legacy files",
            "→".dimmed(),
            report.sources_removed
        );
    }
    Ok(())
}
