//! Pre-repair backups
//!
//! Anything destructive (corrupted-worktree repair, migration that removes
//! its source) copies the affected files here first.

use chrono::Utc;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use super::error::WorktreeError;
use super::manager::WorktreeManager;

impl WorktreeManager {
    /// Copy `source` into a fresh `backups/<kind>-<timestamp>` directory.
    ///
    /// A top-level `.git` entry is skipped: it is worktree metadata, not data,
    /// and the broken link is what the repair replaces.
    pub fn backup(&self, kind: &str, source: &Path) -> Result<PathBuf, WorktreeError> {
        let dest = unique_backup_dir(&self.backups_dir(), kind)?;
        copy_tree(source, &dest, true).map_err(|e| WorktreeError::io(source, e))?;
        info!(
            source = %source.display(),
            backup = %dest.display(),
            "backup created"
        );
        Ok(dest)
    }

    /// Like [`backup`](Self::backup), but only the named children of `base`
    /// that exist are copied.
    pub fn backup_entries(
        &self,
        kind: &str,
        base: &Path,
        names: &[&str],
    ) -> Result<PathBuf, WorktreeError> {
        let dest = unique_backup_dir(&self.backups_dir(), kind)?;
        for name in names {
            let source = base.join(name);
            if source.is_dir() {
                copy_tree(&source, &dest.join(name), false)
                    .map_err(|e| WorktreeError::io(&source, e))?;
            }
        }
        info!(
            source = %base.display(),
            backup = %dest.display(),
            "backup created"
        );
        Ok(dest)
    }
}

fn unique_backup_dir(backups: &Path, kind: &str) -> Result<PathBuf, WorktreeError> {
    fs::create_dir_all(backups).map_err(|e| WorktreeError::io(backups, e))?;
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.6fZ");

    let mut candidate = backups.join(format!("{kind}-{stamp}"));
    let mut n = 1;
    loop {
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                candidate = backups.join(format!("{kind}-{stamp}-{n}"));
                n += 1;
            }
            Err(e) => return Err(WorktreeError::io(&candidate, e)),
        }
    }
}

/// Recursive copy. Symlinks are copied as the files they point at.
pub(crate) fn copy_tree(source: &Path, dest: &Path, skip_git: bool) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        if skip_git && entry.file_name() == ".git" {
            continue;
        }
        let from = entry.path();
        let to = dest.join(entry.file_name());
        if from.is_dir() {
            copy_tree(&from, &to, false)?;
        } else {
            fs::copy(&from, &to)?;
        }
    }
    Ok(())
}
