//! Sync configuration
//!
//! Read from `<root>/.trackline.toml`. Every field has a default, so a
//! missing file or a partial file is fine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = ".trackline.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Branch holding the sync data, isolated from user content
    pub branch: String,
    /// Remote that sync pushes to and fetches from
    pub remote: String,
    /// Data directory name, relative to the repo root and to the worktree
    pub data_dir: PathBuf,
    /// Sync worktree location, relative to the repo root
    pub worktree_dir: PathBuf,
    /// Upper bound for any single git invocation
    pub git_timeout_secs: u64,
    /// Push attempts after the first rejected one
    pub max_push_retries: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            branch: "trackline-sync".to_string(),
            remote: "origin".to_string(),
            data_dir: PathBuf::from(".trackline"),
            worktree_dir: PathBuf::from(".worktrees").join("trackline-sync"),
            git_timeout_secs: 30,
            max_push_retries: 5,
        }
    }
}

impl SyncConfig {
    /// Load `<root>/.trackline.toml`, falling back to defaults when absent
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&config_content).context("Failed to parse .trackline.toml")
    }

    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_secs)
    }

    /// Absolute path of the sync worktree
    pub fn worktree_path(&self, root: &Path) -> PathBuf {
        root.join(&self.worktree_dir)
    }

    /// Data directory in the main checkout (legacy location and home of workspaces/backups)
    pub fn root_data_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.data_dir)
    }

    /// Data directory inside the sync worktree
    pub fn worktree_data_dir(&self, root: &Path) -> PathBuf {
        self.worktree_path(root).join(&self.data_dir)
    }

    /// Remote-tracking ref for the sync branch, e.g. `origin/trackline-sync`
    pub fn remote_ref(&self) -> String {
        format!("{}/{}", self.remote, self.branch)
    }
}
