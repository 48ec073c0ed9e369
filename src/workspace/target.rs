use std::fmt;
use std::path::{Path, PathBuf};

use super::error::WorkspaceError;

/// Name of the pending-sync workspace
pub const OUTBOX: &str = "outbox";

/// Where a workspace lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceTarget {
    /// `<workspaces>/<name>`
    Named(String),
    /// `<workspaces>/outbox`: records waiting to be synced, drained on import
    Outbox,
    /// An arbitrary directory
    Dir(PathBuf),
}

impl WorkspaceTarget {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        if name == OUTBOX {
            WorkspaceTarget::Outbox
        } else {
            WorkspaceTarget::Named(name)
        }
    }

    pub fn is_outbox(&self) -> bool {
        matches!(self, WorkspaceTarget::Outbox)
    }

    /// Directory of this workspace under `workspaces_dir`
    pub fn resolve(&self, workspaces_dir: &Path) -> Result<PathBuf, WorkspaceError> {
        match self {
            WorkspaceTarget::Named(name) => {
                if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
                    return Err(WorkspaceError::InvalidName(name.clone()));
                }
                Ok(workspaces_dir.join(name))
            }
            WorkspaceTarget::Outbox => Ok(workspaces_dir.join(OUTBOX)),
            WorkspaceTarget::Dir(dir) => Ok(dir.clone()),
        }
    }
}

impl fmt::Display for WorkspaceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkspaceTarget::Named(name) => write!(f, "{name}"),
            WorkspaceTarget::Outbox => write!(f, "{OUTBOX}"),
            WorkspaceTarget::Dir(dir) => write!(f, "{}", dir.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbox_name_maps_to_outbox() {
        assert_eq!(WorkspaceTarget::named("outbox"), WorkspaceTarget::Outbox);
        assert!(WorkspaceTarget::named("outbox").is_outbox());
        assert!(!WorkspaceTarget::named("backup").is_outbox());
    }

    #[test]
    fn test_resolve_rejects_path_names() {
        let base = Path::new("/data/workspaces");
        assert_eq!(
            WorkspaceTarget::named("nightly").resolve(base).unwrap(),
            base.join("nightly")
        );
        assert!(WorkspaceTarget::named("../escape").resolve(base).is_err());
        assert!(WorkspaceTarget::named("").resolve(base).is_err());
        assert_eq!(
            WorkspaceTarget::Dir(PathBuf::from("/tmp/ws"))
                .resolve(base)
                .unwrap(),
            PathBuf::from("/tmp/ws")
        );
    }
}
