//! Branch lookups: current branch and existence checks

use anyhow::Result;

use crate::git::runner::Git;

/// Name of the branch HEAD points at, or `None` when HEAD is detached.
///
/// Uses `symbolic-ref` rather than `rev-parse --abbrev-ref`, which answers
/// "HEAD" for a detached checkout and hides the problem.
pub fn current_branch(git: &Git) -> Result<Option<String>> {
    let output = git.run(&["symbolic-ref", "-q", "--short", "HEAD"])?;
    if !output.success() {
        return Ok(None);
    }
    let name = output.stdout.trim();
    Ok((!name.is_empty()).then(|| name.to_string()))
}

/// Check if a local branch exists
pub fn branch_exists(git: &Git, name: &str) -> bool {
    let ref_path = format!("refs/heads/{name}");
    git.ok(&["rev-parse", "--verify", "--quiet", &ref_path])
}

/// Check if a remote-tracking branch exists, e.g. `origin/trackline-sync`
pub fn remote_branch_exists(git: &Git, remote: &str, name: &str) -> bool {
    let ref_path = format!("refs/remotes/{remote}/{name}");
    git.ok(&["rev-parse", "--verify", "--quiet", &ref_path])
}
