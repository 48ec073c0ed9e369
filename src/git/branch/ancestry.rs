//! Commit resolution and branch divergence

use anyhow::{bail, Context, Result};

use crate::git::runner::Git;

/// Resolve a revision to its full commit SHA, or `None` if it does not exist
pub fn rev_parse(git: &Git, rev: &str) -> Result<Option<String>> {
    let spec = format!("{rev}^{{commit}}");
    let output = git.run(&["rev-parse", "--verify", "--quiet", &spec])?;
    if !output.success() {
        return Ok(None);
    }
    Ok(Some(output.stdout.trim().to_string()))
}

/// Check if `commit` is an ancestor of (or equal to) `rev`
pub fn is_ancestor_of(git: &Git, commit: &str, rev: &str) -> Result<bool> {
    let output = git
        .run(&["merge-base", "--is-ancestor", commit, rev])
        .with_context(|| format!("Failed to check if {commit} is ancestor of {rev}"))?;
    Ok(output.success())
}

/// Count commits `(ahead, behind)` of `local` relative to `upstream`.
///
/// Uses `rev-list --left-right --count local...upstream`.
pub fn ahead_behind(git: &Git, local: &str, upstream: &str) -> Result<(u32, u32)> {
    let range = format!("{local}...{upstream}");
    let stdout = git.checked(&["rev-list", "--left-right", "--count", &range])?;
    parse_left_right(&stdout)
}

fn parse_left_right(output: &str) -> Result<(u32, u32)> {
    let mut parts = output.split_whitespace();
    let (Some(left), Some(right)) = (parts.next(), parts.next()) else {
        bail!("unexpected rev-list --count output: '{output}'");
    };
    let ahead = left
        .parse()
        .with_context(|| format!("invalid ahead count '{left}'"))?;
    let behind = right
        .parse()
        .with_context(|| format!("invalid behind count '{right}'"))?;
    Ok((ahead, behind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::test_support::{commit_file, init_test_repo};

    #[test]
    fn test_parse_left_right() {
        assert_eq!(parse_left_right("3\t1\n").unwrap(), (3, 1));
        assert!(parse_left_right("3").is_err());
        assert!(parse_left_right("x 1").is_err());
    }

    #[test]
    fn test_rev_parse_missing_ref() {
        let (_temp, git) = init_test_repo();
        assert!(rev_parse(&git, "main").unwrap().is_some());
        assert!(rev_parse(&git, "no-such-branch").unwrap().is_none());
    }

    #[test]
    fn test_ahead_behind_counts() {
        let (temp, git) = init_test_repo();
        git.checked(&["branch", "other"]).unwrap();
        commit_file(&git, temp.path(), "a.txt", "a");
        commit_file(&git, temp.path(), "b.txt", "b");

        assert_eq!(ahead_behind(&git, "main", "other").unwrap(), (2, 0));
        assert_eq!(ahead_behind(&git, "other", "main").unwrap(), (0, 2));

        let main_head = rev_parse(&git, "other").unwrap().unwrap();
        assert!(is_ancestor_of(&git, &main_head, "main").unwrap());
    }
}
