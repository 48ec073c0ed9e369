//! Reading records out of a commit
//!
//! The merge base and the remote side of a sync are never checked out;
//! their records are read straight from git objects.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::models::Issue;
use crate::store::ISSUES_DIR;

use super::branch::rev_parse;
use super::runner::Git;

/// Every record under `<data_dir>/issues/` at `rev`, sorted by id.
///
/// An unknown revision, or one without the directory, yields no records.
pub fn read_records_at(git: &Git, rev: &str, data_dir: &Path) -> Result<Vec<Issue>> {
    let Some(commit) = rev_parse(git, rev)? else {
        return Ok(Vec::new());
    };

    let prefix = format!("{}/{ISSUES_DIR}/", data_dir.to_string_lossy());
    let listing = git
        .checked(&["ls-tree", "-r", "--name-only", &commit, "--", &prefix])
        .with_context(|| format!("Failed to list records at {rev}"))?;

    let paths: Vec<&str> = listing
        .lines()
        .filter(|p| p.ends_with(".json"))
        .collect();
    if paths.is_empty() {
        return Ok(Vec::new());
    }

    let request: String = paths
        .iter()
        .map(|p| format!("{commit}:{p}\n"))
        .collect();
    let output = git
        .run_with_input(&["cat-file", "--batch"], &request)
        .with_context(|| format!("Failed to read records at {rev}"))?;
    if !output.success() {
        bail!("git cat-file failed: {}", output.stderr.trim());
    }

    let mut issues = Vec::with_capacity(paths.len());
    for (path, blob) in paths.iter().zip(parse_batch(&output.stdout)?) {
        let issue: Issue = serde_json::from_str(blob)
            .with_context(|| format!("Failed to parse {path} at {rev}"))?;
        issues.push(issue);
    }
    issues.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(issues)
}

/// Split `cat-file --batch` output into object contents.
///
/// Each object is `<sha> <type> <size>\n<content>\n`.
fn parse_batch(output: &str) -> Result<Vec<&str>> {
    let mut blobs = Vec::new();
    let mut rest = output;
    while !rest.is_empty() {
        let Some((header, body)) = rest.split_once('\n') else {
            bail!("truncated cat-file header");
        };
        let mut fields = header.split_whitespace();
        let (Some(_sha), Some(kind), Some(size)) = (fields.next(), fields.next(), fields.next())
        else {
            bail!("unexpected cat-file header '{header}'");
        };
        if kind == "missing" {
            bail!("object {header} is missing");
        }
        let size: usize = size
            .parse()
            .with_context(|| format!("invalid object size in '{header}'"))?;
        let Some(blob) = body.get(..size) else {
            bail!("truncated object for '{header}'");
        };
        blobs.push(blob);
        rest = body.get(size + 1..).unwrap_or("");
    }
    Ok(blobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::test_support::init_test_repo;
    use crate::store::IssueStore;

    #[test]
    fn test_parse_batch() {
        let out = "aaa blob 2\n{}\nbbb blob 5\nhello\n";
        assert_eq!(parse_batch(out).unwrap(), vec!["{}", "hello"]);
        assert!(parse_batch("aaa blob 9\nshort\n").is_err());
        assert!(parse_batch("x:y missing\n").is_err());
    }

    #[test]
    fn test_reads_committed_records_only() {
        let (temp, git) = init_test_repo();
        let data_dir = Path::new(".trackline");
        let store = IssueStore::new(&temp.path().join(data_dir));
        store.write(&Issue::new("tl-2", "Second")).unwrap();
        store.write(&Issue::new("tl-1", "First")).unwrap();
        git.checked(&["add", "."]).unwrap();
        git.checked(&["commit", "-q", "-m", "records"]).unwrap();

        // Uncommitted edits are not visible at HEAD.
        store.write(&Issue::new("tl-3", "Third")).unwrap();

        let issues = read_records_at(&git, "HEAD", data_dir).unwrap();
        let ids: Vec<_> = issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["tl-1", "tl-2"]);
        assert_eq!(issues[0].title, "First");
    }

    #[test]
    fn test_unknown_revision_is_empty() {
        let (_temp, git) = init_test_repo();
        let issues = read_records_at(&git, "origin/nowhere", Path::new(".trackline")).unwrap();
        assert!(issues.is_empty());
    }
}
