//! Git command runner abstraction
//!
//! Every git invocation goes through [`Git`], which pins the working
//! directory and bounds the call with a timeout. A subprocess that exceeds
//! the timeout is killed and reported as an error; nothing blocks forever.

use anyhow::{bail, Context, Result};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Time allowed for draining pipes after the process exits
const OUTPUT_COLLECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Check that a `git` binary is on PATH
pub fn check_git_available() -> Result<PathBuf> {
    which::which("git").context("Git is not installed or not in PATH")
}

/// Captured result of one git invocation
#[derive(Debug, Clone)]
pub struct GitOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Git invoked in one directory with a fixed timeout
#[derive(Debug, Clone)]
pub struct Git {
    dir: PathBuf,
    timeout: Duration,
}

impl Git {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            timeout: DEFAULT_GIT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Same timeout, different working directory
    pub fn at(&self, dir: impl Into<PathBuf>) -> Git {
        Git {
            dir: dir.into(),
            timeout: self.timeout,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run a git command and return its captured output, successful or not.
    ///
    /// Fails only when git cannot be spawned or the timeout expires.
    pub fn run(&self, args: &[&str]) -> Result<GitOutput> {
        self.run_inner(args, None)
    }

    /// Like [`run`](Self::run), feeding `input` to the command's stdin
    pub fn run_with_input(&self, args: &[&str], input: &str) -> Result<GitOutput> {
        self.run_inner(args, Some(input.as_bytes().to_vec()))
    }

    fn run_inner(&self, args: &[&str], input: Option<Vec<u8>>) -> Result<GitOutput> {
        let stdin = if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };
        let mut child = Command::new("git")
            .args(args)
            .current_dir(&self.dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to execute: git {}", args.join(" ")))?;

        if let (Some(mut pipe), Some(input)) = (child.stdin.take(), input) {
            // Written from a thread: git may fill stdout before reading all input.
            thread::spawn(move || {
                let _ = pipe.write_all(&input);
            });
        }

        // Drain both pipes while waiting so a chatty command cannot fill the
        // pipe buffer and deadlock against us.
        let stdout_rx = drain(child.stdout.take());
        let stderr_rx = drain(child.stderr.take());

        let status = match child
            .wait_timeout(self.timeout)
            .with_context(|| format!("Failed to wait for: git {}", args.join(" ")))?
        {
            Some(status) => status,
            None => {
                kill_child(&mut child);
                bail!(
                    "git {} timed out after {}s",
                    args.join(" "),
                    self.timeout.as_secs()
                );
            }
        };

        let stdout = stdout_rx
            .recv_timeout(OUTPUT_COLLECTION_TIMEOUT)
            .unwrap_or_default();
        let stderr = stderr_rx
            .recv_timeout(OUTPUT_COLLECTION_TIMEOUT)
            .unwrap_or_default();

        Ok(GitOutput {
            status,
            stdout,
            stderr,
        })
    }

    /// Run a git command, check for success, and return stdout trimmed.
    ///
    /// On failure, bails with the stderr content.
    pub fn checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;
        if !output.success() {
            let cmd = args.first().unwrap_or(&"");
            bail!("git {cmd} failed: {}", output.stderr.trim());
        }
        Ok(output.stdout.trim().to_string())
    }

    /// Run a git command and return true if exit code is 0.
    ///
    /// Spawn failures and timeouts count as false. Use for probes such as
    /// `rev-parse --verify`.
    pub fn ok(&self, args: &[&str]) -> bool {
        self.run(args).map(|o| o.success()).unwrap_or(false)
    }
}

fn drain<R: Read + Send + 'static>(stream: Option<R>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    match stream {
        Some(mut stream) => {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = stream.read_to_end(&mut buf);
                let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
            });
        }
        None => {
            let _ = tx.send(String::new());
        }
    }
    rx
}

fn kill_child(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_checked_returns_trimmed_stdout() {
        let temp = TempDir::new().unwrap();
        let git = Git::new(temp.path());
        git.checked(&["init", "-q"]).unwrap();

        let inside = git.checked(&["rev-parse", "--is-inside-work-tree"]).unwrap();
        assert_eq!(inside, "true");
    }

    #[test]
    fn test_checked_reports_stderr_on_failure() {
        let temp = TempDir::new().unwrap();
        let git = Git::new(temp.path());

        let err = git.checked(&["rev-parse", "HEAD"]).unwrap_err();
        assert!(err.to_string().contains("git rev-parse failed"));
    }

    #[test]
    fn test_ok_is_false_outside_repo() {
        let temp = TempDir::new().unwrap();
        let git = Git::new(temp.path());
        assert!(!git.ok(&["rev-parse", "--git-dir"]));
    }

    #[test]
    fn test_run_with_input_feeds_stdin() {
        let temp = TempDir::new().unwrap();
        let git = Git::new(temp.path());
        git.checked(&["init", "-q"]).unwrap();

        let output = git
            .run_with_input(&["hash-object", "--stdin"], "hello\n")
            .unwrap();
        assert!(output.success());
        assert_eq!(
            output.stdout.trim(),
            "ce013625030ba8dba906f756967f9e9ca394464a"
        );
    }

    #[test]
    fn test_at_keeps_timeout() {
        let git = Git::new("/a").with_timeout(Duration::from_secs(3));
        let other = git.at("/b");
        assert_eq!(other.dir(), Path::new("/b"));
        assert_eq!(other.timeout, Duration::from_secs(3));
    }
}
