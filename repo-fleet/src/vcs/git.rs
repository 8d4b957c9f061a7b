//! `git` executable backend.

use super::{CommandOutput, VcsError, VersionControl};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Runs the system `git` binary with a per-command timeout.
#[derive(Debug, Clone)]
pub struct GitCli {
    timeout: Duration,
}

impl GitCli {
    /// Creates a backend that kills any git command running longer than `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn run(&self, repo: &Path, args: &[&str]) -> Result<CommandOutput, VcsError> {
        let command = args.join(" ");
        debug!(repo = %repo.display(), command = %command, "Running git");

        let child = Command::new("git")
            .args(args)
            .current_dir(repo)
            // Locale-independent messages, and never block on a credential prompt.
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| VcsError::TimedOut {
                command: command.clone(),
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(|source| VcsError::Spawn {
                command: command.clone(),
                source,
            })?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::process::Command as StdCommand;

    fn run_git(repo_dir: &Path, args: &[&str]) {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn make_git_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init"]);
        run_git(dir.path(), &["config", "user.name", "test-user"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["commit", "--allow-empty", "-m", "initial"]);
        dir
    }

    #[tokio::test]
    async fn reports_untracked_files_in_porcelain_status() {
        let repo = make_git_repo();
        fs::write(repo.path().join("new.txt"), "hello").unwrap();

        let git = GitCli::new(Duration::from_secs(30));
        let output = git.run(repo.path(), &["status", "--porcelain"]).await.unwrap();

        assert!(output.success);
        assert_eq!(output.stdout.trim(), "?? new.txt");
    }

    #[tokio::test]
    async fn failing_command_is_not_an_error() {
        let repo = make_git_repo();

        let git = GitCli::new(Duration::from_secs(30));
        // A fresh repository has no upstream to pull from.
        let output = git.run(repo.path(), &["pull", "--no-edit"]).await.unwrap();

        assert!(!output.success);
        assert!(!output.diagnostic().is_empty());
    }
}
