//! Version-control capability.
//!
//! Components never spawn git directly; they go through [`VersionControl`]
//! so tests can substitute an in-memory fake.

mod error;
mod git;

pub use error::VcsError;
pub use git::GitCli;

use async_trait::async_trait;
use std::path::Path;

/// Captured result of a finished git command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the command exited with status zero.
    pub success: bool,

    /// Standard output, lossily decoded.
    pub stdout: String,

    /// Standard error, lossily decoded.
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given stderr.
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Trimmed diagnostic text, preferring stderr.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Runs git commands inside a working tree.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Runs `git <args>` with `repo` as the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError`] only when no exit status was obtained.
    async fn run(&self, repo: &Path, args: &[&str]) -> Result<CommandOutput, VcsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_prefers_stderr() {
        let output = CommandOutput {
            success: false,
            stdout: "Updating 1a2b..3c4d\n".to_string(),
            stderr: "  CONFLICT (content): Merge conflict in lib.rs\n".to_string(),
        };
        assert_eq!(
            output.diagnostic(),
            "CONFLICT (content): Merge conflict in lib.rs"
        );
    }

    #[test]
    fn diagnostic_falls_back_to_stdout() {
        let output = CommandOutput {
            success: false,
            stdout: "Automatic merge failed\n".to_string(),
            stderr: "   ".to_string(),
        };
        assert_eq!(output.diagnostic(), "Automatic merge failed");
    }
}
