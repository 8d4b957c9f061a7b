//! Version-control error types.

use thiserror::Error;

/// Errors that prevent a git command from producing an exit status.
///
/// A command that runs and exits non-zero is not an error at this level; see
/// [`CommandOutput::success`](super::CommandOutput::success).
#[derive(Debug, Error)]
pub enum VcsError {
    /// The process could not be started.
    #[error("Failed to execute git {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process did not finish in time and was killed.
    #[error("git {command} timed out after {timeout_secs} seconds")]
    TimedOut { command: String, timeout_secs: u64 },
}
