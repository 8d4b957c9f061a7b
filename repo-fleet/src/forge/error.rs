//! Forge error types.

use thiserror::Error;

/// Errors returned by forge queries.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),

    /// The call did not complete in time.
    #[error("{operation} timed out after {timeout_secs} seconds")]
    TimedOut {
        operation: &'static str,
        timeout_secs: u64,
    },
}

/// The organization's repositories could not be listed.
///
/// Unlike per-repository query failures this aborts the command, because
/// there is nothing left to iterate over.
#[derive(Debug, Error)]
#[error("Failed to list repositories of '{org}': {source}")]
pub struct ListingError {
    pub org: String,
    #[source]
    pub source: ForgeError,
}
