//! Forge capability.
//!
//! Everything the analyzer and the pages auditor need from GitHub goes
//! through [`Forge`], so tests can run against an in-memory fake.

mod error;
mod github;
mod probe;

pub use error::{ForgeError, ListingError};
pub use github::GitHubForge;
pub use probe::Probe;

use async_trait::async_trait;
use tracing::info;

/// Queries against a code-hosting forge.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Lists repository names of `org`, at most `page_size` of them.
    async fn list_repositories(&self, org: &str, page_size: u8)
        -> Result<Vec<String>, ForgeError>;

    /// Counts the most recent failed runs of `workflow` in `org/repo`, capped at `window`.
    ///
    /// A run belongs to `workflow` when its name matches case-insensitively.
    async fn count_failed_runs(
        &self,
        org: &str,
        repo: &str,
        workflow: &str,
        window: u8,
    ) -> Result<u64, ForgeError>;

    /// Whether `path` exists on the default branch of `org/repo`.
    async fn file_exists(&self, org: &str, repo: &str, path: &str) -> Result<bool, ForgeError>;

    /// Whether Pages hosting is enabled for `org/repo`.
    async fn pages_enabled(&self, org: &str, repo: &str) -> Result<bool, ForgeError>;
}

/// Lists the repositories of `org`, turning a failure into a [`ListingError`].
///
/// # Errors
///
/// Returns [`ListingError`] if the listing call fails for any reason.
pub async fn list_organization(
    forge: &dyn Forge,
    org: &str,
    page_size: u8,
) -> Result<Vec<String>, ListingError> {
    let repositories = forge
        .list_repositories(org, page_size)
        .await
        .map_err(|source| ListingError {
            org: org.to_string(),
            source,
        })?;
    info!(org, count = repositories.len(), "Listed organization repositories");
    Ok(repositories)
}
