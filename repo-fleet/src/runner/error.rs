//! Runner error types.

use crate::config::ConfigError;
use crate::discovery::DiscoveryError;
use crate::forge::{ForgeError, ListingError};
use crate::report::ReportError;

/// Errors that abort a command.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Configuration loading errors.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The fleet root could not be scanned.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// The organization could not be enumerated.
    #[error(transparent)]
    Listing(#[from] ListingError),

    /// GitHub API client initialization errors.
    #[error(transparent)]
    Forge(#[from] ForgeError),

    /// Report rendering errors.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// A forge command was run without an organization.
    #[error("No organization configured; pass --org or set `org` in the config file")]
    MissingOrg,
}
