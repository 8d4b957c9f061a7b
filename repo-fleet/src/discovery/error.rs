//! Repository discovery error types.

use thiserror::Error;

/// Errors that can occur during repository discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The fleet root could not be listed.
    #[error("Cannot read fleet root '{path}': {source}")]
    RootInaccessible {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
