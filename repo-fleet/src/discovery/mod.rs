//! Local repository discovery.
//!
//! Walks the fleet root one level deep and yields every immediate
//! subdirectory that is a git working tree.

mod error;
mod repository;

pub use error::DiscoveryError;
pub use repository::Repository;

use std::fs::ReadDir;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Lazy iterator over the repositories under a fleet root.
///
/// Entries come out in filesystem order. The iterator can only be consumed
/// once; call [`discover_repositories`] again for a fresh scan.
#[derive(Debug)]
pub struct Repositories {
    root: PathBuf,
    entries: ReadDir,
}

impl Iterator for Repositories {
    type Item = Repository;

    fn next(&mut self) -> Option<Self::Item> {
        for entry in self.entries.by_ref() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(root = %self.root.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if !Repository::is_repository(&path) {
                debug!(path = %path.display(), "Not a repository, skipping");
                continue;
            }
            return Some(Repository::new(path));
        }
        None
    }
}

/// Starts a scan of `root`.
///
/// # Errors
///
/// Returns [`DiscoveryError::RootInaccessible`] if the root cannot be
/// resolved or listed. Nothing is yielded in that case.
pub fn discover_repositories(root: &Path) -> Result<Repositories, DiscoveryError> {
    let inaccessible = |source| DiscoveryError::RootInaccessible {
        path: root.display().to_string(),
        source,
    };

    let root = std::fs::canonicalize(root).map_err(inaccessible)?;
    let entries = std::fs::read_dir(&root).map_err(inaccessible)?;
    info!(root = %root.display(), "Scanning fleet root");

    Ok(Repositories { root, entries })
}

/// Scans `root` and returns the repositories sorted by name.
///
/// # Errors
///
/// See [`discover_repositories`].
pub fn discover_sorted(root: &Path) -> Result<Vec<Repository>, DiscoveryError> {
    let mut repositories: Vec<Repository> = discover_repositories(root)?.collect();
    repositories.sort_by(|a, b| a.name.cmp(&b.name));
    info!(count = repositories.len(), "Discovery complete");
    Ok(repositories)
}
