//! Local repository identity.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// A git working tree found directly under the fleet root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Repository {
    /// Path to the working tree.
    pub path: PathBuf,

    /// Final path segment, used as the display name.
    pub name: String,
}

impl Repository {
    /// Builds a repository from its path, deriving the name.
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    /// Returns true if `path` directly contains git metadata.
    ///
    /// `.git` may be a directory or, for linked worktrees and submodules, a file.
    pub fn is_repository(path: &Path) -> bool {
        path.join(".git").exists()
    }
}
