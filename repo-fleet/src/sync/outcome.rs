//! Sync outcome types.

use crate::discovery::Repository;
use serde::Serialize;

/// Classification of one repository's sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Fetch and integrate both succeeded.
    Synced,

    /// Fetch or integrate failed. Covers network errors, merge conflicts and
    /// branches without an upstream alike.
    Conflicted,

    /// Dry run; nothing was executed.
    Skipped,
}

/// Result of syncing a single repository.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    /// Repository that was synced.
    pub repository: Repository,

    /// Classification.
    pub status: SyncStatus,

    /// Raw git output of the failing step(s), empty on success.
    pub diagnostic: String,
}

impl SyncOutcome {
    /// First non-empty line of the diagnostic, used on the report line.
    #[must_use]
    pub fn reason(&self) -> &str {
        self.diagnostic
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("unknown error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn reason_skips_blank_lines() {
        let outcome = SyncOutcome {
            repository: Repository::new(PathBuf::from("/fleet/api")),
            status: SyncStatus::Conflicted,
            diagnostic: "\n  \nfatal: unable to access remote\nhint: check credentials".to_string(),
        };
        assert_eq!(outcome.reason(), "fatal: unable to access remote");
    }
}
