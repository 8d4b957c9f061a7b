//! Per-repository entries kept by a [`FleetSummary`](super::FleetSummary).

use crate::drift::DriftReport;
use crate::sync::SyncOutcome;

/// One line (or block) of a fleet report.
#[derive(Debug, Clone)]
pub enum FleetEntry {
    /// Result of syncing a repository.
    Sync(SyncOutcome),

    /// A repository with working-tree changes.
    Drift(DriftReport),
}

impl FleetEntry {
    /// Name of the repository the entry belongs to.
    #[must_use]
    pub fn repository_name(&self) -> &str {
        match self {
            Self::Sync(outcome) => &outcome.repository.name,
            Self::Drift(report) => &report.repository.name,
        }
    }
}
