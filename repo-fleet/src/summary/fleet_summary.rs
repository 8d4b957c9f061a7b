//! Fleet summary types.

use super::entry::FleetEntry;
use crate::drift::DriftStatus;
use crate::sync::{SyncOutcome, SyncStatus};

/// Aggregate of one `sync` or `check` run.
#[derive(Debug, Clone, Default)]
pub struct FleetSummary {
    /// Repositories synced successfully.
    pub synced: usize,

    /// Repositories whose sync failed.
    pub failed: usize,

    /// Repositories skipped by a dry run.
    pub skipped: usize,

    /// Repositories without working-tree changes.
    pub clean: usize,

    /// Repositories with working-tree changes.
    pub drifted: usize,

    /// Repositories whose status could not be queried.
    pub indeterminate: usize,

    /// Repositories never processed because the run was cancelled.
    pub abandoned: usize,

    /// Whether this was a dry run.
    pub dry_run: bool,

    entries: Vec<FleetEntry>,
}

impl FleetSummary {
    /// Creates a new empty summary.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Records a sync outcome. Every outcome becomes an entry.
    pub fn record_sync(&mut self, outcome: SyncOutcome) {
        match outcome.status {
            SyncStatus::Synced => self.synced += 1,
            SyncStatus::Conflicted => self.failed += 1,
            SyncStatus::Skipped => self.skipped += 1,
        }
        self.entries.push(FleetEntry::Sync(outcome));
    }

    /// Records a drift check. Only drifted repositories become entries.
    pub fn record_drift(&mut self, status: DriftStatus) {
        match status {
            DriftStatus::Clean => self.clean += 1,
            DriftStatus::Indeterminate { .. } => self.indeterminate += 1,
            DriftStatus::Drifted(report) => {
                self.drifted += 1;
                self.entries.push(FleetEntry::Drift(report));
            }
        }
    }

    /// Appends `other` after this summary, keeping both entry orders.
    pub fn merge(&mut self, other: FleetSummary) {
        self.synced += other.synced;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.clean += other.clean;
        self.drifted += other.drifted;
        self.indeterminate += other.indeterminate;
        self.abandoned += other.abandoned;
        self.dry_run |= other.dry_run;
        self.entries.extend(other.entries);
    }

    /// Entries in the order they were recorded.
    #[must_use]
    pub fn entries(&self) -> &[FleetEntry] {
        &self.entries
    }

    /// Number of repositories that were processed.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.synced + self.failed + self.skipped + self.clean + self.drifted + self.indeterminate
    }

    /// Number of repositories whose status was actually checked.
    #[must_use]
    pub fn checked(&self) -> usize {
        self.clean + self.drifted + self.indeterminate
    }

    /// Returns true if any sync failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
