#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod analyze;
pub mod config;
pub mod discovery;
pub mod drift;
#[cfg(any(test, feature = "test-support"))]
pub mod fakes;
pub mod forge;
pub mod pages;
pub mod rate_limit;
pub mod report;
pub mod runner;
pub mod schedule;
pub mod summary;
pub mod sync;
pub mod vcs;

pub use analyze::{
    analyze_failures, select_categories, CategoryFailures, FailureAnalysis, QueryLimits,
    RepositoryFailures, WorkflowCategory, DEFAULT_CATEGORIES,
};
pub use config::{ConfigError, FleetConfig};
pub use discovery::{discover_repositories, discover_sorted, DiscoveryError, Repository};
pub use drift::{detect_drift, DriftReport, DriftStatus, MAX_STATUS_LINES};
pub use forge::{list_organization, Forge, ForgeError, GitHubForge, ListingError, Probe};
pub use pages::{audit_pages, PagesAudit, PagesExposure};
pub use rate_limit::{check_core_rate_limit, wait_for_reset, RateLimitInfo};
pub use report::{ReportError, ReportRenderer};
pub use runner::{Runner, RunnerError};
pub use schedule::{Batch, CancelFlag, RepoLocks, Schedule, Scheduler};
pub use summary::{FleetEntry, FleetSummary};
pub use sync::{sync_repository, SyncOutcome, SyncStatus};
pub use vcs::{CommandOutput, GitCli, VcsError, VersionControl};
