//! Orchestrates the fleet commands.

mod error;

pub use error::RunnerError;

use crate::analyze::{analyze_failures, FailureAnalysis, QueryLimits};
use crate::config::FleetConfig;
use crate::discovery::{discover_sorted, Repository};
use crate::drift::detect_drift;
use crate::forge::{list_organization, Forge, GitHubForge};
use crate::pages::{audit_pages, PagesAudit};
use crate::schedule::{CancelFlag, RepoLocks, Schedule, Scheduler};
use crate::summary::FleetSummary;
use crate::sync::sync_repository;
use crate::vcs::{GitCli, VersionControl};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Runs fleet commands against one configuration.
pub struct Runner {
    config: FleetConfig,
    vcs: Arc<dyn VersionControl>,
    /// Built on first use, so local commands never need an HTTP client.
    forge: OnceCell<Arc<dyn Forge>>,
    scheduler: Scheduler,
    locks: RepoLocks,
}

impl Runner {
    /// Builds a runner using the `git` executable and the GitHub API.
    ///
    /// The GitHub client is only built when `analyze` or `pages` first
    /// needs it.
    pub fn new(config: FleetConfig, parallel: bool, cancel: CancelFlag) -> Self {
        let vcs = Arc::new(GitCli::new(config.timeout()));
        Self::build(config, vcs, OnceCell::new(), parallel, cancel)
    }

    /// Builds a runner around existing capability implementations.
    pub fn with_clients(
        config: FleetConfig,
        vcs: Arc<dyn VersionControl>,
        forge: Arc<dyn Forge>,
        parallel: bool,
        cancel: CancelFlag,
    ) -> Self {
        Self::build(config, vcs, OnceCell::new_with(Some(forge)), parallel, cancel)
    }

    fn build(
        config: FleetConfig,
        vcs: Arc<dyn VersionControl>,
        forge: OnceCell<Arc<dyn Forge>>,
        parallel: bool,
        cancel: CancelFlag,
    ) -> Self {
        let schedule = Schedule::from_flag(parallel, config.workers());
        Self {
            config,
            vcs,
            forge,
            scheduler: Scheduler::new(schedule, cancel),
            locks: RepoLocks::new(),
        }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    /// Fetches and integrates every repository under the root.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Discovery`] if the root cannot be scanned.
    pub async fn sync(&self, dry_run: bool) -> Result<FleetSummary, RunnerError> {
        let repositories = self.discover()?;
        info!(
            count = repositories.len(),
            dry_run,
            schedule = ?self.scheduler.schedule(),
            "Syncing fleet"
        );

        let vcs = self.vcs.as_ref();
        let locks = &self.locks;
        let batch = self
            .scheduler
            .run(repositories, move |repository: Repository| async move {
                let _guard = locks.lock(&repository.path).await;
                sync_repository(vcs, &repository, dry_run).await
            })
            .await;

        let mut summary = FleetSummary::new(dry_run);
        for outcome in batch.completed {
            summary.record_sync(outcome);
        }
        summary.abandoned = batch.abandoned;

        info!(
            synced = summary.synced,
            failed = summary.failed,
            skipped = summary.skipped,
            cancelled = summary.abandoned,
            "Sync complete"
        );
        Ok(summary)
    }

    /// Reports working-tree changes of every repository under the root.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Discovery`] if the root cannot be scanned.
    pub async fn check(&self) -> Result<FleetSummary, RunnerError> {
        let repositories = self.discover()?;
        info!(count = repositories.len(), "Checking fleet for drift");

        let vcs = self.vcs.as_ref();
        let batch = self
            .scheduler
            .run(repositories, move |repository: Repository| async move {
                detect_drift(vcs, &repository).await
            })
            .await;

        let mut summary = FleetSummary::new(false);
        for status in batch.completed {
            summary.record_drift(status);
        }
        summary.abandoned = batch.abandoned;

        if summary.indeterminate > 0 {
            warn!(
                count = summary.indeterminate,
                "Some repositories could not be queried and were counted as clean"
            );
        }
        info!(
            drifted = summary.drifted,
            checked = summary.checked(),
            "Check complete"
        );
        Ok(summary)
    }

    /// Tallies recent workflow failures across the organization.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::MissingOrg`] without an organization,
    /// [`RunnerError::Forge`] if the GitHub client cannot be built and
    /// [`RunnerError::Listing`] if its repositories cannot be listed.
    pub async fn analyze(&self, filter: Option<&str>) -> Result<FailureAnalysis, RunnerError> {
        let org = self.org()?;
        let limits = QueryLimits {
            run_window: self.config.run_window(),
            page_size: self.config.page_size(),
        };

        let forge = self.forge().await?;
        let analysis = analyze_failures(
            forge,
            &self.scheduler,
            org,
            self.config.categories(),
            filter,
            limits,
        )
        .await?;

        info!(
            org,
            repositories = analysis.repositories,
            categories = analysis.categories.len(),
            "Analysis complete"
        );
        Ok(analysis)
    }

    /// Finds repositories whose Pages workflow has no Pages site behind it.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::MissingOrg`] without an organization,
    /// [`RunnerError::Forge`] if the GitHub client cannot be built and
    /// [`RunnerError::Listing`] if its repositories cannot be listed.
    pub async fn pages(&self) -> Result<PagesAudit, RunnerError> {
        let org = self.org()?;
        let forge = self.forge().await?;
        let repositories = list_organization(forge, org, self.config.page_size()).await?;

        let audit = audit_pages(
            forge,
            &self.scheduler,
            org,
            repositories,
            self.config.pages_workflow(),
        )
        .await;

        info!(
            org,
            audited = audit.exposures.len(),
            flagged = audit.flagged().count(),
            "Pages audit complete"
        );
        Ok(audit)
    }

    fn discover(&self) -> Result<Vec<Repository>, RunnerError> {
        Ok(discover_sorted(self.config.root())?)
    }

    fn org(&self) -> Result<&str, RunnerError> {
        self.config.org().ok_or(RunnerError::MissingOrg)
    }

    async fn forge(&self) -> Result<&dyn Forge, RunnerError> {
        let forge = self
            .forge
            .get_or_try_init(|| async {
                let forge: Arc<dyn Forge> = Arc::new(GitHubForge::new(&self.config)?);
                Ok::<_, RunnerError>(forge)
            })
            .await?;
        Ok(forge.as_ref())
    }
}
