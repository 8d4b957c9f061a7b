//! Pages exposure auditing.
//!
//! Flags repositories that declare a Pages deployment workflow while Pages
//! hosting is disabled, which usually means the site silently stopped
//! publishing.

use crate::forge::{Forge, Probe};
use crate::schedule::Scheduler;
use tracing::{debug, info_span, warn, Instrument};

/// Probe results for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagesExposure {
    pub repository: String,
    pub has_pages_workflow: Probe,

    /// Only probed when the workflow was found; [`Probe::Absent`] otherwise.
    pub pages_enabled: Probe,
}

impl PagesExposure {
    /// Workflow present and Pages not enabled, after collapsing both probes.
    #[must_use]
    pub fn is_flagged(&self) -> bool {
        self.has_pages_workflow.is_present() && !self.pages_enabled.is_present()
    }

    fn is_indeterminate(&self) -> bool {
        self.has_pages_workflow.is_indeterminate() || self.pages_enabled.is_indeterminate()
    }
}

/// Result of auditing an organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagesAudit {
    pub org: String,

    /// One exposure per audited repository, in input order.
    pub exposures: Vec<PagesExposure>,

    pub abandoned: usize,
}

impl PagesAudit {
    /// Repositories with a workflow but no Pages site.
    pub fn flagged(&self) -> impl Iterator<Item = &PagesExposure> {
        self.exposures.iter().filter(|e| e.is_flagged())
    }

    /// Repositories where at least one probe went unanswered.
    #[must_use]
    pub fn indeterminate(&self) -> usize {
        self.exposures.iter().filter(|e| e.is_indeterminate()).count()
    }
}

/// Probes every repository in `repositories` for a Pages workflow at `workflow_path`.
pub async fn audit_pages(
    forge: &dyn Forge,
    scheduler: &Scheduler,
    org: &str,
    repositories: Vec<String>,
    workflow_path: &str,
) -> PagesAudit {
    let batch = scheduler
        .run(repositories, move |repo: String| {
            let span = info_span!("pages", repo = %repo);
            async move { probe_repository(forge, org, repo, workflow_path).await }.instrument(span)
        })
        .await;

    PagesAudit {
        org: org.to_string(),
        exposures: batch.completed,
        abandoned: batch.abandoned,
    }
}

async fn probe_repository(
    forge: &dyn Forge,
    org: &str,
    repo: String,
    workflow_path: &str,
) -> PagesExposure {
    let has_pages_workflow = Probe::from(forge.file_exists(org, &repo, workflow_path).await);
    if let Probe::Indeterminate { reason } = &has_pages_workflow {
        warn!(reason = %reason, "Could not probe for the pages workflow, treating as absent");
    }

    let pages_enabled = if has_pages_workflow.is_present() {
        let probe = Probe::from(forge.pages_enabled(org, &repo).await);
        if let Probe::Indeterminate { reason } = &probe {
            warn!(reason = %reason, "Could not probe Pages, treating as disabled");
        }
        probe
    } else {
        Probe::Absent
    };

    debug!(workflow = %has_pages_workflow, pages = %pages_enabled, "Probed");
    PagesExposure {
        repository: repo,
        has_pages_workflow,
        pages_enabled,
    }
}
