//! GitHub backend built on octocrab.

use super::{Forge, ForgeError};
use crate::config::FleetConfig;
use crate::rate_limit::{check_core_rate_limit, wait_for_reset};
use async_trait::async_trait;
use octocrab::Octocrab;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Workflows requested per repository when resolving a name.
const WORKFLOWS_PER_PAGE: u8 = 100;

/// Subset of the `GET /repos/{owner}/{repo}/pages` response.
#[derive(Debug, Deserialize)]
struct PagesSite {
    status: Option<String>,
    html_url: Option<String>,
}

/// Subset of the `GET /repos/{owner}/{repo}/actions/workflows` response.
#[derive(Debug, Deserialize)]
struct WorkflowList {
    workflows: Vec<WorkflowRef>,
}

#[derive(Debug, Clone, Deserialize)]
struct WorkflowRef {
    id: u64,
    name: String,
}

/// Subset of the `GET .../actions/workflows/{id}/runs` response.
#[derive(Debug, Deserialize)]
struct RunList {
    workflow_runs: Vec<IgnoredAny>,
}

#[derive(Debug, Serialize)]
struct RunQuery {
    status: &'static str,
    per_page: u8,
}

#[derive(Debug, Serialize)]
struct PageQuery {
    per_page: u8,
}

/// [`Forge`] implementation talking to the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubForge {
    octocrab: Octocrab,
    timeout: Duration,
    /// Workflows per `org/repo`, fetched once and shared by every category.
    workflows: Arc<Mutex<HashMap<String, Vec<WorkflowRef>>>>,
}

impl GitHubForge {
    /// Builds a client from the fleet configuration.
    ///
    /// Without a token the client is anonymous and only sees public data.
    /// A process-level rustls `CryptoProvider` must be installed first.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] if the HTTP client cannot be constructed.
    pub fn new(config: &FleetConfig) -> Result<Self, ForgeError> {
        let mut builder = Octocrab::builder();
        if let Some(token) = config.token() {
            builder = builder.personal_token(token.to_string());
        }
        if let Some(url) = config.api_url() {
            builder = builder.base_uri(url.as_str())?;
        }

        Ok(Self::from_octocrab(builder.build()?, config.timeout()))
    }

    /// Wraps an existing client.
    pub fn from_octocrab(octocrab: Octocrab, timeout: Duration) -> Self {
        Self {
            octocrab,
            timeout,
            workflows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn timed<T, F>(&self, operation: &'static str, call: F) -> Result<T, ForgeError>
    where
        F: Future<Output = Result<T, octocrab::Error>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ForgeError::TimedOut {
                operation,
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(ForgeError::from)
    }

    /// Waits out a nearly exhausted budget.
    ///
    /// A timed out check fails the query like any other timeout. Other errors
    /// are logged and ignored, since some GitHub Enterprise servers do not
    /// serve the rate limit endpoint.
    async fn respect_rate_limit(&self) -> Result<(), ForgeError> {
        match self
            .timed("rate limit check", check_core_rate_limit(&self.octocrab))
            .await
        {
            Ok(limit) => {
                wait_for_reset(&limit, self.timeout).await;
                Ok(())
            }
            Err(e @ ForgeError::TimedOut { .. }) => Err(e),
            Err(e) => {
                warn!(error = %e, "Failed to check rate limit, continuing");
                Ok(())
            }
        }
    }

    /// Maps a 404 to `Ok(false)` and any success to `Ok(true)`.
    fn existence<T>(result: Result<T, ForgeError>) -> Result<bool, ForgeError> {
        match result {
            Ok(_) => Ok(true),
            Err(ForgeError::GitHubError(e)) if is_not_found(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Resolves a workflow display name (case-insensitive) to its id.
    async fn workflow_id(
        &self,
        org: &str,
        repo: &str,
        name: &str,
    ) -> Result<Option<u64>, ForgeError> {
        let key = format!("{org}/{repo}");
        let cached = self
            .workflows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();

        let workflows = match cached {
            Some(workflows) => workflows,
            None => {
                let route = format!("/repos/{org}/{repo}/actions/workflows");
                let query = PageQuery {
                    per_page: WORKFLOWS_PER_PAGE,
                };
                let list = self
                    .timed(
                        "workflow listing",
                        self.octocrab.get::<WorkflowList, _, _>(route, Some(&query)),
                    )
                    .await?;
                self.workflows
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(key, list.workflows.clone());
                list.workflows
            }
        };

        Ok(workflows
            .iter()
            .find(|workflow| workflow.name.eq_ignore_ascii_case(name))
            .map(|workflow| workflow.id))
    }
}

#[async_trait]
impl Forge for GitHubForge {
    async fn list_repositories(
        &self,
        org: &str,
        page_size: u8,
    ) -> Result<Vec<String>, ForgeError> {
        self.respect_rate_limit().await?;

        let page = self
            .timed(
                "repository listing",
                self.octocrab.orgs(org).list_repos().per_page(page_size).send(),
            )
            .await?;

        if page.next.is_some() {
            warn!(
                org,
                page_size,
                "Organization has more repositories than one page; the rest are not visited"
            );
        }

        Ok(page.items.into_iter().map(|repo| repo.name).collect())
    }

    async fn count_failed_runs(
        &self,
        org: &str,
        repo: &str,
        workflow: &str,
        window: u8,
    ) -> Result<u64, ForgeError> {
        self.respect_rate_limit().await?;

        let Some(id) = self.workflow_id(org, repo, workflow).await? else {
            debug!(repo, workflow, "No workflow with this name");
            return Ok(0);
        };

        let route = format!("/repos/{org}/{repo}/actions/workflows/{id}/runs");
        let query = RunQuery {
            status: "failure",
            per_page: window,
        };
        let runs = self
            .timed(
                "run history query",
                self.octocrab.get::<RunList, _, _>(route, Some(&query)),
            )
            .await?;

        let count = runs.workflow_runs.len().min(usize::from(window));
        debug!(repo, workflow, count, "Counted failed runs");

        Ok(count as u64)
    }

    async fn file_exists(&self, org: &str, repo: &str, path: &str) -> Result<bool, ForgeError> {
        self.respect_rate_limit().await?;

        let route = format!("/repos/{org}/{repo}/contents/{path}");
        let result = self
            .timed(
                "content lookup",
                self.octocrab.get::<IgnoredAny, _, ()>(route, None::<&()>),
            )
            .await;
        Self::existence(result)
    }

    async fn pages_enabled(&self, org: &str, repo: &str) -> Result<bool, ForgeError> {
        self.respect_rate_limit().await?;

        let route = format!("/repos/{org}/{repo}/pages");
        let result = self
            .timed(
                "pages lookup",
                self.octocrab.get::<PagesSite, _, ()>(route, None::<&()>),
            )
            .await;

        if let Ok(site) = &result {
            debug!(
                repo,
                status = site.status.as_deref().unwrap_or("unknown"),
                url = site.html_url.as_deref().unwrap_or(""),
                "Pages site found"
            );
        }
        Self::existence(result)
    }
}

/// Returns true if the GitHub API answered 404.
fn is_not_found(error: &octocrab::Error) -> bool {
    match error {
        octocrab::Error::GitHub { source, .. } => source.status_code.as_u16() == 404,
        _ => false,
    }
}
