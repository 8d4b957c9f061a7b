//! Cross-repository workflow failure analysis.
//!
//! Tallies recent failed runs per workflow category across every repository
//! of an organization.

mod category;

pub use category::{select_categories, WorkflowCategory, DEFAULT_CATEGORIES};

use crate::forge::{list_organization, Forge, ListingError};
use crate::schedule::Scheduler;
use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};

/// Bounds applied to forge queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    /// Most recent failed runs inspected per repository.
    pub run_window: u8,

    /// Repositories requested from the organization listing.
    pub page_size: u8,
}

/// A repository with at least one failed run in a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryFailures {
    pub repository: String,
    pub count: u64,
}

/// Failures of one workflow category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFailures {
    pub category: WorkflowCategory,

    /// Repositories with a non-zero count, in listing order.
    pub failures: Vec<RepositoryFailures>,

    /// Repositories whose query failed and were counted as zero.
    pub indeterminate: Vec<String>,
}

impl CategoryFailures {
    fn new(category: WorkflowCategory) -> Self {
        Self {
            category,
            failures: Vec::new(),
            indeterminate: Vec::new(),
        }
    }

    /// Sum of all counted failures.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.failures.iter().map(|f| f.count).sum()
    }
}

/// Result of one analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureAnalysis {
    pub org: String,

    /// Number of repositories listed.
    pub repositories: usize,

    /// Selected categories, in configured order.
    pub categories: Vec<CategoryFailures>,

    /// Queries never started because the run was cancelled.
    pub abandoned: usize,
}

impl FailureAnalysis {
    /// Number of (category, repository) queries that failed.
    #[must_use]
    pub fn indeterminate(&self) -> usize {
        self.categories.iter().map(|c| c.indeterminate.len()).sum()
    }
}

/// Counts recent failed runs of each selected category in every repository of `org`.
///
/// Categories are narrowed by `filter` first. When none remain the
/// organization is not queried at all. A failed per-repository query counts
/// as zero and is recorded as indeterminate.
///
/// # Errors
///
/// Returns [`ListingError`] if the organization's repositories cannot be listed.
pub async fn analyze_failures(
    forge: &dyn Forge,
    scheduler: &Scheduler,
    org: &str,
    categories: &[String],
    filter: Option<&str>,
    limits: QueryLimits,
) -> Result<FailureAnalysis, ListingError> {
    let selected = select_categories(categories, filter);
    if selected.is_empty() {
        info!(filter = ?filter, "No workflow category matches the filter");
        return Ok(FailureAnalysis {
            org: org.to_string(),
            repositories: 0,
            categories: Vec::new(),
            abandoned: 0,
        });
    }

    let repositories = list_organization(forge, org, limits.page_size).await?;

    // Category-major, so each category's results stay in listing order.
    let pairs: Vec<(usize, String)> = (0..selected.len())
        .flat_map(|index| repositories.iter().map(move |repo| (index, repo.clone())))
        .collect();

    let selected_ref = &selected;
    let batch = scheduler
        .run(pairs, move |(index, repo): (usize, String)| async move {
            let workflow = selected_ref[index].name();
            let span = info_span!("analyze", repo = %repo, workflow);
            let result = forge
                .count_failed_runs(org, &repo, workflow, limits.run_window)
                .instrument(span)
                .await;
            (index, repo, result)
        })
        .await;

    let mut tallies: Vec<CategoryFailures> =
        selected.into_iter().map(CategoryFailures::new).collect();

    for (index, repo, result) in batch.completed {
        let tally = &mut tallies[index];
        match result {
            Ok(0) => {}
            Ok(count) => tally.failures.push(RepositoryFailures {
                repository: repo,
                count,
            }),
            Err(e) => {
                warn!(
                    repo = %repo,
                    workflow = tally.category.name(),
                    error = %e,
                    "Failed to query run history, counting as zero"
                );
                tally.indeterminate.push(repo);
            }
        }
    }

    for tally in &tallies {
        debug!(
            workflow = tally.category.name(),
            repositories = tally.failures.len(),
            total = tally.total(),
            "Category tallied"
        );
    }

    Ok(FailureAnalysis {
        org: org.to_string(),
        repositories: repositories.len(),
        categories: tallies,
        abandoned: batch.abandoned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::MemoryForge;
    use crate::forge::ForgeError;
    use crate::schedule::{CancelFlag, Schedule};
    use std::num::NonZeroUsize;

    const LIMITS: QueryLimits = QueryLimits {
        run_window: 10,
        page_size: 100,
    };

    fn sequential() -> Scheduler {
        Scheduler::new(Schedule::Sequential, CancelFlag::new())
    }

    fn categories(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn counts(tally: &CategoryFailures) -> Vec<(&str, u64)> {
        tally
            .failures
            .iter()
            .map(|f| (f.repository.as_str(), f.count))
            .collect()
    }

    #[tokio::test]
    async fn lists_only_repositories_with_failures() {
        let forge = MemoryForge::new()
            .with_repositories(&["x", "y"])
            .with_failed_runs("x", "CodeQL", 3);

        let analysis = analyze_failures(
            &forge,
            &sequential(),
            "acme",
            &categories(&["CodeQL"]),
            None,
            LIMITS,
        )
        .await
        .unwrap();

        assert_eq!(analysis.repositories, 2);
        assert_eq!(analysis.categories.len(), 1);
        assert_eq!(analysis.categories[0].category.header(), "CODEQL FAILURES");
        assert_eq!(counts(&analysis.categories[0]), [("x", 3)]);
    }

    #[tokio::test]
    async fn filter_narrows_categories() {
        let forge = MemoryForge::new()
            .with_repositories(&["x"])
            .with_failed_runs("x", "CodeQL Security Analysis", 1)
            .with_failed_runs("x", "Tests", 4);
        let defaults = categories(&DEFAULT_CATEGORIES);

        let analysis =
            analyze_failures(&forge, &sequential(), "acme", &defaults, Some("codeql"), LIMITS)
                .await
                .unwrap();

        assert_eq!(analysis.categories.len(), 1);
        assert_eq!(
            analysis.categories[0].category.name(),
            "CodeQL Security Analysis"
        );
        assert!(forge.calls().iter().all(|call| !call.ends_with("Tests")));
    }

    #[tokio::test]
    async fn unmatched_filter_skips_the_listing() {
        let forge = MemoryForge::new().failing_listing();

        let analysis = analyze_failures(
            &forge,
            &sequential(),
            "acme",
            &categories(&["Tests"]),
            Some("deploy"),
            LIMITS,
        )
        .await
        .unwrap();

        assert!(analysis.categories.is_empty());
        assert!(forge.calls().is_empty());
    }

    #[tokio::test]
    async fn listing_failure_is_fatal() {
        let forge = MemoryForge::new().failing_listing();

        let result = analyze_failures(
            &forge,
            &sequential(),
            "acme",
            &categories(&["Tests"]),
            None,
            LIMITS,
        )
        .await;

        let error = result.unwrap_err();
        assert_eq!(error.org, "acme");
        assert!(matches!(error.source, ForgeError::TimedOut { .. }));
    }

    #[tokio::test]
    async fn failed_query_counts_as_zero() {
        let forge = MemoryForge::new()
            .with_repositories(&["a", "b", "c"])
            .with_failed_runs("a", "Tests", 2)
            .with_failed_runs("c", "Tests", 1)
            .failing_run_query("b", "Tests");

        let analysis = analyze_failures(
            &forge,
            &sequential(),
            "acme",
            &categories(&["Tests"]),
            None,
            LIMITS,
        )
        .await
        .unwrap();

        let tally = &analysis.categories[0];
        assert_eq!(counts(tally), [("a", 2), ("c", 1)]);
        assert_eq!(tally.indeterminate, ["b"]);
        assert_eq!(analysis.indeterminate(), 1);
    }

    #[tokio::test]
    async fn counts_are_capped_by_the_run_window() {
        let forge = MemoryForge::new()
            .with_repositories(&["a"])
            .with_failed_runs("a", "Tests", 50);
        let limits = QueryLimits {
            run_window: 10,
            page_size: 100,
        };

        let analysis = analyze_failures(
            &forge,
            &sequential(),
            "acme",
            &categories(&["Tests"]),
            None,
            limits,
        )
        .await
        .unwrap();

        assert_eq!(counts(&analysis.categories[0]), [("a", 10)]);
    }

    #[tokio::test]
    async fn pool_keeps_listing_order() {
        let forge = MemoryForge::new()
            .with_repositories(&["r1", "r2", "r3", "r4"])
            .with_failed_runs("r1", "Lint", 1)
            .with_failed_runs("r3", "Lint", 3)
            .with_failed_runs("r4", "Lint", 4)
            .with_failed_runs("r2", "Docs", 2);
        let pool = Scheduler::new(
            Schedule::Pool {
                workers: NonZeroUsize::new(4).unwrap(),
            },
            CancelFlag::new(),
        );

        let analysis = analyze_failures(
            &forge,
            &pool,
            "acme",
            &categories(&["Lint", "Docs"]),
            None,
            LIMITS,
        )
        .await
        .unwrap();

        assert_eq!(counts(&analysis.categories[0]), [("r1", 1), ("r3", 3), ("r4", 4)]);
        assert_eq!(counts(&analysis.categories[1]), [("r2", 2)]);
    }
}
