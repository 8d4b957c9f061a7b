//! Working-tree drift detection.
//!
//! A repository has drifted when `git status --porcelain` reports anything:
//! modified, staged, deleted or untracked paths. Detection never mutates the
//! repository.

use crate::discovery::Repository;
use crate::vcs::VersionControl;
use serde::Serialize;
use tracing::{debug, info_span, warn, Instrument};

/// Status lines kept per drifted repository.
pub const MAX_STATUS_LINES: usize = 8;

const STATUS_ARGS: [&str; 2] = ["status", "--porcelain"];

/// A repository with uncommitted or untracked changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    /// Repository with changes.
    pub repository: Repository,

    /// Short-form status lines, at most [`MAX_STATUS_LINES`].
    pub lines: Vec<String>,

    /// Number of changed paths before truncation.
    pub total: usize,
}

impl DriftReport {
    /// Number of status lines left out of [`lines`](Self::lines).
    #[must_use]
    pub fn hidden(&self) -> usize {
        self.total - self.lines.len()
    }
}

/// Outcome of checking one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriftStatus {
    /// Nothing to report.
    Clean,

    /// Working tree differs from the last commit.
    Drifted(DriftReport),

    /// The status query failed.
    Indeterminate {
        /// Why the query failed.
        reason: String,
    },
}

/// Queries the working-tree status of `repository`.
pub async fn detect_drift(vcs: &dyn VersionControl, repository: &Repository) -> DriftStatus {
    let span = info_span!("check", repo = %repository.name);

    async {
        let output = match vcs.run(&repository.path, &STATUS_ARGS).await {
            Ok(output) if output.success => output,
            Ok(output) => {
                let reason = output.diagnostic();
                warn!(reason = %reason, "Status query failed");
                return DriftStatus::Indeterminate { reason };
            }
            Err(e) => {
                warn!(error = %e, "Status query failed");
                return DriftStatus::Indeterminate {
                    reason: e.to_string(),
                };
            }
        };

        let status = parse_status(repository, &output.stdout);
        debug!(drifted = matches!(status, DriftStatus::Drifted(_)), "Checked");
        status
    }
    .instrument(span)
    .await
}

/// Turns porcelain output into a [`DriftStatus`].
///
/// Leading spaces are significant in porcelain lines, so only trailing
/// whitespace is stripped from each line.
fn parse_status(repository: &Repository, stdout: &str) -> DriftStatus {
    if stdout.trim().is_empty() {
        return DriftStatus::Clean;
    }

    let changed: Vec<&str> = stdout
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect();

    DriftStatus::Drifted(DriftReport {
        repository: repository.clone(),
        lines: changed
            .iter()
            .take(MAX_STATUS_LINES)
            .map(|line| line.to_string())
            .collect(),
        total: changed.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::{CommandOutput, VcsError};
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};

    struct FixedStatus(Result<CommandOutput, String>);

    #[async_trait]
    impl VersionControl for FixedStatus {
        async fn run(&self, _repo: &Path, args: &[&str]) -> Result<CommandOutput, VcsError> {
            assert_eq!(args, STATUS_ARGS);
            self.0.clone().map_err(|message| VcsError::Spawn {
                command: args.join(" "),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, message),
            })
        }
    }

    fn repo() -> Repository {
        Repository::new(PathBuf::from("/fleet/web"))
    }

    #[tokio::test]
    async fn empty_status_is_clean() {
        let git = FixedStatus(Ok(CommandOutput::ok("\n")));
        assert_eq!(detect_drift(&git, &repo()).await, DriftStatus::Clean);
    }

    #[tokio::test]
    async fn keeps_leading_status_columns() {
        let git = FixedStatus(Ok(CommandOutput::ok(" M src/main.rs\n?? notes.md\n")));

        let DriftStatus::Drifted(report) = detect_drift(&git, &repo()).await else {
            panic!("expected drift");
        };

        assert_eq!(report.lines, [" M src/main.rs", "?? notes.md"]);
        assert_eq!(report.total, 2);
        assert_eq!(report.hidden(), 0);
    }

    #[tokio::test]
    async fn truncates_long_status() {
        let stdout: String = (0..12).map(|i| format!("?? file{i}.txt\n")).collect();
        let git = FixedStatus(Ok(CommandOutput::ok(stdout)));

        let DriftStatus::Drifted(report) = detect_drift(&git, &repo()).await else {
            panic!("expected drift");
        };

        assert_eq!(report.lines.len(), MAX_STATUS_LINES);
        assert_eq!(report.lines[0], "?? file0.txt");
        assert_eq!(report.total, 12);
        assert_eq!(report.hidden(), 4);
    }

    #[tokio::test]
    async fn failed_query_is_indeterminate() {
        let git = FixedStatus(Err("permission denied".to_string()));

        let status = detect_drift(&git, &repo()).await;

        assert!(matches!(status, DriftStatus::Indeterminate { .. }));
    }

    #[tokio::test]
    async fn non_zero_exit_is_indeterminate() {
        let git = FixedStatus(Ok(CommandOutput::failed("fatal: not a git repository")));

        let status = detect_drift(&git, &repo()).await;

        assert_eq!(
            status,
            DriftStatus::Indeterminate {
                reason: "fatal: not a git repository".to_string()
            }
        );
    }

    #[tokio::test]
    async fn detection_is_idempotent() {
        let git = FixedStatus(Ok(CommandOutput::ok("?? a.txt\n?? b.txt\n")));

        let first = detect_drift(&git, &repo()).await;
        let second = detect_drift(&git, &repo()).await;

        assert_eq!(first, second);
    }
}
