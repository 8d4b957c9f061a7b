//! Repository sync: fetch every remote, then integrate the current branch.

mod outcome;

pub use outcome::{SyncOutcome, SyncStatus};

use crate::discovery::Repository;
use crate::vcs::VersionControl;
use tracing::{debug, info, info_span, warn, Instrument};

const FETCH_ARGS: [&str; 3] = ["fetch", "--all", "--prune"];
const INTEGRATE_ARGS: [&str; 3] = ["pull", "--no-edit", "--no-rebase"];

/// Syncs one repository and classifies the result.
///
/// In dry-run mode no git command is executed and the outcome is
/// [`SyncStatus::Skipped`]. This is the only operation that modifies a
/// working tree.
pub async fn sync_repository(
    vcs: &dyn VersionControl,
    repository: &Repository,
    dry_run: bool,
) -> SyncOutcome {
    let span = info_span!("sync", repo = %repository.name);

    async {
        if dry_run {
            debug!("Dry run, not invoking git");
            return SyncOutcome {
                repository: repository.clone(),
                status: SyncStatus::Skipped,
                diagnostic: "dry run".to_string(),
            };
        }

        // Integrate only after a successful fetch. The failing step's text
        // leads so that the first line names the failure.
        let result = match run_step(vcs, repository, &FETCH_ARGS).await {
            Ok(fetched) => match run_step(vcs, repository, &INTEGRATE_ARGS).await {
                Ok(pulled) => Ok(combine(&fetched, &pulled)),
                Err(failure) => Err(combine(&failure, &fetched)),
            },
            Err(failure) => Err(failure),
        };

        match result {
            Ok(diagnostic) => {
                info!("Synced");
                SyncOutcome {
                    repository: repository.clone(),
                    status: SyncStatus::Synced,
                    diagnostic,
                }
            }
            Err(diagnostic) => {
                warn!(diagnostic = %diagnostic, "Sync failed");
                SyncOutcome {
                    repository: repository.clone(),
                    status: SyncStatus::Conflicted,
                    diagnostic,
                }
            }
        }
    }
    .instrument(span)
    .await
}

/// Runs one git step, returning its diagnostic text either way.
async fn run_step(
    vcs: &dyn VersionControl,
    repository: &Repository,
    args: &[&str],
) -> Result<String, String> {
    match vcs.run(&repository.path, args).await {
        Ok(output) if output.success => Ok(output.diagnostic()),
        Ok(output) => {
            let diagnostic = output.diagnostic();
            if diagnostic.is_empty() {
                Err(format!("git {} failed", args.join(" ")))
            } else {
                Err(diagnostic)
            }
        }
        Err(e) => Err(e.to_string()),
    }
}

fn combine(first: &str, second: &str) -> String {
    match (first.is_empty(), second.is_empty()) {
        (_, true) => first.to_string(),
        (true, false) => second.to_string(),
        (false, false) => format!("{first}\n{second}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::{CommandOutput, VcsError};
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// Answers each git subcommand with a canned result and records calls.
    #[derive(Default)]
    struct ScriptedGit {
        fetch: Option<CommandOutput>,
        pull: Option<CommandOutput>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl VersionControl for ScriptedGit {
        async fn run(&self, _repo: &Path, args: &[&str]) -> Result<CommandOutput, VcsError> {
            self.calls.lock().unwrap().push(args.join(" "));
            let scripted = match args[0] {
                "fetch" => self.fetch.clone(),
                "pull" => self.pull.clone(),
                _ => None,
            };
            scripted.ok_or_else(|| VcsError::TimedOut {
                command: args.join(" "),
                timeout_secs: 1,
            })
        }
    }

    fn repo() -> Repository {
        Repository::new(PathBuf::from("/fleet/service"))
    }

    #[tokio::test]
    async fn both_steps_succeed() {
        let git = ScriptedGit {
            fetch: Some(CommandOutput::ok("")),
            pull: Some(CommandOutput::ok("Already up to date.")),
            ..Default::default()
        };

        let outcome = sync_repository(&git, &repo(), false).await;

        assert_eq!(outcome.status, SyncStatus::Synced);
        assert_eq!(outcome.diagnostic, "Already up to date.");
        assert_eq!(
            *git.calls.lock().unwrap(),
            ["fetch --all --prune", "pull --no-edit --no-rebase"]
        );
    }

    #[tokio::test]
    async fn merge_conflict_is_conflicted() {
        let git = ScriptedGit {
            fetch: Some(CommandOutput::ok("")),
            pull: Some(CommandOutput::failed(
                "CONFLICT (content): Merge conflict in src/lib.rs\nAutomatic merge failed",
            )),
            ..Default::default()
        };

        let outcome = sync_repository(&git, &repo(), false).await;

        assert_eq!(outcome.status, SyncStatus::Conflicted);
        assert_eq!(
            outcome.reason(),
            "CONFLICT (content): Merge conflict in src/lib.rs"
        );
    }

    #[tokio::test]
    async fn fetch_warnings_are_kept_after_a_failed_pull() {
        let git = ScriptedGit {
            fetch: Some(CommandOutput {
                success: true,
                stdout: String::new(),
                stderr: "warning: redirecting to https://example.com/service.git/".to_string(),
            }),
            pull: Some(CommandOutput::failed("CONFLICT (content): Merge conflict in a.rs")),
            ..Default::default()
        };

        let outcome = sync_repository(&git, &repo(), false).await;

        assert_eq!(outcome.status, SyncStatus::Conflicted);
        assert_eq!(outcome.reason(), "CONFLICT (content): Merge conflict in a.rs");
        assert_eq!(
            outcome.diagnostic,
            "CONFLICT (content): Merge conflict in a.rs\n\
             warning: redirecting to https://example.com/service.git/"
        );
    }

    #[tokio::test]
    async fn failed_fetch_skips_integrate() {
        let git = ScriptedGit {
            fetch: Some(CommandOutput::failed("fatal: could not read from remote")),
            pull: Some(CommandOutput::ok("")),
            ..Default::default()
        };

        let outcome = sync_repository(&git, &repo(), false).await;

        assert_eq!(outcome.status, SyncStatus::Conflicted);
        assert_eq!(git.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn timeout_is_conflicted() {
        let git = ScriptedGit::default();

        let outcome = sync_repository(&git, &repo(), false).await;

        assert_eq!(outcome.status, SyncStatus::Conflicted);
        assert!(outcome.diagnostic.contains("timed out"));
    }

    #[tokio::test]
    async fn silent_failure_names_the_command() {
        let git = ScriptedGit {
            fetch: Some(CommandOutput::ok("")),
            pull: Some(CommandOutput::failed("")),
            ..Default::default()
        };

        let outcome = sync_repository(&git, &repo(), false).await;

        assert_eq!(outcome.reason(), "git pull --no-edit --no-rebase failed");
    }

    #[tokio::test]
    async fn dry_run_never_calls_git() {
        let git = ScriptedGit::default();

        let outcome = sync_repository(&git, &repo(), true).await;

        assert_eq!(outcome.status, SyncStatus::Skipped);
        assert!(git.calls.lock().unwrap().is_empty());
    }
}
