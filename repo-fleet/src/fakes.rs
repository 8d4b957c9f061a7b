//! In-memory fakes for the capability traits (tests and the `test-support` feature only)
//!
//! Provides `MemoryGit` and `MemoryForge`, which answer from scripted data
//! without spawning processes or touching the network.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::forge::{Forge, ForgeError};
use crate::vcs::{CommandOutput, VcsError, VersionControl};

fn unreachable(operation: &'static str) -> ForgeError {
    ForgeError::TimedOut {
        operation,
        timeout_secs: 0,
    }
}

// ---------------------------------------------------------------------------
// MemoryGit
// ---------------------------------------------------------------------------

/// Scripted git keyed by repository directory name and subcommand.
///
/// Unscripted commands succeed with empty output, which reads as a clean,
/// up-to-date repository.
#[derive(Debug, Default)]
pub struct MemoryGit {
    responses: Mutex<HashMap<(String, String), Result<CommandOutput, String>>>,
    calls: Mutex<Vec<String>>,
}

impl MemoryGit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `git <subcommand>` in `repo` with `output`.
    pub fn respond(&self, repo: &str, subcommand: &str, output: CommandOutput) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((repo.to_string(), subcommand.to_string()), Ok(output));
    }

    /// Makes `git <subcommand>` in `repo` fail to start.
    pub fn fail_to_run(&self, repo: &str, subcommand: &str, message: &str) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                (repo.to_string(), subcommand.to_string()),
                Err(message.to_string()),
            );
    }

    /// Every invocation so far, formatted as `repo: args`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl VersionControl for MemoryGit {
    async fn run(&self, repo: &Path, args: &[&str]) -> Result<CommandOutput, VcsError> {
        let name = repo
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let command = args.join(" ");
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{name}: {command}"));

        let subcommand = args.first().copied().unwrap_or_default().to_string();
        let response = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(name, subcommand))
            .cloned();

        match response {
            None => Ok(CommandOutput::ok("")),
            Some(Ok(output)) => Ok(output),
            Some(Err(message)) => Err(VcsError::Spawn {
                command,
                source: std::io::Error::other(message),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryForge
// ---------------------------------------------------------------------------

/// Scripted forge for a single organization.
#[derive(Debug, Default)]
pub struct MemoryForge {
    repositories: Vec<String>,
    listing_fails: bool,
    failed_runs: HashMap<(String, String), u64>,
    failing_run_queries: HashSet<(String, String)>,
    files: HashSet<(String, String)>,
    failing_file_probes: HashSet<String>,
    pages: HashSet<String>,
    failing_pages_probes: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MemoryForge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repositories(mut self, names: &[&str]) -> Self {
        self.repositories = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    /// Records `count` recent failed runs of `workflow` in `repo`.
    pub fn with_failed_runs(mut self, repo: &str, workflow: &str, count: u64) -> Self {
        self.failed_runs
            .insert((repo.to_string(), workflow.to_lowercase()), count);
        self
    }

    pub fn failing_run_query(mut self, repo: &str, workflow: &str) -> Self {
        self.failing_run_queries
            .insert((repo.to_string(), workflow.to_lowercase()));
        self
    }

    pub fn with_file(mut self, repo: &str, path: &str) -> Self {
        self.files.insert((repo.to_string(), path.to_string()));
        self
    }

    pub fn failing_file_probe(mut self, repo: &str) -> Self {
        self.failing_file_probes.insert(repo.to_string());
        self
    }

    pub fn with_pages(mut self, repo: &str) -> Self {
        self.pages.insert(repo.to_string());
        self
    }

    pub fn failing_pages_probe(mut self, repo: &str) -> Self {
        self.failing_pages_probes.insert(repo.to_string());
        self
    }

    /// Every query so far, e.g. `runs x CodeQL`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, call: String) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

#[async_trait]
impl Forge for MemoryForge {
    async fn list_repositories(
        &self,
        org: &str,
        page_size: u8,
    ) -> Result<Vec<String>, ForgeError> {
        self.record(format!("list {org}"));
        if self.listing_fails {
            return Err(unreachable("repository listing"));
        }
        Ok(self
            .repositories
            .iter()
            .take(usize::from(page_size))
            .cloned()
            .collect())
    }

    async fn count_failed_runs(
        &self,
        _org: &str,
        repo: &str,
        workflow: &str,
        window: u8,
    ) -> Result<u64, ForgeError> {
        self.record(format!("runs {repo} {workflow}"));
        let key = (repo.to_string(), workflow.to_lowercase());
        if self.failing_run_queries.contains(&key) {
            return Err(unreachable("run history query"));
        }
        let count = self.failed_runs.get(&key).copied().unwrap_or(0);
        Ok(count.min(u64::from(window)))
    }

    async fn file_exists(&self, _org: &str, repo: &str, path: &str) -> Result<bool, ForgeError> {
        self.record(format!("file {repo} {path}"));
        if self.failing_file_probes.contains(repo) {
            return Err(unreachable("content lookup"));
        }
        Ok(self.files.contains(&(repo.to_string(), path.to_string())))
    }

    async fn pages_enabled(&self, _org: &str, repo: &str) -> Result<bool, ForgeError> {
        self.record(format!("pages {repo}"));
        if self.failing_pages_probes.contains(repo) {
            return Err(unreachable("pages lookup"));
        }
        Ok(self.pages.contains(repo))
    }
}
