//! CLI for repo-fleet.
//!
//! Syncs local clones, reports drift and audits CI health across a GitHub
//! organization. Reports go to stdout, logs to stderr.

use clap::{Parser, Subcommand};
use repo_fleet::{CancelFlag, FleetConfig, ReportRenderer, Runner, RunnerError};
use std::io;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Repo Fleet - Keep local clones in sync and audit CI health on GitHub.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the fleet config file. A missing file means defaults.
    #[arg(long, global = true, default_value = "fleet.toml")]
    config: PathBuf,

    /// Directory whose immediate subdirectories are the fleet.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// GitHub organization for `analyze` and `pages`.
    #[arg(long, global = true)]
    org: Option<String>,

    /// GitHub Personal Access Token.
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Process repositories concurrently.
    #[arg(long, global = true)]
    parallel: bool,

    /// Maximum concurrent units with `--parallel`.
    #[arg(long, global = true)]
    workers: Option<NonZeroUsize>,

    /// Timeout for each git invocation and API call, in seconds.
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and integrate every repository under the root.
    Sync {
        /// List the repositories without running git.
        #[arg(long)]
        dry_run: bool,
    },

    /// Report uncommitted and untracked changes.
    Check,

    /// Tally recent failed workflow runs per category.
    Analyze {
        /// Only categories whose name contains this text (case-insensitive).
        #[arg(long)]
        workflow: Option<String>,
    },

    /// Find repositories with a Pages workflow but Pages disabled.
    Pages,
}

#[tokio::main]
async fn main() -> ExitCode {
    // octocrab's TLS stack needs a process-level provider before any client is built
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    init_tracing();
    let args = Args::parse();

    match run(args).await {
        Ok(report) => {
            print!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Sets up the global tracing subscriber with:
/// - Compact log formatting on stderr (stdout carries the report)
/// - Log level filtering via `RUST_LOG` env var (defaults to "info")
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Merges flags over the config file.
fn resolve_config(args: &Args) -> Result<FleetConfig, RunnerError> {
    let mut config = FleetConfig::load(&args.config)?;
    if let Some(root) = &args.root {
        config = config.with_root(root.clone());
    }
    if let Some(org) = &args.org {
        config = config.with_org(org.clone());
    }
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    if let Some(secs) = args.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    Ok(config.with_token(args.token.clone()))
}

/// Stops scheduling new units on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancelFlag {
    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing in-flight work");
            flag.cancel();
        }
    });
    cancel
}

/// Main execution logic.
async fn run(args: Args) -> Result<String, RunnerError> {
    let config = resolve_config(&args)?;
    let runner = Runner::new(config, args.parallel, cancel_on_ctrl_c());
    let renderer = ReportRenderer::new()?;

    let report = match &args.command {
        Command::Sync { dry_run } => renderer.render_sync(&runner.sync(*dry_run).await?)?,
        Command::Check => renderer.render_check(&runner.check().await?)?,
        Command::Analyze { workflow } => {
            renderer.render_analysis(&runner.analyze(workflow.as_deref()).await?)?
        }
        Command::Pages => renderer.render_pages(&runner.pages().await?)?,
    };
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(root: &TempDir, command: &[&str]) -> Args {
        let root = root.path().to_string_lossy().into_owned();
        let config = root.clone() + "/fleet.toml";
        let mut argv = vec!["fleet", "--config", config.as_str(), "--root", root.as_str()];
        argv.extend_from_slice(command);
        Args::parse_from(argv)
    }

    #[tokio::test]
    async fn check_runs_on_an_empty_fleet() {
        let root = TempDir::new().unwrap();

        let report = run(args(&root, &["check"])).await.unwrap();

        assert_eq!(report, "All repositories are clean!\n");
    }

    #[tokio::test]
    async fn dry_run_sync_lists_repositories() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("api/.git")).unwrap();

        let report = run(args(&root, &["sync", "--dry-run"])).await.unwrap();

        assert_eq!(
            report,
            "api: - (dry run)\nSynced: 0, Failed: 0, Skipped: 1\n"
        );
    }

    #[tokio::test]
    async fn pages_without_an_org_is_a_critical_failure() {
        let root = TempDir::new().unwrap();

        let result = run(args(&root, &["pages"])).await;

        assert!(matches!(result, Err(RunnerError::MissingOrg)));
    }
}
