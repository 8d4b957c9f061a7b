//! Fleet configuration.
//!
//! Settings come from an optional `fleet.toml` file and are then overridden
//! by whatever the caller passes explicitly (usually CLI flags).

mod error;
mod file;

pub use error::ConfigError;

use crate::analyze::DEFAULT_CATEGORIES;
use file::ConfigFile;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Environment variables consulted for a GitHub token, in order.
const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Default number of recent failed runs counted per workflow.
pub const DEFAULT_RUN_WINDOW: u8 = 10;

/// Default (and maximum) page size for the organization listing.
pub const DEFAULT_PAGE_SIZE: u8 = 100;

/// Default per-call timeout for git and GitHub calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default workflow file that marks a repository as publishing to Pages.
pub const DEFAULT_PAGES_WORKFLOW: &str = ".github/workflows/pages.yml";

/// Resolved configuration shared by every command.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    root: PathBuf,
    org: Option<String>,
    run_window: u8,
    page_size: u8,
    workers: NonZeroUsize,
    timeout: Duration,
    pages_workflow: String,
    categories: Vec<String>,
    api_url: Option<Url>,
    token: Option<String>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            org: None,
            run_window: DEFAULT_RUN_WINDOW,
            page_size: DEFAULT_PAGE_SIZE,
            workers: default_workers(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            pages_workflow: DEFAULT_PAGES_WORKFLOW.to_string(),
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            api_url: None,
            token: None,
        }
    }
}

fn default_workers() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

impl FleetConfig {
    /// Loads configuration from `path`.
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read, parsed
    /// or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No fleet config found, using defaults");
            return Ok(Self::default());
        }

        info!(path = %path.display(), "Loading fleet config");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&contents, path)
    }

    /// Parses configuration from TOML text. `origin` is only used in errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on malformed TOML or invalid values.
    pub fn from_toml(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|source| ConfigError::TomlError {
                path: origin.display().to_string(),
                source,
            })?;
        Self::from_file(file, origin)
    }

    fn from_file(file: ConfigFile, origin: &Path) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::ValidationError {
            path: origin.display().to_string(),
            message,
        };
        let defaults = Self::default();

        let run_window = file.run_window.unwrap_or(defaults.run_window);
        if !(1..=100).contains(&run_window) {
            return Err(invalid(format!(
                "run-window must be between 1 and 100, got {run_window}"
            )));
        }

        let page_size = file.page_size.unwrap_or(defaults.page_size);
        if !(1..=100).contains(&page_size) {
            return Err(invalid(format!(
                "page-size must be between 1 and 100, got {page_size}"
            )));
        }

        let workers = match file.workers {
            Some(n) => NonZeroUsize::new(n)
                .ok_or_else(|| invalid("workers must be at least 1".to_string()))?,
            None => defaults.workers,
        };

        let timeout = match file.timeout_secs {
            Some(0) => return Err(invalid("timeout-secs must be at least 1".to_string())),
            Some(secs) => Duration::from_secs(secs),
            None => defaults.timeout,
        };

        let categories = file.categories.unwrap_or(defaults.categories);
        if categories.iter().any(|c| c.trim().is_empty()) {
            return Err(invalid("categories must not contain empty names".to_string()));
        }

        let api_url = file
            .api_url
            .map(|raw| {
                Url::parse(&raw)
                    .map_err(|e| invalid(format!("api-url is not a valid URL: {raw} ({e})")))
            })
            .transpose()?;

        let org = file.org.filter(|o| !o.trim().is_empty());

        Ok(Self {
            root: file.root.unwrap_or(defaults.root),
            org,
            run_window,
            page_size,
            workers,
            timeout,
            pages_workflow: file.pages_workflow.unwrap_or(defaults.pages_workflow),
            categories,
            api_url,
            token: None,
        })
    }

    /// Overrides the fleet root.
    pub fn with_root(mut self, root: PathBuf) -> Self {
        self.root = root;
        self
    }

    /// Overrides the organization.
    pub fn with_org(mut self, org: String) -> Self {
        self.org = Some(org);
        self
    }

    /// Overrides the worker count used by the pool scheduler.
    pub fn with_workers(mut self, workers: NonZeroUsize) -> Self {
        self.workers = workers;
        self
    }

    /// Overrides the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the workflow categories.
    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    /// Sets the GitHub token. Falls back to the environment when `None`.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.or_else(token_from_env);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn org(&self) -> Option<&str> {
        self.org.as_deref()
    }

    pub fn run_window(&self) -> u8 {
        self.run_window
    }

    pub fn page_size(&self) -> u8 {
        self.page_size
    }

    pub fn workers(&self) -> NonZeroUsize {
        self.workers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn pages_workflow(&self) -> &str {
        &self.pages_workflow
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn api_url(&self) -> Option<&Url> {
        self.api_url.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Reads a GitHub token from the first non-empty known environment variable.
pub fn token_from_env() -> Option<String> {
    TOKEN_ENV_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn origin() -> &'static Path {
        Path::new("fleet.toml")
    }

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = FleetConfig::load(&temp.path().join("fleet.toml")).unwrap();

        assert_eq!(config.root(), Path::new("."));
        assert_eq!(config.run_window(), DEFAULT_RUN_WINDOW);
        assert_eq!(config.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(config.pages_workflow(), DEFAULT_PAGES_WORKFLOW);
        assert_eq!(config.categories().len(), DEFAULT_CATEGORIES.len());
        assert!(config.org().is_none());
    }

    #[test]
    fn loads_values_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fleet.toml");
        fs::write(
            &path,
            r#"
root = "/srv/repos"
org = "acme"
run-window = 5
page-size = 50
workers = 3
timeout-secs = 30
pages-workflow = ".github/workflows/docs.yml"
categories = ["CodeQL", "Tests"]
api-url = "https://ghe.example.com/api/v3/"
"#,
        )
        .unwrap();

        let config = FleetConfig::load(&path).unwrap();

        assert_eq!(config.root(), Path::new("/srv/repos"));
        assert_eq!(config.org(), Some("acme"));
        assert_eq!(config.run_window(), 5);
        assert_eq!(config.page_size(), 50);
        assert_eq!(config.workers().get(), 3);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.pages_workflow(), ".github/workflows/docs.yml");
        assert_eq!(config.categories(), ["CodeQL", "Tests"]);
        assert_eq!(
            config.api_url().map(Url::as_str),
            Some("https://ghe.example.com/api/v3/")
        );
    }

    #[test]
    fn readme_example_loads() {
        let readme = include_str!("../../README.MD");
        let example = readme
            .split("```toml\n")
            .nth(1)
            .and_then(|rest| rest.split("```").next())
            .unwrap();

        let config = FleetConfig::from_toml(example, origin()).unwrap();

        assert!(config.root().is_absolute());
        assert_eq!(config.org(), Some("acme"));
    }

    #[test]
    fn rejects_zero_run_window() {
        let result = FleetConfig::from_toml("run-window = 0", origin());
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn rejects_oversized_page() {
        let result = FleetConfig::from_toml("page-size = 101", origin());
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn rejects_invalid_api_url() {
        let result = FleetConfig::from_toml(r#"api-url = "not a url""#, origin());
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn rejects_malformed_toml() {
        let result = FleetConfig::from_toml("root = [", origin());
        assert!(matches!(result, Err(ConfigError::TomlError { .. })));
    }

    #[test]
    fn blank_org_is_treated_as_unset() {
        let config = FleetConfig::from_toml(r#"org = "  ""#, origin()).unwrap();
        assert!(config.org().is_none());
    }

    #[test]
    fn explicit_token_wins_over_environment() {
        temp_env::with_var("GITHUB_TOKEN", Some("from-env"), || {
            let config = FleetConfig::default().with_token(Some("explicit".to_string()));
            assert_eq!(config.token(), Some("explicit"));
        });
    }

    #[test]
    fn token_falls_back_to_gh_token() {
        temp_env::with_vars(
            [("GITHUB_TOKEN", None), ("GH_TOKEN", Some("gh-cli"))],
            || {
                let config = FleetConfig::default().with_token(None);
                assert_eq!(config.token(), Some("gh-cli"));
            },
        );
    }

    #[test]
    fn no_token_when_environment_is_empty() {
        temp_env::with_vars_unset(["GITHUB_TOKEN", "GH_TOKEN"], || {
            assert!(token_from_env().is_none());
        });
    }
}
