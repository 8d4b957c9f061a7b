//! On-disk `fleet.toml` layout.

use serde::Deserialize;
use std::path::PathBuf;

/// Raw contents of a `fleet.toml` file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct ConfigFile {
    /// Directory whose immediate children are scanned for repositories.
    pub root: Option<PathBuf>,

    /// GitHub organization audited by `analyze` and `pages`.
    pub org: Option<String>,

    /// How many recent failed runs are counted per workflow.
    pub run_window: Option<u8>,

    /// Repositories requested from the organization listing.
    pub page_size: Option<u8>,

    /// Worker count used when running in parallel.
    pub workers: Option<usize>,

    /// Per external call timeout.
    pub timeout_secs: Option<u64>,

    /// Workflow file whose presence declares a Pages deployment.
    pub pages_workflow: Option<String>,

    /// Workflow names tallied by `analyze`.
    pub categories: Option<Vec<String>>,

    /// GitHub Enterprise API base URL.
    pub api_url: Option<String>,
}
