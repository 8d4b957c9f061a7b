//! Three-valued existence probes.

use super::ForgeError;
use serde::Serialize;
use std::fmt;

/// Result of asking the forge whether something exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Probe {
    /// The forge confirmed it exists.
    Present,

    /// The forge confirmed it does not exist.
    Absent,

    /// The query failed, so the answer is unknown.
    Indeterminate {
        /// Why the query failed.
        reason: String,
    },
}

impl Probe {
    /// Collapses the probe to a boolean for display.
    ///
    /// `Indeterminate` collapses to `false`: an unanswered probe is reported
    /// as absent. Callers that need to tell the two apart match on the enum.
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present)
    }

    #[must_use]
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, Self::Indeterminate { .. })
    }
}

impl From<Result<bool, ForgeError>> for Probe {
    fn from(result: Result<bool, ForgeError>) -> Self {
        match result {
            Ok(true) => Self::Present,
            Ok(false) => Self::Absent,
            Err(e) => Self::Indeterminate {
                reason: e.to_string(),
            },
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => f.write_str("present"),
            Self::Absent => f.write_str("absent"),
            Self::Indeterminate { reason } => write!(f, "unknown ({reason})"),
        }
    }
}
