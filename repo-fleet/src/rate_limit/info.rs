//! Rate limit information.

use std::time::Duration;

/// Maximum time to wait for a rate limit reset (1 hour).
const MAX_WAIT_SECS: u64 = 3600;

/// Minimum remaining requests before proactively waiting.
const MIN_REMAINING_THRESHOLD: u32 = 5;

/// Snapshot of the GitHub core rate limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Requests remaining in the current window.
    pub remaining: u32,

    /// Unix timestamp when the rate limit resets.
    pub reset: u64,

    /// Total requests allowed per window.
    pub limit: u32,
}

impl RateLimitInfo {
    /// How long to pause before the next request, given the current time `now`.
    ///
    /// Returns `None` while enough requests remain or once the reset time
    /// has passed. Waits are capped at one hour.
    #[must_use]
    pub fn wait_duration(&self, now: u64) -> Option<Duration> {
        if self.remaining >= MIN_REMAINING_THRESHOLD || self.reset <= now {
            return None;
        }
        Some(Duration::from_secs((self.reset - now).min(MAX_WAIT_SECS)))
    }
}
