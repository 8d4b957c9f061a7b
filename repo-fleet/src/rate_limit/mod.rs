//! Rate limiting for the GitHub core API.
//!
//! Before each query the forge checks the remaining budget and sleeps until
//! the reset when it is nearly exhausted.

mod info;

pub use info::RateLimitInfo;

use octocrab::Octocrab;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::info;

/// Fetches the current core rate limit.
///
/// # Errors
///
/// Returns an error if the rate limit API call fails.
pub async fn check_core_rate_limit(octocrab: &Octocrab) -> Result<RateLimitInfo, octocrab::Error> {
    let rate_limit = octocrab.ratelimit().get().await?;
    let core = &rate_limit.resources.core;

    Ok(RateLimitInfo {
        remaining: core.remaining as u32,
        reset: core.reset,
        limit: core.limit as u32,
    })
}

/// Sleeps until the reset if the core budget is nearly used up.
///
/// The sleep never exceeds `cap`, so a caller with a time budget keeps it.
pub async fn wait_for_reset(limit: &RateLimitInfo, cap: Duration) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    if let Some(wait) = limit.wait_duration(now) {
        let wait = wait.min(cap);
        info!(
            remaining = limit.remaining,
            wait_secs = wait.as_secs(),
            "Rate limit low, waiting for reset"
        );
        tokio::time::sleep(wait).await;
    }
}
