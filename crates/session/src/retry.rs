//! Automatic retry policy for failed list loads.
//!
//! A failed load is retried a fixed number of times at a fixed spacing,
//! then left for the user to retry by hand. Only loads are retried;
//! save, unsave and delete never are.

use std::time::Duration;

use tripsync_client::config::env_or;

/// Default number of automatic retries after the first failed load.
pub const DEFAULT_LOAD_RETRY_ATTEMPTS: u32 = 3;

/// Default spacing between automatic retries in seconds.
pub const DEFAULT_LOAD_RETRY_DELAY_SECS: u64 = 30;

/// Tunable parameters for load retries.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRetryPolicy {
    /// Retries after the initial attempt. Zero disables auto-retry.
    pub max_retries: u32,
    /// Wait before each retry.
    pub delay: Duration,
}

impl Default for LoadRetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_LOAD_RETRY_ATTEMPTS,
            delay: Duration::from_secs(DEFAULT_LOAD_RETRY_DELAY_SECS),
        }
    }
}

impl LoadRetryPolicy {
    /// Load the policy from environment variables with defaults.
    ///
    /// | Env Var                          | Default |
    /// |----------------------------------|---------|
    /// | `TRIPSYNC_LOAD_RETRY_ATTEMPTS`   | `3`     |
    /// | `TRIPSYNC_LOAD_RETRY_DELAY_SECS` | `30`    |
    pub fn from_env() -> Self {
        Self {
            max_retries: env_or("TRIPSYNC_LOAD_RETRY_ATTEMPTS", DEFAULT_LOAD_RETRY_ATTEMPTS),
            delay: Duration::from_secs(env_or(
                "TRIPSYNC_LOAD_RETRY_DELAY_SECS",
                DEFAULT_LOAD_RETRY_DELAY_SECS,
            )),
        }
    }

    /// Delay before retry number `retry` (1-based), or `None` once the
    /// retries are used up.
    pub fn delay_for(&self, retry: u32) -> Option<Duration> {
        (1..=self.max_retries)
            .contains(&retry)
            .then_some(self.delay)
    }
}
