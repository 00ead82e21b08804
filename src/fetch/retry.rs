//! Fixed-delay retry policy for transport-level failures.
//!
//! The policy counts total attempts, not additional retries: a budget of `1`
//! means a single attempt with no waiting. Between consecutive attempts the
//! policy waits the same fixed delay.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use letter_harvester::fetch::{RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::new(3, Duration::from_secs(5));
//! assert!(matches!(policy.should_retry(1), RetryDecision::Retry { attempt: 2, .. }));
//! assert!(matches!(policy.should_retry(3), RetryDecision::DoNotRetry { .. }));
//! ```

use std::future::Future;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use super::FetchError;

/// Default attempt budget (a single attempt).
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Default delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Decision on whether to make another attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait `delay`, then make attempt number `attempt`.
    Retry {
        /// How long to wait before the next attempt.
        delay: Duration,
        /// The 1-indexed number of the next attempt.
        attempt: u32,
    },

    /// Give up.
    DoNotRetry {
        /// Human-readable reason.
        reason: String,
    },
}

/// Attempt budget and fixed delay for transport failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one (always >= 1).
    max_attempts: u32,

    /// Fixed wait between attempts.
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Returns the configured attempt budget.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the fixed delay between attempts.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Decides what to do after attempt number `attempt` (1-indexed) failed.
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }
        RetryDecision::Retry {
            delay: self.delay,
            attempt: attempt + 1,
        }
    }
}

/// Runs `operation` until it succeeds or the policy's attempt budget is spent.
///
/// Every `Err` returned by `operation` is a transport failure and consumes one
/// attempt. The last error is returned once the budget is exhausted.
///
/// # Errors
///
/// Returns the [`FetchError`] of the final attempt.
#[instrument(skip(policy, operation), fields(max_attempts = policy.max_attempts))]
pub async fn retry_transport<T, F, Fut>(
    policy: &RetryPolicy,
    url: &str,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                warn!(url, attempt, kind = %error.kind(), error = %error, "Transport failure");
                match policy.should_retry(attempt) {
                    RetryDecision::Retry {
                        delay,
                        attempt: next,
                    } => {
                        debug!(
                            url,
                            next_attempt = next,
                            max_attempts = policy.max_attempts,
                            delay_ms = delay.as_millis(),
                            "Retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt = next;
                    }
                    RetryDecision::DoNotRetry { reason } => {
                        warn!(url, %reason, "Max retries reached, skipping URL");
                        return Err(error);
                    }
                }
            }
        }
    }
}
