//! Retry decisions for failed transfer attempts.
//!
//! Only transient transport failures are retried: connection errors,
//! timeouts, 5xx, 408 and 429 responses, and body streams that break
//! mid-transfer. Client errors, local filesystem errors and checksum
//! problems are final. A checksum mismatch in particular is never retried,
//! because fetching unchanged remote content again reproduces the mismatch.
//!
//! Status and transport errors are classified with `reqwest-retry`'s default
//! strategy, and the delay between attempts follows its exponential backoff
//! schedule.

use crate::error::FetchError;

use reqwest::Response;
use reqwest_retry::{
    default_on_request_failure, default_on_request_success, policies::ExponentialBackoff,
    RetryDecision as BackoffDecision, RetryPolicy as _, Retryable,
};
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Default maximum number of attempts per file, the first one included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const DEFAULT_MIN_BACKOFF: Duration = Duration::from_millis(500);
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Start a new attempt after waiting.
    Retry { after: Duration },
    /// Stop; the last error is final.
    GiveUp,
}

/// Bounded retry policy with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: ExponentialBackoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// Create a policy allowing `max_attempts` attempts (at least one).
    pub fn new(max_attempts: u32) -> Self {
        Self::with_backoff(max_attempts, DEFAULT_MIN_BACKOFF, DEFAULT_MAX_BACKOFF)
    }

    /// Create a policy with explicit backoff bounds.
    ///
    /// `min_delay` must not exceed `max_delay`; the bounds are swapped if it
    /// does.
    pub fn with_backoff(max_attempts: u32, min_delay: Duration, max_delay: Duration) -> Self {
        let max_attempts = max_attempts.max(1);
        let (min_delay, max_delay) = if min_delay <= max_delay {
            (min_delay, max_delay)
        } else {
            (max_delay, min_delay)
        };
        let backoff = ExponentialBackoff::builder()
            .retry_bounds(min_delay, max_delay)
            .build_with_max_retries(max_attempts - 1);
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Get the maximum number of attempts, the first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decide what to do after attempt number `attempt` (1-based) failed
    /// with `error`.
    pub fn decide(&self, error: &FetchError, attempt: u32) -> RetryDecision {
        if !error.is_transient() {
            debug!(attempt, %error, "not retrying fatal failure");
            return RetryDecision::GiveUp;
        }
        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::GiveUp;
        }

        let now = SystemTime::now();
        match self.backoff.should_retry(now, attempt - 1) {
            BackoffDecision::Retry { execute_after } => RetryDecision::Retry {
                after: execute_after.duration_since(now).unwrap_or(Duration::ZERO),
            },
            BackoffDecision::DoNotRetry => RetryDecision::GiveUp,
        }
    }
}

/// Classify a response status.
///
/// Returns `None` for success, otherwise whether the status is transient.
pub(crate) fn classify_response(response: &Response) -> Option<bool> {
    default_on_request_success(response).map(|retryable| retryable == Retryable::Transient)
}

/// Whether a failure to obtain a response is transient.
pub(crate) fn classify_failure(error: &reqwest_middleware::Error) -> bool {
    default_on_request_failure(error) == Some(Retryable::Transient)
}
