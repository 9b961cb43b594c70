// RetryPolicy: the bounded retry/backoff discipline for the provider read
// path, kept as an explicit value object so it can be tested in isolation
// from any network transport.

use crate::constants::RETRYABLE_STATUS_CODES;
use std::time::Duration;

/// Retry configuration for the read-only provider lookup.
///
/// Applies only to idempotent reads. Total attempts are bounded by
/// `max_retries + 1`; the backoff between attempt `n` and `n + 1` grows as
/// `backoff_factor * 2^(n-1)` seconds.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Number of retries after the initial attempt.
    pub max_retries: u32,
    /// Exponential backoff factor in seconds. Zero disables waiting.
    pub backoff_factor: f64,
    /// Per-attempt timeout.
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_factor: f64, timeout: Duration) -> Self {
        Self {
            max_retries,
            backoff_factor,
            timeout,
        }
    }

    /// Total number of attempts this policy allows.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Whether the given status code is in the fixed retryable set.
    pub fn is_retryable_status(&self, status: u16) -> bool {
        RETRYABLE_STATUS_CODES.contains(&status)
    }

    /// Backoff delay before retry number `retry` (1-based).
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        if retry == 0 || self.backoff_factor <= 0.0 {
            return Duration::ZERO;
        }
        let secs = self.backoff_factor * f64::from(2u32.saturating_pow(retry - 1).min(1 << 16));
        Duration::from_secs_f64(secs)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: crate::constants::defaults::MAX_RETRIES,
            backoff_factor: crate::constants::defaults::BACKOFF_FACTOR,
            timeout: Duration::from_secs(crate::constants::defaults::REQUEST_TIMEOUT_SECS),
        }
    }
}
