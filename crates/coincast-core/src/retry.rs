//! Single-retry policy for transient transport failures.
//!
//! Provider calls are retried at most once; anything more belongs to
//! the caller's next request. Delays carry +/- 50% jitter so paired
//! clients do not resynchronize on the upstream.

use std::time::Duration;

/// Retry policy applied by adapters to retryable transport errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first. Capped at one.
    pub max_retries: u32,
    /// Base delay before the retry attempt.
    pub base_delay: Duration,
    /// Whether to jitter the delay.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay: Duration::from_millis(250),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub const fn no_retry() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            jitter: false,
        }
    }

    /// Number of retry attempts to make; the single-retry cap is
    /// enforced here rather than at every call site.
    pub fn attempts(&self) -> u32 {
        self.max_retries.min(1)
    }

    /// Delay to sleep before the retry attempt.
    pub fn delay(&self) -> Duration {
        if !self.jitter {
            return self.base_delay;
        }

        let base_ms = self.base_delay.as_millis() as u64;
        let spread = base_ms / 2;
        let offset = fastrand::u64(0..=spread * 2);
        Duration::from_millis(base_ms + offset - spread)
    }
}
