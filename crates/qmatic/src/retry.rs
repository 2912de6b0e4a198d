//! Consolidated retry policy for idempotent upstream reads.
//!
//! Booking POSTs are excluded on purpose: whether the upstream deduplicates
//! appointment creation is unknown, so a second POST risks a second real
//! booking. The acquisition engine's single fallback attempt is the only
//! sanctioned second try.

use std::time::Duration;

use slotrace_core::booking::UpstreamError;
use slotrace_core::config::RetryConfig;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff before retry `attempt` (1-based), capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }

    /// Connection trouble, timeouts, throttling, and server-side errors are
    /// worth another read; client errors and decode failures are not.
    pub fn is_retryable(&self, error: &UpstreamError) -> bool {
        match error {
            UpstreamError::Transport(_) | UpstreamError::Timeout(_) => true,
            UpstreamError::Status(status) => *status == 429 || (500..600).contains(&u32::from(*status)),
            UpstreamError::Decode(_) => false,
        }
    }
}
