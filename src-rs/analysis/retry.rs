use std::time::Duration;

use crate::config::{DispatchConfig, ProviderTuning};

/// How many times a dispatch is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(tuning: &ProviderTuning, dispatch: &DispatchConfig) -> Self {
        Self {
            max_retries: tuning.retry_attempts,
            base_delay: Duration::from_millis(dispatch.backoff_base_ms),
            max_delay: Duration::from_millis(dispatch.backoff_max_ms),
        }
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before retry number `retry` (1-based): base * 2^(retry-1), capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}
