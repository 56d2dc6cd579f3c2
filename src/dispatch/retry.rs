//! Retry policy for external calls
//!
//! Attempts double their backoff from the initial interval up to the cap.
//! Only activity failures are retried; resolution and routing errors are
//! spec bugs and surface immediately.

use crate::core::StepSpec;
use std::time::Duration;

/// Retry policy for one step's external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,

    /// Backoff before the second attempt
    pub initial_interval: Duration,

    /// Upper bound on any single backoff
    pub max_interval: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_secs(1);
    pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(60);

    /// Policy for a step: its declared `retry_policy.max_attempts`
    /// (default 3) with the standard intervals.
    pub fn for_step(step: &StepSpec) -> Self {
        Self {
            max_attempts: step.max_attempts(),
            initial_interval: Self::DEFAULT_INITIAL_INTERVAL,
            max_interval: Self::DEFAULT_MAX_INTERVAL,
        }
    }

    /// Override the backoff intervals, keeping the attempt budget.
    pub fn with_intervals(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_interval = initial;
        self.max_interval = max;
        self
    }

    /// Backoff to sleep before the given attempt (attempts count from 1;
    /// the first attempt has no backoff).
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let doublings = attempt.saturating_sub(2).min(31);
        let delay = self
            .initial_interval
            .saturating_mul(1u32.checked_shl(doublings).unwrap_or(u32::MAX));
        delay.min(self.max_interval)
    }
}
