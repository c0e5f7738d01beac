//! Retry policy table for judge calls.
//!
//! | failure kind       | attempts left | decision                   |
//! |--------------------|---------------|----------------------------|
//! | `Overloaded`       | yes           | wait `base * 2^attempt`    |
//! | `ValidationFailed` | yes           | retry immediately          |
//! | any                | no            | degrade to score 0         |
//! | `Transport`        | -             | degrade to score 0         |

use crate::errors::GatewayError;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per (row, dimension), including the first.
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Backoff(Duration),
    RetryNow,
    Degrade,
}

impl RetryPolicy {
    /// Decide what to do after `attempt` (1-based) failed with `err`.
    pub fn decide(&self, attempt: u32, err: &GatewayError) -> RetryDecision {
        let attempts_left = attempt < self.max_attempts;
        match err {
            GatewayError::Overloaded { .. } if attempts_left => {
                RetryDecision::Backoff(self.backoff_for(attempt))
            }
            GatewayError::ValidationFailed(_) if attempts_left => RetryDecision::RetryNow,
            _ => RetryDecision::Degrade,
        }
    }

    /// `base * 2^attempt`: 2s after the first attempt, 4s after the second.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}
