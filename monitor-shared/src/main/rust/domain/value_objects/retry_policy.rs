use std::time::Duration;

use crate::domain::errors::{ProtocolError, Result};

/// Attempt budget and exponential backoff for remote requests
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    attempts: u32,
    base_delay: Duration,
    backoff_multiplier: f64,
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration, backoff_multiplier: f64) -> Result<Self> {
        if attempts == 0 {
            return Err(ProtocolError::InvalidRetryAttempts);
        }
        if !(backoff_multiplier >= 1.0) || !backoff_multiplier.is_finite() {
            return Err(ProtocolError::InvalidBackoffMultiplier);
        }

        Ok(Self {
            attempts,
            base_delay,
            backoff_multiplier,
        })
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    /// Delay to sleep after failed attempt `attempt` (1-based): `base * multiplier^(attempt-1)`,
    /// saturating at `Duration::MAX`
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() || attempt <= 1 {
            return self.base_delay;
        }
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let seconds = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }

    pub fn is_last(&self, attempt: u32) -> bool {
        attempt >= self.attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
        }
    }
}
