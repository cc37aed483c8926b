use std::time::Duration;

use crate::domain::errors::{DomainError, Result};

/// Largest delay, as a multiple of the base interval
const MAX_FACTOR: u32 = 4;

/// Reconnect backoff: `min(base * 2^(attempt-1), base * 4)` with a bounded attempt budget
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    base_interval: Duration,
    max_attempts: u32,
}

impl ReconnectPolicy {
    pub fn new(base_interval: Duration, max_attempts: u32) -> Result<Self> {
        if base_interval.is_zero() {
            return Err(DomainError::InvalidReconnectInterval);
        }

        Ok(Self {
            base_interval,
            max_attempts,
        })
    }

    pub fn base_interval(&self) -> Duration {
        self.base_interval
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn max_delay(&self) -> Duration {
        self.base_interval * MAX_FACTOR
    }

    /// Delay before reconnect attempt `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(MAX_FACTOR.ilog2());
        (self.base_interval * 2u32.pow(exponent)).min(self.max_delay())
    }

    pub fn is_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(5000),
            max_attempts: 10,
        }
    }
}
