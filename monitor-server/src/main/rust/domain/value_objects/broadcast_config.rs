use std::time::Duration;

use crate::domain::errors::{DomainError, Result};

/// Cadence of the per-observer metrics push
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastConfig {
    tick_interval: Duration,
}

impl BroadcastConfig {
    pub fn new(tick_interval: Duration) -> Result<Self> {
        if tick_interval.is_zero() {
            return Err(DomainError::InvalidTickInterval);
        }
        Ok(Self { tick_interval })
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(5000),
        }
    }
}
