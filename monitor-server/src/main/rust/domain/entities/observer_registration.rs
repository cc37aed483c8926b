use std::time::Instant;

use crate::domain::value_objects::ObserverId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverState {
    Active,
    Closed,
}

/// Bookkeeping for one connected observer
#[derive(Debug, Clone)]
pub struct ObserverRegistration {
    id: ObserverId,
    connected_at: Instant,
    ticks_delivered: u64,
    failed_sends: u64,
    state: ObserverState,
}

impl ObserverRegistration {
    pub fn new() -> Self {
        Self {
            id: ObserverId::new(),
            connected_at: Instant::now(),
            ticks_delivered: 0,
            failed_sends: 0,
            state: ObserverState::Active,
        }
    }

    pub fn id(&self) -> ObserverId {
        self.id
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }

    pub fn state(&self) -> ObserverState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ObserverState::Active
    }

    pub fn ticks_delivered(&self) -> u64 {
        self.ticks_delivered
    }

    pub fn failed_sends(&self) -> u64 {
        self.failed_sends
    }

    pub fn record_delivery(&mut self) {
        if self.is_active() {
            self.ticks_delivered += 1;
        }
    }

    pub fn record_failure(&mut self) {
        if self.is_active() {
            self.failed_sends += 1;
        }
    }

    /// Returns false if the registration was already closed
    pub fn close(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = ObserverState::Closed;
        was_active
    }
}

impl Default for ObserverRegistration {
    fn default() -> Self {
        Self::new()
    }
}
