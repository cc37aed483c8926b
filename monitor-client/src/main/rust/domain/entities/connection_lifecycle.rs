use std::time::{Duration, Instant};

use crate::domain::value_objects::{ConnectionState, ReconnectPolicy};

/// RFC 6455 normal closure
pub const NORMAL_CLOSURE: u16 = 1000;

const EXHAUSTED: &str = "Max reconnection attempts reached";

/// State transition record
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub from: ConnectionState,
    pub to: ConnectionState,
    pub timestamp: Instant,
    pub reason: Option<String>,
}

/// Side effect the owner of the lifecycle must carry out
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleAction {
    /// Open a new transport connection tagged with `generation`
    OpenConnection { generation: u64 },
    /// Close connection `generation` with a normal closure
    CloseConnection { generation: u64 },
    /// Arm the reconnect timer, replacing any pending one
    ScheduleReconnect {
        token: u64,
        attempt: u32,
        delay: Duration,
    },
    CancelReconnect,
}

/// Connection state machine for one logical stream connection.
///
/// Pure: every handler returns the actions to perform and queues the resulting
/// transitions. Events carry the generation of the connection that produced them;
/// events from a superseded connection are ignored.
#[derive(Debug)]
pub struct ConnectionLifecycle {
    policy: ReconnectPolicy,
    current_state: ConnectionState,
    pending_transitions: Vec<StateTransition>,
    transition_count: usize,
    generation: u64,
    live: Option<u64>,
    reconnect_token: u64,
    pending_reconnect: Option<u64>,
    attempts: u32,
    should_reconnect: bool,
    exhausted: bool,
    last_failure: Option<String>,
    connected_at: Option<Instant>,
}

impl ConnectionLifecycle {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            current_state: ConnectionState::Disconnected,
            pending_transitions: Vec::new(),
            transition_count: 0,
            generation: 0,
            live: None,
            reconnect_token: 0,
            pending_reconnect: None,
            attempts: 0,
            should_reconnect: false,
            exhausted: false,
            last_failure: None,
            connected_at: None,
        }
    }

    pub fn current_state(&self) -> ConnectionState {
        self.current_state
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Consecutive reconnects scheduled since the last successful open
    pub fn reconnect_attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    pub fn transition_count(&self) -> usize {
        self.transition_count
    }

    pub fn uptime(&self) -> Option<Duration> {
        self.connected_at.map(|start| start.elapsed())
    }

    /// True if `generation` is the connection currently owned by this lifecycle
    pub fn accepts(&self, generation: u64) -> bool {
        self.live == Some(generation)
    }

    /// Drain transitions recorded since the last call
    pub fn take_transitions(&mut self) -> Vec<StateTransition> {
        std::mem::take(&mut self.pending_transitions)
    }

    /// Explicit connect request from the caller
    pub fn connect(&mut self) -> Vec<LifecycleAction> {
        if self.current_state == ConnectionState::Connected && self.live.is_some() {
            return Vec::new();
        }

        // Recovering from the sticky error state gets a fresh budget
        if self.exhausted {
            self.exhausted = false;
            self.attempts = 0;
        }

        self.should_reconnect = true;
        let mut actions = Vec::new();
        self.cancel_reconnect(&mut actions);
        self.open(&mut actions);
        actions
    }

    /// The reconnect timer armed with `token` fired
    pub fn reconnect_due(&mut self, token: u64) -> Vec<LifecycleAction> {
        if self.pending_reconnect != Some(token) {
            return Vec::new();
        }
        self.pending_reconnect = None;

        if !self.should_reconnect {
            return Vec::new();
        }

        let mut actions = Vec::new();
        self.open(&mut actions);
        actions
    }

    pub fn on_open(&mut self, generation: u64) -> Vec<LifecycleAction> {
        if !self.accepts(generation) {
            return Vec::new();
        }

        self.attempts = 0;
        self.exhausted = false;
        self.last_failure = None;
        self.connected_at = Some(Instant::now());
        self.record_transition(ConnectionState::Connected, None);
        Vec::new()
    }

    /// Transport failure: failed open, read error or protocol violation
    pub fn on_error(&mut self, generation: u64, reason: impl Into<String>) -> Vec<LifecycleAction> {
        if !self.accepts(generation) {
            return Vec::new();
        }

        let reason = reason.into();
        self.live = None;
        self.connected_at = None;
        self.last_failure = Some(reason.clone());
        self.record_transition(ConnectionState::Error, Some(reason));

        let mut actions = Vec::new();
        self.schedule_reconnect(&mut actions);
        actions
    }

    /// Transport closed; `code` is `None` when the stream ended without a close frame
    pub fn on_close(&mut self, generation: u64, code: Option<u16>) -> Vec<LifecycleAction> {
        if !self.accepts(generation) {
            return Vec::new();
        }

        self.live = None;
        self.connected_at = None;
        let reason = match code {
            Some(code) => format!("closed with code {}", code),
            None => "closed without close frame".to_string(),
        };
        self.record_transition(ConnectionState::Disconnected, Some(reason));

        let mut actions = Vec::new();
        if self.should_reconnect && code != Some(NORMAL_CLOSURE) {
            self.schedule_reconnect(&mut actions);
        }
        actions
    }

    /// Explicit disconnect: normal closure, no further automatic reconnects. Idempotent.
    pub fn disconnect(&mut self) -> Vec<LifecycleAction> {
        self.should_reconnect = false;

        let mut actions = Vec::new();
        self.cancel_reconnect(&mut actions);
        if let Some(generation) = self.live.take() {
            actions.push(LifecycleAction::CloseConnection { generation });
        }
        self.connected_at = None;
        self.record_transition(
            ConnectionState::Disconnected,
            Some("Client disconnecting".to_string()),
        );
        actions
    }

    fn open(&mut self, actions: &mut Vec<LifecycleAction>) {
        if let Some(previous) = self.live.take() {
            actions.push(LifecycleAction::CloseConnection {
                generation: previous,
            });
        }

        self.generation += 1;
        self.live = Some(self.generation);
        self.record_transition(ConnectionState::Connecting, None);
        actions.push(LifecycleAction::OpenConnection {
            generation: self.generation,
        });
    }

    fn schedule_reconnect(&mut self, actions: &mut Vec<LifecycleAction>) {
        if !self.should_reconnect {
            return;
        }

        if self.policy.is_exhausted(self.attempts) {
            self.exhausted = true;
            self.last_failure = Some(EXHAUSTED.to_string());
            self.record_transition(ConnectionState::Error, Some(EXHAUSTED.to_string()));
            return;
        }

        self.attempts += 1;
        self.reconnect_token += 1;
        self.pending_reconnect = Some(self.reconnect_token);

        actions.push(LifecycleAction::ScheduleReconnect {
            token: self.reconnect_token,
            attempt: self.attempts,
            delay: self.policy.delay_for(self.attempts),
        });
        self.record_transition(ConnectionState::Reconnecting, None);
    }

    fn cancel_reconnect(&mut self, actions: &mut Vec<LifecycleAction>) {
        if self.pending_reconnect.take().is_some() {
            actions.push(LifecycleAction::CancelReconnect);
        }
    }

    fn record_transition(&mut self, new_state: ConnectionState, reason: Option<String>) {
        // One transition per actual state change
        if new_state == self.current_state {
            return;
        }

        let transition = StateTransition {
            from: self.current_state,
            to: new_state,
            timestamp: Instant::now(),
            reason,
        };

        self.pending_transitions.push(transition);
        self.transition_count += 1;
        self.current_state = new_state;
    }
}
