use std::pin::Pin;
use std::sync::Arc;

use monitor_shared::{Decoded, StreamMessage};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Sleep;

use crate::domain::entities::{ConnectionLifecycle, LatestSnapshot, LifecycleAction};
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{MetricsReporter, StatusListener, StreamTransport, TransportEvent};
use crate::domain::value_objects::{ConnectionState, ReconnectPolicy};

/// Observable status of a [`StreamingClient`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientStatus {
    pub state: ConnectionState,
    pub reconnect_attempts: u32,
    pub last_failure: Option<String>,
}

enum Command {
    Connect,
    Disconnect(oneshot::Sender<()>),
}

struct ConnectionEvent {
    generation: u64,
    kind: EventKind,
}

enum EventKind {
    Opened,
    Message(String),
    Closed(Option<u16>),
    Failed(String),
}

/// Owns one logical connection to the metrics stream.
///
/// All state lives in a single driver task; this handle only sends commands and
/// reads the published status and snapshot. Dropping the handle disconnects.
pub struct StreamingClient {
    url: String,
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ClientStatus>,
    snapshot: watch::Receiver<LatestSnapshot>,
}

impl StreamingClient {
    /// Spawn the driver task. Must be called within a tokio runtime.
    pub fn new(
        url: impl Into<String>,
        policy: ReconnectPolicy,
        transport: Arc<dyn StreamTransport>,
        metrics: Arc<dyn MetricsReporter>,
        listener: Option<Arc<dyn StatusListener>>,
    ) -> Self {
        let url = url.into();
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(ClientStatus::default());
        let (snapshot_tx, snapshot) = watch::channel(LatestSnapshot::default());

        let driver = Driver {
            url: Arc::from(url.as_str()),
            lifecycle: ConnectionLifecycle::new(policy),
            cache: LatestSnapshot::default(),
            transport,
            metrics,
            listener,
            events_tx,
            live: None,
            reconnect: None,
            status_tx,
            snapshot_tx,
        };
        tokio::spawn(driver.run(command_rx, events_rx));

        Self {
            url,
            commands,
            status,
            snapshot,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Start connecting. No-op while already connected.
    pub fn connect(&self) -> Result<()> {
        self.commands
            .send(Command::Connect)
            .map_err(|_| DomainError::ClientStopped)
    }

    /// Close the connection and stop reconnecting. Idempotent.
    pub async fn disconnect(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.commands.send(Command::Disconnect(ack_tx)).is_err() {
            return;
        }
        let _ = ack_rx.await;
    }

    pub fn state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    pub fn status(&self) -> ClientStatus {
        self.status.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ClientStatus> {
        self.status.clone()
    }

    pub fn latest(&self) -> LatestSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<LatestSnapshot> {
        self.snapshot.clone()
    }
}

struct LiveConnection {
    generation: u64,
    close: oneshot::Sender<()>,
}

struct ReconnectTimer {
    token: u64,
    sleep: Pin<Box<Sleep>>,
}

struct Driver {
    url: Arc<str>,
    lifecycle: ConnectionLifecycle,
    cache: LatestSnapshot,
    transport: Arc<dyn StreamTransport>,
    metrics: Arc<dyn MetricsReporter>,
    listener: Option<Arc<dyn StatusListener>>,
    events_tx: mpsc::UnboundedSender<ConnectionEvent>,
    live: Option<LiveConnection>,
    reconnect: Option<ReconnectTimer>,
    status_tx: watch::Sender<ClientStatus>,
    snapshot_tx: watch::Sender<LatestSnapshot>,
}

impl Driver {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<ConnectionEvent>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Connect) => {
                        let actions = self.lifecycle.connect();
                        self.apply(actions);
                    }
                    Some(Command::Disconnect(ack)) => {
                        let actions = self.lifecycle.disconnect();
                        self.apply(actions);
                        let _ = ack.send(());
                    }
                    None => {
                        let actions = self.lifecycle.disconnect();
                        self.apply(actions);
                        break;
                    }
                },
                Some(event) = events.recv() => self.handle_event(event),
                token = reconnect_due(&mut self.reconnect) => {
                    self.reconnect = None;
                    let actions = self.lifecycle.reconnect_due(token);
                    self.apply(actions);
                }
            }
        }

        tracing::debug!(url = %self.url, "Streaming client stopped");
    }

    fn handle_event(&mut self, event: ConnectionEvent) {
        let ConnectionEvent { generation, kind } = event;
        if !self.lifecycle.accepts(generation) {
            tracing::trace!(generation, "Ignoring event from superseded connection");
            return;
        }

        let actions = match kind {
            EventKind::Opened => {
                tracing::info!(url = %self.url, "Stream connected");
                self.lifecycle.on_open(generation)
            }
            EventKind::Message(text) => {
                self.handle_message(&text);
                return;
            }
            EventKind::Closed(code) => {
                tracing::info!(url = %self.url, ?code, "Stream closed");
                self.live = None;
                self.lifecycle.on_close(generation, code)
            }
            EventKind::Failed(reason) => {
                tracing::error!(url = %self.url, "Stream error: {}", reason);
                self.live = None;
                self.lifecycle.on_error(generation, reason)
            }
        };
        self.apply(actions);
    }

    fn handle_message(&mut self, text: &str) {
        let message = match StreamMessage::decode(text) {
            Ok(Decoded::Message(message)) => message,
            Ok(Decoded::Unknown(tag)) => {
                tracing::debug!("Ignoring message with unknown type: {}", tag);
                return;
            }
            Err(e) => {
                self.metrics.report_malformed_message();
                tracing::warn!("Dropping malformed message: {}", e);
                return;
            }
        };

        self.metrics.report_message_received();
        tracing::debug!("Stream message: {}", message.tag());

        match message {
            StreamMessage::MetricsUpdate {
                snapshot,
                timestamp,
            } => {
                self.cache.apply_update(snapshot, timestamp);
                self.snapshot_tx.send_replace(self.cache.clone());
            }
            StreamMessage::Error { reason, .. } => {
                tracing::warn!("Server reported error: {}", reason);
                self.cache.record_error(reason);
                self.snapshot_tx.send_replace(self.cache.clone());
            }
            StreamMessage::ConnectionStatus { status, .. } => {
                tracing::debug!("Server reports connection {}", status);
            }
        }
    }

    fn apply(&mut self, actions: Vec<LifecycleAction>) {
        for action in actions {
            match action {
                LifecycleAction::OpenConnection { generation } => {
                    let (close_tx, close_rx) = oneshot::channel();
                    tokio::spawn(pump(
                        generation,
                        self.transport.clone(),
                        self.url.clone(),
                        self.events_tx.clone(),
                        close_rx,
                    ));
                    self.live = Some(LiveConnection {
                        generation,
                        close: close_tx,
                    });
                }
                LifecycleAction::CloseConnection { generation } => {
                    let is_live = self
                        .live
                        .as_ref()
                        .is_some_and(|live| live.generation == generation);
                    if is_live {
                        if let Some(live) = self.live.take() {
                            let _ = live.close.send(());
                        }
                    }
                }
                LifecycleAction::ScheduleReconnect {
                    token,
                    attempt,
                    delay,
                } => {
                    tracing::info!(
                        "Reconnecting in {:?} (attempt {}/{})",
                        delay,
                        attempt,
                        self.lifecycle.policy().max_attempts()
                    );
                    self.metrics.report_reconnect_attempt();
                    self.metrics.report_backoff(delay.as_secs_f64());
                    self.reconnect = Some(ReconnectTimer {
                        token,
                        sleep: Box::pin(tokio::time::sleep(delay)),
                    });
                }
                LifecycleAction::CancelReconnect => {
                    self.reconnect = None;
                }
            }
        }

        self.publish_transitions();
    }

    fn publish_transitions(&mut self) {
        let transitions = self.lifecycle.take_transitions();
        if transitions.is_empty() {
            return;
        }

        for transition in &transitions {
            tracing::debug!("Stream status: {} -> {}", transition.from, transition.to);
            if transition.to == ConnectionState::Error && self.lifecycle.is_exhausted() {
                tracing::error!("Max reconnection attempts reached");
            }
            self.metrics.report_state_change(&transition.to);
            if let Some(listener) = &self.listener {
                listener.on_status_change(transition);
            }
        }

        if let Some(uptime) = self.lifecycle.uptime() {
            self.metrics.report_uptime(uptime.as_secs_f64());
        }

        self.status_tx.send_replace(ClientStatus {
            state: self.lifecycle.current_state(),
            reconnect_attempts: self.lifecycle.reconnect_attempts(),
            last_failure: self.lifecycle.last_failure().map(str::to_string),
        });
    }
}

async fn reconnect_due(timer: &mut Option<ReconnectTimer>) -> u64 {
    match timer {
        Some(timer) => {
            timer.sleep.as_mut().await;
            timer.token
        }
        None => std::future::pending().await,
    }
}

/// Owns one transport connection and forwards its events tagged with `generation`.
/// Resolving or dropping `close` closes the connection without emitting an event.
async fn pump(
    generation: u64,
    transport: Arc<dyn StreamTransport>,
    url: Arc<str>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    mut close: oneshot::Receiver<()>,
) {
    let emit = |kind: EventKind| {
        let _ = events.send(ConnectionEvent { generation, kind });
    };

    let mut connection = tokio::select! {
        _ = &mut close => return,
        opened = transport.open(&url) => match opened {
            Ok(connection) => connection,
            Err(e) => {
                emit(EventKind::Failed(e.to_string()));
                return;
            }
        },
    };
    emit(EventKind::Opened);

    loop {
        tokio::select! {
            _ = &mut close => {
                if let Err(e) = connection.close().await {
                    tracing::debug!("Close handshake failed: {}", e);
                }
                return;
            }
            event = connection.next_event() => match event {
                Some(TransportEvent::Text(text)) => emit(EventKind::Message(text)),
                Some(TransportEvent::Closed { code, reason }) => {
                    tracing::debug!(?code, "Close frame: {}", reason);
                    emit(EventKind::Closed(code));
                    return;
                }
                Some(TransportEvent::Error(reason)) => {
                    emit(EventKind::Failed(reason));
                    return;
                }
                None => {
                    emit(EventKind::Closed(None));
                    return;
                }
            },
        }
    }
}
