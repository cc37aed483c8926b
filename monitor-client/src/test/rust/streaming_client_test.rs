use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use monitor_client::{
    ClientStatus, ConnectionState, DomainError, LatestSnapshot, NoopReporter, ReconnectPolicy,
    StateTransition, StatusListener, StreamConnection, StreamTransport, StreamingClient,
    TransportEvent, TungsteniteTransport,
};
use monitor_shared::{
    CoreUsage, CpuMetrics, CpuSummary, DockerContainer, LoadAverage, MemoryMetrics, Snapshot,
    StreamMessage, SwapUsage, SystemOverview, UsageSummary,
};
use tokio::sync::{mpsc, watch};

const WAIT: Duration = Duration::from_secs(3);

/// Test-side end of one accepted fake connection
struct ServerSide {
    events: mpsc::UnboundedSender<TransportEvent>,
    closed: Arc<AtomicBool>,
}

impl ServerSide {
    fn send(&self, event: TransportEvent) {
        let _ = self.events.send(event);
    }

    fn send_message(&self, message: StreamMessage) {
        self.send(TransportEvent::Text(message.encode().unwrap()));
    }

    async fn wait_closed(&self) {
        let started = Instant::now();
        while !self.closed.load(Ordering::SeqCst) {
            assert!(started.elapsed() < WAIT, "connection was never closed");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

struct FakeConnection {
    events: mpsc::UnboundedReceiver<TransportEvent>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl StreamConnection for FakeConnection {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }

    async fn close(&mut self) -> monitor_client::Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Accepts or refuses every open; accepted connections are handed to the test
struct FakeTransport {
    refuse: AtomicBool,
    opens: AtomicU32,
    accepted: mpsc::UnboundedSender<ServerSide>,
}

impl FakeTransport {
    fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ServerSide>) {
        let (accepted, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            refuse: AtomicBool::new(false),
            opens: AtomicU32::new(0),
            accepted,
        });
        (transport, rx)
    }

    fn set_refusing(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    fn opens(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamTransport for FakeTransport {
    async fn open(&self, _url: &str) -> monitor_client::Result<Box<dyn StreamConnection>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(DomainError::ConnectFailed("connection refused".to_string()));
        }

        let (events, rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let _ = self.accepted.send(ServerSide {
            events,
            closed: closed.clone(),
        });
        Ok(Box::new(FakeConnection { events: rx, closed }))
    }
}

#[derive(Default)]
struct TransitionLog(Mutex<Vec<(ConnectionState, ConnectionState)>>);

impl TransitionLog {
    fn pairs(&self) -> Vec<(ConnectionState, ConnectionState)> {
        self.0.lock().unwrap().clone()
    }
}

impl StatusListener for TransitionLog {
    fn on_status_change(&self, transition: &StateTransition) {
        self.0.lock().unwrap().push((transition.from, transition.to));
    }
}

fn policy(base_ms: u64, max_attempts: u32) -> ReconnectPolicy {
    ReconnectPolicy::new(Duration::from_millis(base_ms), max_attempts).unwrap()
}

fn client_with(
    transport: Arc<dyn StreamTransport>,
    policy: ReconnectPolicy,
) -> (StreamingClient, Arc<TransitionLog>) {
    let log = Arc::new(TransitionLog::default());
    let client = StreamingClient::new(
        "ws://monitor.local/ws/metrics",
        policy,
        transport,
        Arc::new(NoopReporter),
        Some(log.clone() as Arc<dyn StatusListener>),
    );
    (client, log)
}

async fn wait_status(
    status: &mut watch::Receiver<ClientStatus>,
    condition: impl FnMut(&ClientStatus) -> bool,
) -> ClientStatus {
    tokio::time::timeout(WAIT, status.wait_for(condition))
        .await
        .expect("status condition within timeout")
        .expect("client still running")
        .clone()
}

async fn wait_snapshot(
    snapshot: &mut watch::Receiver<LatestSnapshot>,
    condition: impl FnMut(&LatestSnapshot) -> bool,
) -> LatestSnapshot {
    tokio::time::timeout(WAIT, snapshot.wait_for(condition))
        .await
        .expect("snapshot condition within timeout")
        .expect("client still running")
        .clone()
}

async fn next_accepted(accepted: &mut mpsc::UnboundedReceiver<ServerSide>) -> ServerSide {
    tokio::time::timeout(WAIT, accepted.recv())
        .await
        .expect("connection opened within timeout")
        .expect("transport alive")
}

fn overview() -> SystemOverview {
    SystemOverview {
        hostname: "rpi-lab".to_string(),
        uptime: 7200,
        load_average: [0.5, 0.4, 0.3],
        cpu: CpuSummary {
            usage: 21,
            cores: 4,
            temperature: 51.0,
        },
        memory: UsageSummary::new(8_000, 3_000, 5_000),
        disk: UsageSummary::new(64_000, 32_000, 32_000),
    }
}

fn cpu(usage: u32) -> CpuMetrics {
    CpuMetrics {
        usage,
        cores: vec![CoreUsage { core: 0, usage }],
        temperature: 51.0,
        frequency: 1800,
        load_average: LoadAverage {
            one: 0.5,
            five: 0.4,
            fifteen: 0.3,
        },
    }
}

fn memory() -> MemoryMetrics {
    MemoryMetrics {
        total: 8_000,
        used: 3_000,
        free: 5_000,
        available: 5_400,
        usage: 38,
        swap: SwapUsage {
            total: 1_000,
            used: 0,
            free: 1_000,
        },
        buffers: 0,
        cached: 400,
    }
}

#[tokio::test]
async fn test_connect_reports_connecting_then_connected() {
    let (transport, mut accepted) = FakeTransport::new();
    let (client, log) = client_with(transport.clone(), policy(50, 3));
    let mut status = client.subscribe_status();

    assert_eq!(client.state(), ConnectionState::Disconnected);
    client.connect().unwrap();

    let _server = next_accepted(&mut accepted).await;
    wait_status(&mut status, |s| s.state == ConnectionState::Connected).await;

    assert!(client.is_connected());
    assert_eq!(
        log.pairs(),
        vec![
            (ConnectionState::Disconnected, ConnectionState::Connecting),
            (ConnectionState::Connecting, ConnectionState::Connected),
        ]
    );

    // Connecting again while connected changes nothing
    client.connect().unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.opens(), 1);
    assert_eq!(log.pairs().len(), 2);
}

#[tokio::test]
async fn test_messages_update_cache_and_bad_frames_are_ignored() {
    let (transport, mut accepted) = FakeTransport::new();
    let (client, log) = client_with(transport, policy(50, 3));
    let mut status = client.subscribe_status();
    let mut snapshot = client.subscribe_snapshot();

    client.connect().unwrap();
    let server = next_accepted(&mut accepted).await;
    wait_status(&mut status, |s| s.state == ConnectionState::Connected).await;

    server.send_message(StreamMessage::metrics_update(Snapshot {
        system: Some(overview()),
        cpu: Some(cpu(21)),
        memory: None,
        docker: None,
    }));
    let latest = wait_snapshot(&mut snapshot, |s| s.has_data()).await;
    assert_eq!(latest.system, Some(overview()));
    assert_eq!(latest.memory, None);

    server.send(TransportEvent::Text("not json at all".to_string()));
    server.send(TransportEvent::Text(
        r#"{"type":"heartbeat","timestamp":"2026-01-01T00:00:00.000Z","data":{}}"#.to_string(),
    ));
    server.send_message(StreamMessage::error("Failed to collect metrics"));

    let latest = wait_snapshot(&mut snapshot, |s| s.last_error.is_some()).await;
    assert_eq!(latest.last_error.as_deref(), Some("Failed to collect metrics"));
    assert_eq!(client.state(), ConnectionState::Connected);

    // Absent fields keep their last known value
    server.send_message(StreamMessage::metrics_update(Snapshot {
        system: None,
        cpu: Some(cpu(64)),
        memory: Some(memory()),
        docker: None,
    }));
    let latest = wait_snapshot(&mut snapshot, |s| s.memory.is_some()).await;
    assert_eq!(latest.system, Some(overview()));
    assert_eq!(latest.cpu.map(|c| c.usage), Some(64));
    assert_eq!(latest.last_error, None);

    assert_eq!(log.pairs().len(), 2);
}

#[tokio::test]
async fn test_abnormal_close_reconnects_after_base_delay() {
    let (transport, mut accepted) = FakeTransport::new();
    let (client, log) = client_with(transport.clone(), policy(80, 3));
    let mut status = client.subscribe_status();

    client.connect().unwrap();
    let first = next_accepted(&mut accepted).await;
    wait_status(&mut status, |s| s.state == ConnectionState::Connected).await;

    let closed_at = Instant::now();
    first.send(TransportEvent::Closed {
        code: Some(1006),
        reason: String::new(),
    });

    let reconnecting = wait_status(&mut status, |s| s.state == ConnectionState::Reconnecting).await;
    assert_eq!(reconnecting.reconnect_attempts, 1);

    let _second = next_accepted(&mut accepted).await;
    assert!(closed_at.elapsed() >= Duration::from_millis(80));

    let connected = wait_status(&mut status, |s| s.state == ConnectionState::Connected).await;
    assert_eq!(connected.reconnect_attempts, 0);
    assert_eq!(transport.opens(), 2);

    let pairs = log.pairs();
    assert_eq!(
        &pairs[2..],
        &[
            (ConnectionState::Connected, ConnectionState::Disconnected),
            (ConnectionState::Disconnected, ConnectionState::Reconnecting),
            (ConnectionState::Reconnecting, ConnectionState::Connecting),
            (ConnectionState::Connecting, ConnectionState::Connected),
        ]
    );
}

#[tokio::test]
async fn test_stream_end_without_close_frame_reconnects() {
    let (transport, mut accepted) = FakeTransport::new();
    let (client, _log) = client_with(transport.clone(), policy(20, 3));
    let mut status = client.subscribe_status();

    client.connect().unwrap();
    let first = next_accepted(&mut accepted).await;
    wait_status(&mut status, |s| s.state == ConnectionState::Connected).await;

    drop(first);

    let _second = next_accepted(&mut accepted).await;
    wait_status(&mut status, |s| s.state == ConnectionState::Connected).await;
    assert_eq!(transport.opens(), 2);
}

#[tokio::test]
async fn test_normal_close_from_server_does_not_reconnect() {
    let (transport, mut accepted) = FakeTransport::new();
    let (client, _log) = client_with(transport.clone(), policy(20, 3));
    let mut status = client.subscribe_status();

    client.connect().unwrap();
    let server = next_accepted(&mut accepted).await;
    wait_status(&mut status, |s| s.state == ConnectionState::Connected).await;

    server.send(TransportEvent::Closed {
        code: Some(1000),
        reason: "Server shutting down".to_string(),
    });
    wait_status(&mut status, |s| s.state == ConnectionState::Disconnected).await;

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(transport.opens(), 1);
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_refused_connects_exhaust_then_explicit_connect_recovers() {
    let (transport, mut accepted) = FakeTransport::new();
    transport.set_refusing(true);
    let (client, _log) = client_with(transport.clone(), policy(20, 2));
    let mut status = client.subscribe_status();

    client.connect().unwrap();
    let exhausted = wait_status(&mut status, |s| {
        s.state == ConnectionState::Error
            && s.last_failure.as_deref() == Some("Max reconnection attempts reached")
    })
    .await;
    assert_eq!(exhausted.reconnect_attempts, 2);

    // Initial open plus one per allowed reconnect, then nothing more
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(transport.opens(), 3);
    assert_eq!(client.state(), ConnectionState::Error);

    transport.set_refusing(false);
    client.connect().unwrap();

    let _server = next_accepted(&mut accepted).await;
    let connected = wait_status(&mut status, |s| s.state == ConnectionState::Connected).await;
    assert_eq!(connected.reconnect_attempts, 0);
    assert_eq!(connected.last_failure, None);
}

#[tokio::test]
async fn test_disconnect_is_idempotent_and_ignores_late_events() {
    let (transport, mut accepted) = FakeTransport::new();
    let (client, log) = client_with(transport.clone(), policy(20, 3));
    let mut status = client.subscribe_status();

    client.connect().unwrap();
    let server = next_accepted(&mut accepted).await;
    wait_status(&mut status, |s| s.state == ConnectionState::Connected).await;

    client.disconnect().await;
    assert_eq!(client.state(), ConnectionState::Disconnected);
    server.wait_closed().await;

    client.disconnect().await;
    assert_eq!(client.state(), ConnectionState::Disconnected);

    server.send_message(StreamMessage::metrics_update(Snapshot {
        system: Some(overview()),
        ..Snapshot::default()
    }));
    server.send(TransportEvent::Error("late failure".to_string()));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(!client.latest().has_data());
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert_eq!(transport.opens(), 1);
    assert_eq!(
        log.pairs().last(),
        Some(&(ConnectionState::Connected, ConnectionState::Disconnected))
    );
    assert_eq!(log.pairs().len(), 3);
}

#[tokio::test]
async fn test_disconnect_cancels_pending_reconnect() {
    let (transport, mut accepted) = FakeTransport::new();
    let (client, _log) = client_with(transport.clone(), policy(200, 5));
    let mut status = client.subscribe_status();

    client.connect().unwrap();
    let server = next_accepted(&mut accepted).await;
    wait_status(&mut status, |s| s.state == ConnectionState::Connected).await;

    server.send(TransportEvent::Error("connection reset".to_string()));
    let reconnecting = wait_status(&mut status, |s| s.state == ConnectionState::Reconnecting).await;
    assert_eq!(reconnecting.last_failure.as_deref(), Some("connection reset"));

    client.disconnect().await;
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(transport.opens(), 1);
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

mod against_server {
    use super::*;

    use monitor_server::{
        bind, BroadcastConfig, BroadcastService, HttpState, MetricSource, MetricSources,
        SnapshotAggregator, UnavailableSource,
    };

    struct FixedSource<T>(T);

    #[async_trait]
    impl<T: Clone + Send + Sync + 'static> MetricSource<T> for FixedSource<T> {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch(&self) -> monitor_server::Result<T> {
            Ok(self.0.clone())
        }
    }

    async fn wait_for_observers(service: &BroadcastService, expected: usize) {
        for _ in 0..300 {
            if service.observer_count().await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("observer count never reached {expected}");
    }

    #[tokio::test]
    async fn test_receives_snapshots_from_live_server() {
        let sources = MetricSources {
            system: Arc::new(FixedSource(overview())),
            cpu: Arc::new(FixedSource(cpu(30))),
            memory: Arc::new(FixedSource(memory())),
            docker: Arc::new(UnavailableSource::<Vec<DockerContainer>>::new(
                "docker",
                "no agent configured",
            )),
        };
        let aggregator = Arc::new(SnapshotAggregator::new(
            sources,
            Arc::new(monitor_server::NoopReporter),
        ));
        let service = Arc::new(BroadcastService::new(
            aggregator,
            BroadcastConfig::new(Duration::from_millis(50)).unwrap(),
            Arc::new(monitor_server::NoopReporter),
        ));
        let state = HttpState::new(service.clone(), None);
        let (addr, server) =
            bind(state, ([127, 0, 0, 1], 0).into(), std::future::pending()).unwrap();
        tokio::spawn(server);

        let client = StreamingClient::new(
            format!("ws://{}/ws/metrics", addr),
            policy(100, 3),
            Arc::new(TungsteniteTransport::new()),
            Arc::new(NoopReporter),
            None,
        );
        let mut status = client.subscribe_status();
        let mut snapshot = client.subscribe_snapshot();

        client.connect().unwrap();
        wait_status(&mut status, |s| s.state == ConnectionState::Connected).await;

        let latest = wait_snapshot(&mut snapshot, |s| s.has_data()).await;
        assert_eq!(latest.system.map(|s| s.hostname), Some("rpi-lab".to_string()));
        assert_eq!(latest.memory, Some(memory()));
        assert_eq!(latest.docker, None);
        wait_for_observers(&service, 1).await;

        client.disconnect().await;
        assert_eq!(client.state(), ConnectionState::Disconnected);
        wait_for_observers(&service, 0).await;
    }
}
