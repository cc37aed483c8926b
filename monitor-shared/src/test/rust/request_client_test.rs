use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use monitor_shared::{
    ApiResponse, HttpReply, HttpTransport, ReqwestTransport, RequestErrorKind, RetryPolicy,
    RetryingRequestClient, TransportFailure,
};
use warp::http::StatusCode;
use warp::Filter;

/// Replays a fixed script of replies; the last entry repeats forever
struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpReply, TransportFailure>>>,
    calls: AtomicU32,
    called_at: Mutex<Vec<tokio::time::Instant>>,
    stall: Option<Duration>,
}

impl ScriptedTransport {
    fn new(script: Vec<Result<HttpReply, TransportFailure>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicU32::new(0),
            called_at: Mutex::new(Vec::new()),
            stall: None,
        })
    }

    fn stalling(stall: Duration) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::from(vec![Ok(ok_reply(1))])),
            calls: AtomicU32::new(0),
            called_at: Mutex::new(Vec::new()),
            stall: Some(stall),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Offset of every call from `start`
    fn call_offsets(&self, start: tokio::time::Instant) -> Vec<Duration> {
        self.called_at
            .lock()
            .unwrap()
            .iter()
            .map(|at| at.duration_since(start))
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, _url: &str, _bearer_token: &str) -> Result<HttpReply, TransportFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.called_at.lock().unwrap().push(tokio::time::Instant::now());
        if let Some(stall) = self.stall {
            tokio::time::sleep(stall).await;
        }
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        }
    }
}

fn ok_reply(value: u32) -> HttpReply {
    HttpReply {
        status: 200,
        body: serde_json::to_string(&ApiResponse::ok(value)).unwrap(),
    }
}

fn status_reply(status: u16) -> HttpReply {
    HttpReply {
        status,
        body: "boom".to_string(),
    }
}

fn client(transport: Arc<ScriptedTransport>, policy: RetryPolicy) -> RetryingRequestClient {
    RetryingRequestClient::new(
        "http://monitor.local/",
        "secret",
        Duration::from_millis(200),
        policy,
        transport,
    )
}

fn fast_policy(attempts: u32) -> RetryPolicy {
    RetryPolicy::new(attempts, Duration::from_millis(10), 2.0).unwrap()
}

#[tokio::test]
async fn test_auth_failures_are_never_retried() {
    for status in [401u16, 403] {
        for attempts in 1..=4 {
            let transport = ScriptedTransport::new(vec![Ok(status_reply(status))]);
            let policy = RetryPolicy::new(attempts, Duration::from_secs(1), 2.0).unwrap();
            let client = client(transport.clone(), policy);

            let started = Instant::now();
            let err = client.request::<u32>("/api/system/cpu").await.unwrap_err();

            assert_eq!(transport.calls(), 1);
            assert_eq!(err.attempts, 1);
            assert_eq!(err.status_code, Some(status));
            assert!(err.is_terminal());
            assert_eq!(err.endpoint, "/api/system/cpu");
            assert!(started.elapsed() < Duration::from_millis(500));
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_retryable_failures_exhaust_budget() {
    let transport = ScriptedTransport::new(vec![Ok(status_reply(500))]);
    let client = client(transport.clone(), fast_policy(4));

    let started = tokio::time::Instant::now();
    let err = client.request::<u32>("/api/system/memory").await.unwrap_err();

    assert_eq!(transport.calls(), 4);
    assert_eq!(err.attempts, 4);
    assert_eq!(err.kind, RequestErrorKind::Http);
    assert_eq!(err.status_code, Some(500));
    // 10, 20 and 40 ms between attempts, none after the last
    assert_eq!(
        transport.call_offsets(started),
        vec![
            Duration::ZERO,
            Duration::from_millis(10),
            Duration::from_millis(30),
            Duration::from_millis(70),
        ]
    );
    assert_eq!(started.elapsed(), Duration::from_millis(70));
}

#[tokio::test(start_paused = true)]
async fn test_overflowing_backoff_still_fails_cleanly() {
    let transport = ScriptedTransport::new(vec![Ok(status_reply(500))]);
    let policy = RetryPolicy::new(3, Duration::from_millis(1), 1e300).unwrap();
    let client = client(transport.clone(), policy);

    let err = client.request::<u32>("/api/system/cpu").await.unwrap_err();

    assert_eq!(transport.calls(), 3);
    assert_eq!(err.attempts, 3);
    assert_eq!(err.kind, RequestErrorKind::Http);
}

#[tokio::test]
async fn test_single_attempt_budget_never_sleeps() {
    let transport = ScriptedTransport::new(vec![Err(TransportFailure::Network(
        "connection refused".to_string(),
    ))]);
    let client = client(
        transport.clone(),
        RetryPolicy::new(1, Duration::from_secs(5), 2.0).unwrap(),
    );

    let started = Instant::now();
    let err = client.request::<u32>("/api/health").await.unwrap_err();

    assert_eq!(transport.calls(), 1);
    assert_eq!(err.kind, RequestErrorKind::Network);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_recovers_on_third_attempt() {
    let transport = ScriptedTransport::new(vec![
        Ok(status_reply(500)),
        Ok(status_reply(500)),
        Ok(ok_reply(42)),
    ]);
    let client = client(transport.clone(), fast_policy(3));

    let started = Instant::now();
    let outcome = client
        .request_with::<u32>("/api/system/overview", &fast_policy(3))
        .await
        .unwrap();

    assert_eq!(outcome.value, 42);
    assert_eq!(outcome.attempts_made, 3);
    let delays: Vec<Duration> = outcome.failures.iter().map(|f| f.delay_before).collect();
    assert_eq!(delays, vec![Duration::ZERO, Duration::from_millis(10)]);
    assert!(started.elapsed() >= Duration::from_millis(30));
}

#[tokio::test]
async fn test_unsuccessful_envelope_is_retryable() {
    let failure = HttpReply {
        status: 200,
        body: serde_json::to_string(&ApiResponse::<u32>::failure("docker unavailable")).unwrap(),
    };
    let transport = ScriptedTransport::new(vec![Ok(failure), Ok(ok_reply(7))]);
    let client = client(transport.clone(), fast_policy(3));

    let outcome = client
        .request_with::<u32>("/api/docker/containers", &fast_policy(3))
        .await
        .unwrap();

    assert_eq!(outcome.value, 7);
    assert_eq!(outcome.failures[0].error.kind, RequestErrorKind::Unsuccessful);
    assert!(outcome.failures[0].error.message.contains("docker unavailable"));
}

#[tokio::test]
async fn test_malformed_payload_is_retryable() {
    let garbage = HttpReply {
        status: 200,
        body: "<html>proxy error</html>".to_string(),
    };
    let transport = ScriptedTransport::new(vec![Ok(garbage)]);
    let client = client(transport.clone(), fast_policy(2));

    let err = client.request::<u32>("/api/system/cpu").await.unwrap_err();

    assert_eq!(transport.calls(), 2);
    assert_eq!(err.kind, RequestErrorKind::MalformedPayload);
}

#[tokio::test]
async fn test_slow_attempts_time_out() {
    let transport = ScriptedTransport::stalling(Duration::from_secs(5));
    let client = RetryingRequestClient::new(
        "http://monitor.local",
        "secret",
        Duration::from_millis(20),
        fast_policy(2),
        transport.clone(),
    );

    let err = client.request::<u32>("/api/system/cpu").await.unwrap_err();

    assert_eq!(err.kind, RequestErrorKind::Timeout);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_reqwest_transport_against_live_server() {
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();

    let route = warp::path!("api" / "system" / "cpu")
        .and(warp::header::optional::<String>("authorization"))
        .map(move |auth: Option<String>| {
            let hit = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if auth.as_deref() != Some("Bearer secret") {
                return warp::reply::with_status(
                    warp::reply::json(&ApiResponse::<u32>::failure("Unauthorized")),
                    StatusCode::UNAUTHORIZED,
                );
            }
            if hit < 3 {
                warp::reply::with_status(
                    warp::reply::json(&ApiResponse::<u32>::failure("sensor busy")),
                    StatusCode::INTERNAL_SERVER_ERROR,
                )
            } else {
                warp::reply::with_status(warp::reply::json(&ApiResponse::ok(55u32)), StatusCode::OK)
            }
        });
    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(2)).unwrap());
    let base_url = format!("http://{}", addr);

    let client = RetryingRequestClient::new(
        base_url.clone(),
        "secret",
        Duration::from_secs(2),
        fast_policy(3),
        transport.clone(),
    );
    let value: u32 = client.request("/api/system/cpu").await.unwrap();
    assert_eq!(value, 55);
    assert_eq!(hits.load(Ordering::SeqCst), 3);

    let intruder = RetryingRequestClient::new(
        base_url,
        "wrong",
        Duration::from_secs(2),
        fast_policy(3),
        transport,
    );
    let err = intruder.request::<u32>("/api/system/cpu").await.unwrap_err();
    assert_eq!(err.kind, RequestErrorKind::Unauthorized);
    assert_eq!(hits.load(Ordering::SeqCst), 4);
}
