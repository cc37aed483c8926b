use lazy_static::lazy_static;
use prometheus::{Encoder, Gauge, IntCounter, Registry, TextEncoder};

use crate::domain::ports::MetricsReporter;
use crate::domain::value_objects::ConnectionState;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Connection state (0=Disconnected, 1=Connecting, 2=Connected, 3=Reconnecting, 4=Error)
    pub static ref CONNECTION_STATE: Gauge = Gauge::new(
        "monitor_stream_connection_state",
        "Current stream connection state"
    ).expect("metric can be created");

    // Total reconnection attempts
    pub static ref RECONNECT_ATTEMPTS: IntCounter = IntCounter::new(
        "reconnect_attempts_total",
        "Total number of reconnection attempts"
    ).expect("metric can be created");

    // Current backoff delay in seconds
    pub static ref BACKOFF_SECONDS: Gauge = Gauge::new(
        "reconnect_backoff_seconds",
        "Current reconnection backoff delay"
    ).expect("metric can be created");

    pub static ref MESSAGES_RECEIVED: IntCounter = IntCounter::new(
        "stream_messages_received_total",
        "Stream messages decoded successfully"
    ).expect("metric can be created");

    pub static ref MALFORMED_MESSAGES: IntCounter = IntCounter::new(
        "stream_malformed_messages_total",
        "Stream messages dropped because they could not be decoded"
    ).expect("metric can be created");

    // Connection uptime
    pub static ref UPTIME_SECONDS: Gauge = Gauge::new(
        "stream_uptime_seconds",
        "Time since the stream connection was established"
    ).expect("metric can be created");
}

pub struct PrometheusReporter;

impl PrometheusReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn init_metrics() -> Result<(), prometheus::Error> {
        REGISTRY.register(Box::new(CONNECTION_STATE.clone()))?;
        REGISTRY.register(Box::new(RECONNECT_ATTEMPTS.clone()))?;
        REGISTRY.register(Box::new(BACKOFF_SECONDS.clone()))?;
        REGISTRY.register(Box::new(MESSAGES_RECEIVED.clone()))?;
        REGISTRY.register(Box::new(MALFORMED_MESSAGES.clone()))?;
        REGISTRY.register(Box::new(UPTIME_SECONDS.clone()))?;
        Ok(())
    }

    pub fn gather_metrics() -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = REGISTRY.gather();
        let mut buffer = vec![];
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return b"# Error encoding metrics\n".to_vec();
        }
        buffer
    }
}

impl Default for PrometheusReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsReporter for PrometheusReporter {
    fn report_state_change(&self, state: &ConnectionState) {
        CONNECTION_STATE.set(state.as_metric());
    }

    fn report_reconnect_attempt(&self) {
        RECONNECT_ATTEMPTS.inc();
    }

    fn report_backoff(&self, delay_secs: f64) {
        BACKOFF_SECONDS.set(delay_secs);
    }

    fn report_message_received(&self) {
        MESSAGES_RECEIVED.inc();
    }

    fn report_malformed_message(&self) {
        MALFORMED_MESSAGES.inc();
    }

    fn report_uptime(&self, uptime_secs: f64) {
        UPTIME_SECONDS.set(uptime_secs);
    }
}
