use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::domain::ports::MetricsReporter;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref ACTIVE_OBSERVERS: IntGauge = IntGauge::new(
        "monitor_active_observers",
        "Number of currently registered stream observers"
    ).expect("metric can be created");
    pub static ref TOTAL_OBSERVERS: IntCounter = IntCounter::new(
        "monitor_observer_connections_total",
        "Total number of stream observers registered since server start"
    ).expect("metric can be created");
    pub static ref BROADCASTS: IntCounter = IntCounter::new(
        "monitor_broadcasts_total",
        "Total number of metrics updates delivered to observers"
    ).expect("metric can be created");
    pub static ref SOURCE_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "monitor_source_failures_total",
            "Metric source reads that failed, by source"
        ),
        &["source"]
    ).expect("metric can be created");
    pub static ref DELIVERY_FAILURES: IntCounter = IntCounter::new(
        "monitor_delivery_failures_total",
        "Sends to an observer that failed without closing it"
    ).expect("metric can be created");
}

pub struct PrometheusReporter;

impl PrometheusReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn init_metrics() -> Result<(), prometheus::Error> {
        REGISTRY.register(Box::new(ACTIVE_OBSERVERS.clone()))?;
        REGISTRY.register(Box::new(TOTAL_OBSERVERS.clone()))?;
        REGISTRY.register(Box::new(BROADCASTS.clone()))?;
        REGISTRY.register(Box::new(SOURCE_FAILURES.clone()))?;
        REGISTRY.register(Box::new(DELIVERY_FAILURES.clone()))?;
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
    fn report_observer_connected(&self) {
        ACTIVE_OBSERVERS.inc();
        TOTAL_OBSERVERS.inc();
    }

    fn report_observer_disconnected(&self) {
        ACTIVE_OBSERVERS.dec();
    }

    fn report_broadcast(&self) {
        BROADCASTS.inc();
    }

    fn report_source_failure(&self, source: &str) {
        SOURCE_FAILURES.with_label_values(&[source]).inc();
    }

    fn report_delivery_failure(&self) {
        DELIVERY_FAILURES.inc();
    }
}
