/// Port for metrics reporting
pub trait MetricsReporter: Send + Sync {
    fn report_observer_connected(&self);
    fn report_observer_disconnected(&self);
    fn report_broadcast(&self);
    fn report_source_failure(&self, source: &str);
    fn report_delivery_failure(&self);
}

/// Reporter that discards everything
pub struct NoopReporter;

impl MetricsReporter for NoopReporter {
    fn report_observer_connected(&self) {}
    fn report_observer_disconnected(&self) {}
    fn report_broadcast(&self) {}
    fn report_source_failure(&self, _source: &str) {}
    fn report_delivery_failure(&self) {}
}
