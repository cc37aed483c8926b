use crate::domain::value_objects::ConnectionState;

/// Port for metrics reporting
pub trait MetricsReporter: Send + Sync {
    fn report_state_change(&self, state: &ConnectionState);
    fn report_reconnect_attempt(&self);
    fn report_backoff(&self, delay_secs: f64);
    fn report_message_received(&self);
    fn report_malformed_message(&self);
    fn report_uptime(&self, uptime_secs: f64);
}

/// Reporter that discards everything
pub struct NoopReporter;

impl MetricsReporter for NoopReporter {
    fn report_state_change(&self, _state: &ConnectionState) {}
    fn report_reconnect_attempt(&self) {}
    fn report_backoff(&self, _delay_secs: f64) {}
    fn report_message_received(&self) {}
    fn report_malformed_message(&self) {}
    fn report_uptime(&self, _uptime_secs: f64) {}
}
