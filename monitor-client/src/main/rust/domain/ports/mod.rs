mod metrics_reporter;
mod status_listener;
mod stream_transport;

pub use metrics_reporter::{MetricsReporter, NoopReporter};
pub use status_listener::StatusListener;
pub use stream_transport::{StreamConnection, StreamTransport, TransportEvent};
