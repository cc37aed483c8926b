mod metric_source;
mod metrics_reporter;
mod observer_sink;

pub use metric_source::{ContainerStatsSource, MetricSource};
pub use metrics_reporter::{MetricsReporter, NoopReporter};
pub use observer_sink::{DeliveryError, ObserverSink};
