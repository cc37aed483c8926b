pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-exports for convenience
pub use application::services::{
    BroadcastService, MetricSources, SampleReport, SnapshotAggregator, SourceFailure,
};
pub use config::Config;
pub use domain::entities::{ObserverRegistration, ObserverState};
pub use domain::errors::{DomainError, Result};
pub use domain::ports::{
    ContainerStatsSource, DeliveryError, MetricSource, MetricsReporter, NoopReporter, ObserverSink,
};
pub use domain::value_objects::{BroadcastConfig, ObserverId};
pub use infrastructure::http::{bind, routes, HttpState};
pub use infrastructure::metrics::PrometheusReporter;
pub use infrastructure::sources::{
    CpuSource, MemorySource, RemoteSource, RemoteStatsSource, SysinfoProbe, SystemOverviewSource,
    UnavailableSource,
};
