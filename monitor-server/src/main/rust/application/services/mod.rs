mod broadcast_service;
mod snapshot_aggregator;

pub use broadcast_service::BroadcastService;
pub use snapshot_aggregator::{MetricSources, SampleReport, SnapshotAggregator, SourceFailure};
