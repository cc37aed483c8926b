use async_trait::async_trait;
use monitor_shared::ContainerStats;

use crate::domain::errors::Result;

/// Port for one independently fallible producer of a typed sub-snapshot
#[async_trait]
pub trait MetricSource<T>: Send + Sync {
    /// Stable name used in logs and metrics
    fn name(&self) -> &'static str;

    async fn fetch(&self) -> Result<T>;
}

/// Port for per-container resource usage, looked up on demand
#[async_trait]
pub trait ContainerStatsSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when the container is unknown or reports no stats
    async fn stats(&self, container_id: &str) -> Result<Option<ContainerStats>>;
}
