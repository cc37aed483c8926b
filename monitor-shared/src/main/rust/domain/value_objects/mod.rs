mod api_response;
mod container;
mod health_status;
mod host_metrics;
mod retry_policy;
mod snapshot;
mod stream_message;

pub use api_response::ApiResponse;
pub use container::{
    ContainerCpu, ContainerIo, ContainerMemory, ContainerPort, ContainerStats, ContainerTraffic,
    DockerContainer,
};
pub use health_status::{HealthState, HealthStatus, ServiceAvailability};
pub use host_metrics::{
    usage_percent, CoreUsage, CpuMetrics, CpuSummary, LoadAverage, MemoryMetrics, SwapUsage,
    SystemOverview, UsageSummary,
};
pub use retry_policy::RetryPolicy;
pub use snapshot::{Snapshot, SnapshotField};
pub use stream_message::{
    format_timestamp, parse_timestamp, Decoded, StatusReport, StreamMessage,
};
