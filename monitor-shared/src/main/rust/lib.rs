pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-exports for convenience
pub use application::services::{RequestOutcome, RetryAttempt, RetryingRequestClient};
pub use domain::errors::{ProtocolError, RequestError, RequestErrorKind, Result};
pub use domain::ports::{HttpReply, HttpTransport, TransportFailure};
pub use domain::value_objects::{
    format_timestamp, parse_timestamp, usage_percent, ApiResponse, ContainerCpu, ContainerIo,
    ContainerMemory, ContainerPort, ContainerStats, ContainerTraffic, CoreUsage, CpuMetrics,
    CpuSummary, Decoded, DockerContainer, HealthState, HealthStatus, LoadAverage, MemoryMetrics,
    RetryPolicy, ServiceAvailability, Snapshot, SnapshotField, StatusReport, StreamMessage,
    SwapUsage, SystemOverview, UsageSummary,
};
pub use infrastructure::http::ReqwestTransport;
