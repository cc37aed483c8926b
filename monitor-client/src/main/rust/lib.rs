pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-exports for convenience
pub use application::services::{ClientStatus, MonitorApi, StreamingClient};
pub use config::{Command, Config, Resource};
pub use domain::entities::{
    ConnectionLifecycle, LatestSnapshot, LifecycleAction, StateTransition, NORMAL_CLOSURE,
};
pub use domain::errors::{DomainError, Result};
pub use domain::ports::{
    MetricsReporter, NoopReporter, StatusListener, StreamConnection, StreamTransport,
    TransportEvent,
};
pub use domain::value_objects::{ConnectionState, ReconnectPolicy};
pub use infrastructure::console::{format_bytes, format_percentage, format_uptime, ConsoleRenderer};
pub use infrastructure::metrics::{bind_metrics, PrometheusReporter};
pub use infrastructure::websocket::TungsteniteTransport;
