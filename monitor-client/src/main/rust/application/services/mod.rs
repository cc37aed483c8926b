mod monitor_api;
mod streaming_client;

pub use monitor_api::MonitorApi;
pub use streaming_client::{ClientStatus, StreamingClient};
