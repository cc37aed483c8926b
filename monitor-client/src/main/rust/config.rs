use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use monitor_shared::RetryPolicy;

use crate::domain::value_objects::ReconnectPolicy;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "monitor-client",
    version,
    about = "Follows a monitor-server metrics stream and queries its REST API"
)]
pub struct Config {
    /// Websocket endpoint of the metrics stream
    #[arg(long, env = "MONITOR_WEBSOCKET_URL", default_value = "ws://localhost:3001/ws/metrics")]
    pub websocket_url: String,

    /// Base URL of the REST API
    #[arg(long, env = "MONITOR_API_URL", default_value = "http://localhost:3001")]
    pub api_url: String,

    /// Bearer token sent with REST requests
    #[arg(long, env = "MONITOR_API_KEY", default_value = "")]
    pub api_key: String,

    /// Per-attempt request timeout
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "10000")]
    pub request_timeout_ms: u64,

    /// Attempts per REST request
    #[arg(long, env = "RETRY_ATTEMPTS", default_value = "3")]
    pub retry_attempts: u32,

    /// Delay before the first retry
    #[arg(long, env = "RETRY_DELAY_MS", default_value = "1000")]
    pub retry_delay_ms: u64,

    #[arg(long, env = "BACKOFF_MULTIPLIER", default_value = "2.0")]
    pub backoff_multiplier: f64,

    /// Base reconnect interval; delays grow to at most 4x this value
    #[arg(long, env = "RECONNECT_INTERVAL_MS", default_value = "5000")]
    pub reconnect_interval_ms: u64,

    #[arg(long, env = "MAX_RECONNECT_ATTEMPTS", default_value = "10")]
    pub max_reconnect_attempts: u32,

    /// Serve client metrics on this port (disabled when unset)
    #[arg(long, env = "METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Follow the metrics stream until Ctrl+C (default)
    Watch,
    /// Fetch one resource from the REST API
    Fetch {
        #[arg(value_enum)]
        resource: Resource,
    },
    /// Fetch resource usage of one container
    Stats { container_id: String },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Overview,
    Cpu,
    Memory,
    Containers,
    Health,
}

/// Minimum allowed port (ports below 1024 are privileged)
const MIN_USER_PORT: u16 = 1024;

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.websocket_url.starts_with("ws://") || self.websocket_url.starts_with("wss://")) {
            anyhow::bail!("Websocket URL must start with ws:// or wss://");
        }

        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            anyhow::bail!("API URL must start with http:// or https://");
        }

        if let Some(port) = self.metrics_port {
            if port == 0 {
                anyhow::bail!("Invalid metrics port: port cannot be 0");
            }
            if port < MIN_USER_PORT {
                anyhow::bail!(
                    "Invalid metrics port: {} is a privileged port (< {}). Use a port >= {}",
                    port,
                    MIN_USER_PORT,
                    MIN_USER_PORT
                );
            }
        }

        if self.request_timeout_ms == 0 {
            anyhow::bail!("Request timeout must be greater than 0");
        }

        self.to_retry_policy()?;
        self.to_reconnect_policy()
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        Ok(())
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Watch)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn to_retry_policy(&self) -> anyhow::Result<RetryPolicy> {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_delay_ms),
            self.backoff_multiplier,
        )
        .map_err(|e| anyhow::anyhow!("{}", e))
    }

    pub fn to_reconnect_policy(&self) -> crate::domain::errors::Result<ReconnectPolicy> {
        ReconnectPolicy::new(
            Duration::from_millis(self.reconnect_interval_ms),
            self.max_reconnect_attempts,
        )
    }
}
