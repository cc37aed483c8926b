use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use monitor_shared::RetryPolicy;

use crate::domain::value_objects::BroadcastConfig;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "monitor-server",
    version,
    about = "Pushes host metric snapshots to websocket observers and serves them over REST"
)]
pub struct Config {
    /// Address to bind the HTTP server to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// HTTP and websocket port
    #[arg(short, long, env = "PORT", default_value = "3001")]
    pub port: u16,

    /// Milliseconds between metrics pushes to each observer
    #[arg(long, env = "TICK_INTERVAL_MS", default_value = "5000")]
    pub tick_interval_ms: u64,

    /// Bearer token required on /api/* requests (disabled when unset)
    #[arg(long, env = "MONITOR_API_KEY")]
    pub api_key: Option<String>,

    /// Base URL of a remote agent serving /api/docker/containers
    #[arg(long, env = "DOCKER_AGENT_URL")]
    pub docker_agent_url: Option<String>,

    /// Bearer token presented to the docker agent
    #[arg(long, env = "DOCKER_AGENT_API_KEY", default_value = "")]
    pub docker_agent_api_key: String,

    /// Per-attempt timeout for agent requests
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "10000")]
    pub request_timeout_ms: u64,

    /// Attempts per agent request
    #[arg(long, env = "RETRY_ATTEMPTS", default_value = "3")]
    pub retry_attempts: u32,

    /// Delay before the first retry
    #[arg(long, env = "RETRY_DELAY_MS", default_value = "1000")]
    pub retry_delay_ms: u64,

    #[arg(long, env = "BACKOFF_MULTIPLIER", default_value = "2.0")]
    pub backoff_multiplier: f64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Minimum allowed port (ports below 1024 are privileged)
const MIN_USER_PORT: u16 = 1024;

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.port == 0 {
            anyhow::bail!("Invalid port: port cannot be 0");
        }
        if self.port < MIN_USER_PORT {
            anyhow::bail!(
                "Invalid port: {} is a privileged port (< {}). Use a port >= {}",
                self.port,
                MIN_USER_PORT,
                MIN_USER_PORT
            );
        }

        if self.request_timeout_ms == 0 {
            anyhow::bail!("Request timeout must be greater than 0");
        }

        if let Some(url) = &self.docker_agent_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("Docker agent URL must start with http:// or https://: {}", url);
            }
        }

        self.to_broadcast_config()?;
        self.to_retry_policy()?;

        Ok(())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn to_broadcast_config(&self) -> anyhow::Result<BroadcastConfig> {
        BroadcastConfig::new(Duration::from_millis(self.tick_interval_ms))
            .map_err(|e| anyhow::anyhow!("{}", e))
    }

    pub fn to_retry_policy(&self) -> anyhow::Result<RetryPolicy> {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_delay_ms),
            self.backoff_multiplier,
        )
        .map_err(|e| anyhow::anyhow!("{}", e))
    }
}
