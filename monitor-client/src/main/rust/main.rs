use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use monitor_client::{
    bind_metrics, Command, Config, ConsoleRenderer, MonitorApi, PrometheusReporter, Resource,
    StateTransition, StatusListener, StreamingClient, TungsteniteTransport,
};
use monitor_shared::{ReqwestTransport, RetryingRequestClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration
    let config = Config::parse();

    // Initialize logging
    let filter = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    // Validate CLI configuration
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return Err(e);
    }

    match config.command() {
        Command::Watch => watch(&config).await,
        Command::Fetch { resource } => fetch(&config, resource).await,
        Command::Stats { container_id } => {
            let api = build_api(&config)?;
            print_json(&api.container_stats(&container_id).await?)
        }
    }
}

async fn watch(config: &Config) -> Result<()> {
    // Initialize metrics
    PrometheusReporter::init_metrics()?;

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let metrics_server = match config.metrics_port {
        Some(port) => {
            let (addr, server) = bind_metrics(port, async {
                stop_rx.await.ok();
            })?;
            info!("Metrics server listening on http://{}", addr);
            Some(tokio::spawn(server))
        }
        None => None,
    };

    let listener: Arc<dyn StatusListener> = Arc::new(|transition: &StateTransition| {
        println!("{}", ConsoleRenderer::render_status(transition));
    });

    let client = StreamingClient::new(
        config.websocket_url.clone(),
        config.to_reconnect_policy()?,
        Arc::new(TungsteniteTransport::new()),
        Arc::new(PrometheusReporter::new()),
        Some(listener),
    );

    info!("Following metrics stream at {}", client.url());
    let mut snapshots = client.subscribe_snapshot();
    client.connect()?;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = snapshots.borrow_and_update().clone();
                println!("{}\n", ConsoleRenderer::render_snapshot(&latest));
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    client.disconnect().await;

    // Signal shutdown to metrics server
    let _ = stop_tx.send(());
    if let Some(server) = metrics_server {
        server.await?;
    }

    info!("Client shutdown complete");
    Ok(())
}

async fn fetch(config: &Config, resource: Resource) -> Result<()> {
    let api = build_api(config)?;
    match resource {
        Resource::Overview => print_json(&api.system_overview().await?),
        Resource::Cpu => print_json(&api.cpu_metrics().await?),
        Resource::Memory => print_json(&api.memory_metrics().await?),
        Resource::Containers => print_json(&api.containers().await?),
        Resource::Health => print_json(&api.health().await?),
    }
}

fn build_api(config: &Config) -> Result<MonitorApi> {
    let transport = Arc::new(ReqwestTransport::new(config.request_timeout())?);
    let client = RetryingRequestClient::new(
        config.api_url.clone(),
        config.api_key.clone(),
        config.request_timeout(),
        config.to_retry_policy()?,
        transport,
    );
    Ok(MonitorApi::new(client))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
