use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::oneshot;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use monitor_server::{
    bind, BroadcastService, Config, ContainerStatsSource, CpuSource, HttpState, MemorySource,
    MetricSource, MetricSources, PrometheusReporter, RemoteSource, RemoteStatsSource,
    SnapshotAggregator, SysinfoProbe, SystemOverviewSource, UnavailableSource,
};
use monitor_shared::{ContainerStats, DockerContainer, ReqwestTransport, RetryingRequestClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration
    let config = Config::parse();

    // Initialize logging
    let default_level = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!("Starting monitor-server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    // Validate CLI configuration
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return Err(e);
    }

    // Initialize metrics
    PrometheusReporter::init_metrics()?;
    info!("Metrics initialized");

    let metrics_reporter = Arc::new(PrometheusReporter::new());
    let (sources, container_stats) = build_sources(&config)?;
    let aggregator = Arc::new(SnapshotAggregator::new(sources, metrics_reporter.clone()));
    let broadcast = Arc::new(BroadcastService::new(
        aggregator,
        config.to_broadcast_config()?,
        metrics_reporter,
    ));

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let state = HttpState::new(broadcast.clone(), config.api_key.clone())
        .with_container_stats(container_stats);
    let (addr, server) = bind(state, config.bind_addr(), async {
        let _ = stop_rx.await;
    })
    .map_err(|e| anyhow::anyhow!("{}", e))?;

    info!("-------------------------------------------------------");
    info!("Monitor Server Ready");
    info!("   Stream:  ws://{}/ws/metrics", addr);
    info!("   API:     http://{}/api/health", addr);
    info!("   Metrics: http://{}/metrics", addr);
    info!("   Tick:    {} ms", config.tick_interval_ms);
    info!("-------------------------------------------------------");

    let server = tokio::spawn(server);

    // Handle graceful shutdown
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received (Ctrl+C)"),
        Err(err) => error!("Failed to listen for shutdown signal: {}", err),
    }

    broadcast.shutdown().await;
    let _ = stop_tx.send(());
    server.await?;

    info!("Server stopped gracefully");
    Ok(())
}

fn build_sources(config: &Config) -> Result<(MetricSources, Arc<dyn ContainerStatsSource>)> {
    let probe = SysinfoProbe::new();

    let (docker, container_stats) = match &config.docker_agent_url {
        Some(url) => {
            let transport = Arc::new(ReqwestTransport::new(config.request_timeout())?);
            let client = Arc::new(RetryingRequestClient::new(
                url.clone(),
                config.docker_agent_api_key.clone(),
                config.request_timeout(),
                config.to_retry_policy()?,
                transport,
            ));
            info!("Container data served by agent at {}", url);
            let containers: Arc<dyn MetricSource<Vec<DockerContainer>>> = Arc::new(
                RemoteSource::new("docker", "/api/docker/containers", client.clone()),
            );
            let stats: Arc<dyn ContainerStatsSource> = Arc::new(RemoteStatsSource::new(client));
            (containers, stats)
        }
        None => {
            info!("No docker agent configured; container field will be empty");
            let reason = "no docker agent configured";
            let containers: Arc<dyn MetricSource<Vec<DockerContainer>>> =
                Arc::new(UnavailableSource::new("docker", reason));
            let stats: Arc<dyn ContainerStatsSource> =
                Arc::new(UnavailableSource::<ContainerStats>::new("docker", reason));
            (containers, stats)
        }
    };

    let sources = MetricSources {
        system: Arc::new(SystemOverviewSource(probe.clone())),
        cpu: Arc::new(CpuSource(probe.clone())),
        memory: Arc::new(MemorySource(probe)),
        docker,
    };
    Ok((sources, container_stats))
}
