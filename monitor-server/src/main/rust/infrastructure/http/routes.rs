use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use monitor_shared::{
    format_timestamp, ApiResponse, ContainerStats, HealthState, HealthStatus, ServiceAvailability,
};
use serde::Serialize;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use super::websocket_observer::serve_observer;
use crate::application::services::BroadcastService;
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{ContainerStatsSource, MetricSource};
use crate::infrastructure::metrics::PrometheusReporter;
use crate::infrastructure::sources::UnavailableSource;

/// Everything the route handlers share
#[derive(Clone)]
pub struct HttpState {
    pub broadcast: Arc<BroadcastService>,
    pub api_key: Option<Arc<str>>,
    pub container_stats: Arc<dyn ContainerStatsSource>,
    pub started_at: Instant,
}

impl HttpState {
    pub fn new(broadcast: Arc<BroadcastService>, api_key: Option<String>) -> Self {
        Self {
            broadcast,
            api_key: api_key.filter(|key| !key.is_empty()).map(Arc::from),
            container_stats: Arc::new(UnavailableSource::<ContainerStats>::new(
                "docker",
                "no docker agent configured",
            )),
            started_at: Instant::now(),
        }
    }

    pub fn with_container_stats(mut self, source: Arc<dyn ContainerStatsSource>) -> Self {
        self.container_stats = source;
        self
    }
}

#[derive(Debug)]
struct Unauthorized;

impl warp::reject::Reject for Unauthorized {}

pub fn routes(
    state: HttpState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    // CORS configuration for browser access
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "OPTIONS"])
        .allow_headers(vec!["Content-Type", "Authorization"]);

    let stream_route = warp::path!("ws" / "metrics")
        .and(warp::ws())
        .and(with_broadcast(state.broadcast.clone()))
        .map(|ws: warp::ws::Ws, service: Arc<BroadcastService>| {
            ws.on_upgrade(move |socket| serve_observer(socket, service))
        });

    let sources = state.broadcast.aggregator().sources().clone();

    let health_route = warp::path!("api" / "health")
        .and(authorized(state.api_key.clone()))
        .and(with_state(state.clone()))
        .and_then(health);

    let overview_route = warp::path!("api" / "system" / "overview")
        .and(authorized(state.api_key.clone()))
        .and(with_source(sources.system.clone()))
        .and_then(|source| source_reply(source, "Failed to retrieve system overview"));

    let cpu_route = warp::path!("api" / "system" / "cpu")
        .and(authorized(state.api_key.clone()))
        .and(with_source(sources.cpu.clone()))
        .and_then(|source| source_reply(source, "Failed to retrieve CPU metrics"));

    let memory_route = warp::path!("api" / "system" / "memory")
        .and(authorized(state.api_key.clone()))
        .and(with_source(sources.memory.clone()))
        .and_then(|source| source_reply(source, "Failed to retrieve memory metrics"));

    let containers_route = warp::path!("api" / "docker" / "containers")
        .and(authorized(state.api_key.clone()))
        .and(with_source(sources.docker.clone()))
        .and_then(|source| source_reply(source, "Failed to retrieve containers"));

    let stats_route = warp::path!("api" / "docker" / "containers" / String / "stats")
        .and(authorized(state.api_key.clone()))
        .and(with_stats(state.container_stats.clone()))
        .and_then(container_stats);

    let metrics_route = warp::path!("metrics").map(|| {
        let body = PrometheusReporter::gather_metrics();
        warp::reply::with_header(body, "content-type", "text/plain; version=0.0.4; charset=utf-8")
    });

    let api = warp::get().and(
        health_route
            .or(overview_route)
            .or(cpu_route)
            .or(memory_route)
            .or(containers_route)
            .or(stats_route)
            .or(metrics_route),
    );

    stream_route
        .or(api)
        .recover(handle_rejection)
        .with(cors)
}

/// Bind the server; the returned future runs it until `shutdown` resolves
pub fn bind(
    state: HttpState,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, impl Future<Output = ()>)> {
    warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .map_err(|e| DomainError::BindFailed(e.to_string()))
}

fn with_broadcast(
    service: Arc<BroadcastService>,
) -> impl Filter<Extract = (Arc<BroadcastService>,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

fn with_state(state: HttpState) -> impl Filter<Extract = (HttpState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn with_source<T: Send + Sync + 'static>(
    source: Arc<dyn MetricSource<T>>,
) -> impl Filter<Extract = (Arc<dyn MetricSource<T>>,), Error = Infallible> + Clone {
    warp::any().map(move || source.clone())
}

fn with_stats(
    source: Arc<dyn ContainerStatsSource>,
) -> impl Filter<Extract = (Arc<dyn ContainerStatsSource>,), Error = Infallible> + Clone {
    warp::any().map(move || source.clone())
}

/// Rejects `/api/*` requests lacking the configured bearer token
fn authorized(api_key: Option<Arc<str>>) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and_then(move |header: Option<String>| {
            let api_key = api_key.clone();
            async move {
                match api_key {
                    None => Ok(()),
                    Some(key) => {
                        let presented = header
                            .as_deref()
                            .and_then(|value| value.strip_prefix("Bearer "));
                        if presented == Some(&*key) {
                            Ok(())
                        } else {
                            Err(warp::reject::custom(Unauthorized))
                        }
                    }
                }
            }
        })
        .untuple_one()
}

async fn source_reply<T: Serialize>(
    source: Arc<dyn MetricSource<T>>,
    failure: &'static str,
) -> std::result::Result<impl Reply, Rejection> {
    match source.fetch().await {
        Ok(data) => Ok(warp::reply::with_status(
            warp::reply::json(&ApiResponse::ok(data)),
            StatusCode::OK,
        )),
        Err(e) => {
            tracing::error!(source = source.name(), "{}: {}", failure, e);
            Ok(warp::reply::with_status(
                warp::reply::json(&ApiResponse::<()>::failure(failure)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

async fn container_stats(
    container_id: String,
    source: Arc<dyn ContainerStatsSource>,
) -> std::result::Result<impl Reply, Rejection> {
    let reply = match source.stats(&container_id).await {
        Ok(Some(stats)) => warp::reply::with_status(
            warp::reply::json(&ApiResponse::ok(stats)),
            StatusCode::OK,
        ),
        Ok(None) => warp::reply::with_status(
            warp::reply::json(&ApiResponse::<()>::failure(
                "Container not found or stats unavailable",
            )),
            StatusCode::NOT_FOUND,
        ),
        Err(e) => {
            tracing::error!(container_id = %container_id, "Failed to get container stats: {}", e);
            let failure = ApiResponse::<()>::failure("Failed to retrieve container stats");
            warp::reply::with_status(warp::reply::json(&failure), StatusCode::INTERNAL_SERVER_ERROR)
        }
    };
    Ok(reply)
}

async fn health(state: HttpState) -> std::result::Result<impl Reply, Rejection> {
    let sources = state.broadcast.aggregator().sources();
    let (system, docker) = tokio::join!(sources.system.fetch(), sources.docker.fetch());

    let services = ServiceAvailability {
        system: system.is_ok(),
        docker: docker.is_ok(),
        cache: true,
    };
    let status = if services.system {
        HealthState::Healthy
    } else {
        HealthState::Unhealthy
    };

    let report = HealthStatus {
        status,
        timestamp: format_timestamp(&Utc::now()),
        uptime: state.started_at.elapsed().as_secs_f64(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    };

    let code = match status {
        HealthState::Healthy => StatusCode::OK,
        HealthState::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    Ok(warp::reply::with_status(
        warp::reply::json(&ApiResponse::ok(report)),
        code,
    ))
}

async fn handle_rejection(err: Rejection) -> std::result::Result<impl Reply, Rejection> {
    if err.find::<Unauthorized>().is_some() {
        return Ok(warp::reply::with_status(
            warp::reply::json(&ApiResponse::<()>::failure("Unauthorized")),
            StatusCode::UNAUTHORIZED,
        ));
    }
    Err(err)
}
