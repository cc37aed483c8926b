use std::future::Future;
use std::net::SocketAddr;

use warp::Filter;

use super::PrometheusReporter;

/// Bind the client's metrics endpoint; the returned future serves until `shutdown` resolves
pub fn bind_metrics(
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, impl Future<Output = ()>), warp::Error> {
    // CORS configuration for browser access
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "OPTIONS"])
        .allow_headers(vec!["Content-Type"]);

    let health_route = warp::path("health")
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    let metrics_route = warp::path("metrics").map(|| {
        let body = PrometheusReporter::gather_metrics();
        warp::reply::with_header(body, "content-type", "text/plain; version=0.0.4; charset=utf-8")
    });

    let routes = health_route.or(metrics_route).with(cors);

    warp::serve(routes).try_bind_with_graceful_shutdown(([0, 0, 0, 0], port), shutdown)
}
