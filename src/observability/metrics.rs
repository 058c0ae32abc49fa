//! Metrics collection and exposition.
//!
//! # Metrics
//! - `api_requests_total` (counter): dispatched requests by method, route, status
//! - `api_request_duration_seconds` (histogram): dispatch latency by method, route
//! - `api_registration_errors_total` (counter): failed route declarations
//!
//! # Design Decisions
//! - Labels use the declared route pattern, never the raw path
//! - Recording without an installed exporter is a no-op

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter and its scrape listener.
/// Must be called from within the tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one dispatched request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let method = method.to_string();
    let route = route.to_string();

    ::metrics::counter!(
        "api_requests_total",
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status.to_string()
    )
    .increment(1);

    ::metrics::histogram!(
        "api_request_duration_seconds",
        "method" => method,
        "route" => route
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_registration_error() {
    ::metrics::counter!("api_registration_errors_total").increment(1);
}
