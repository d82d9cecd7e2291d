//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): relayed requests by method, status
//! - `relay_request_duration_seconds` (histogram): time to backend response headers
//! - `relay_upstream_errors_total` (counter): failed backend calls by method
//! - `relay_active_connections` (gauge): current connection count

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Count a relayed request and observe its duration.
pub fn record_request(method: &str, status: u16, start_time: Instant) {
    metrics::counter!(
        "relay_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("relay_request_duration_seconds", "method" => method.to_string())
        .record(start_time.elapsed().as_secs_f64());
}

/// Count a backend call that failed without a response.
pub fn record_upstream_error(method: &str) {
    metrics::counter!("relay_upstream_errors_total", "method" => method.to_string()).increment(1);
}

/// Increment the active connection gauge.
pub fn connection_opened() {
    metrics::gauge!("relay_active_connections").increment(1.0);
}

/// Decrement the active connection gauge.
pub fn connection_closed() {
    metrics::gauge!("relay_active_connections").decrement(1.0);
}
