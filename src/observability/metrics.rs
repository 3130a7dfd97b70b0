//! Metrics collection and exposition.
//!
//! # Metrics
//! - `local_server_requests_total` (counter): HTTP requests by method, status
//! - `local_server_request_duration_seconds` (histogram): time to answer
//! - `local_server_bridge_events_total` (counter): registered, delivered,
//!   timeout, unknown, handler_missing
//! - `local_server_pending_requests` (gauge): requests awaiting a response
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("local_server_requests_total", &labels).increment(1);
    metrics::histogram!("local_server_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_bridge_event(event: &'static str) {
    metrics::counter!("local_server_bridge_events_total", "event" => event).increment(1);
}

pub fn record_pending(count: usize) {
    metrics::gauge!("local_server_pending_requests").set(count as f64);
}
