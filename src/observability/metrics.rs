//! Metrics collection and exposition.
//!
//! # Metrics
//! - `preview_proxy_requests_total` (counter): requests by method, status, outcome
//! - `preview_proxy_request_duration_seconds` (histogram): latency distribution
//! - `preview_proxy_decisions_total` (counter): rewrite decisions by outcome
//!
//! # Design Decisions
//! - Low-overhead metric updates through the `metrics` facade
//! - Outcome labels come from a closed set, keeping cardinality bounded

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Outcome label for requests the rewrite rule never saw.
pub const OUTCOME_EXCLUDED: &str = "excluded";

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed proxied request.
pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!("preview_proxy_requests_total", &labels).increment(1);
    histogram!("preview_proxy_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record the rewrite decision taken for a request.
pub fn record_decision(outcome: &'static str) {
    counter!("preview_proxy_decisions_total", "outcome" => outcome).increment(1);
}
