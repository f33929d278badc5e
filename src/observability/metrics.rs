//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, tenant
//! - `gateway_request_duration_seconds` (histogram): latency by method, tenant
//! - `gateway_rejections_total` (counter): local rejections by reason
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Unknown tenants are labelled "none" to keep label cardinality bounded

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Label used when no configured tenant was resolved.
pub const NO_TENANT: &str = "none";

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished request.
pub fn record_request(method: &str, status: u16, tenant: &str, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "tenant" => tenant.to_string()
    )
    .increment(1);

    histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "tenant" => tenant.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a locally produced rejection.
pub fn record_rejection(reason: &'static str) {
    counter!("gateway_rejections_total", "reason" => reason).increment(1);
}
