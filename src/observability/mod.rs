//! Logs and metrics for the gateway.
//!
//! ```text
//! proxy_handler ──► logging.rs  (one event per rejection / upstream failure)
//!               └─► metrics.rs  (per-tenant request counts and latency)
//! ```
//!
//! Every event carries the request id assigned by `http::request`, so a
//! rejected or failed request can be matched with the upstream's own logs.
//! Metrics recording is a no-op unless the Prometheus exporter is enabled.

pub mod logging;
pub mod metrics;
