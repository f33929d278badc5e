//! Timeout enforcement.
//!
//! # Responsibilities
//! - Hold the connect and round-trip deadlines for upstream calls
//! - Cancel operations cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Expiry drops the wrapped future, which closes its upstream connection
//! - Timeout errors are distinct from other errors

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::config::schema::TimeoutConfig;

/// The deadline elapsed before the operation finished.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("deadline of {0:?} elapsed")]
pub struct DeadlineElapsed(pub Duration);

/// Deadlines applied to every upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamTimeouts {
    pub connect: Duration,
    pub round_trip: Duration,
}

impl UpstreamTimeouts {
    pub fn from_config(config: &TimeoutConfig) -> Self {
        Self {
            connect: Duration::from_secs(config.connect_secs),
            round_trip: Duration::from_secs(config.upstream_secs),
        }
    }

    /// Run `fut` under the round-trip deadline.
    pub async fn enforce<F: Future>(&self, fut: F) -> Result<F::Output, DeadlineElapsed> {
        tokio::time::timeout(self.round_trip, fut)
            .await
            .map_err(|_| DeadlineElapsed(self.round_trip))
    }
}

impl Default for UpstreamTimeouts {
    fn default() -> Self {
        Self::from_config(&TimeoutConfig::default())
    }
}
