//! Startup orchestration.
//!
//! # Responsibilities
//! - Compile the routing table from validated configuration
//! - Start background tasks (metrics, admin API)
//! - Bind listeners and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::io;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::admin::{serve_admin, AdminState};
use crate::config::GatewayConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::routing::BuildError;

/// Fatal startup failure.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("routing table: {0}")]
    Routing(#[from] BuildError),
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}

async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.to_string(),
            source,
        })
}

/// Start every listener for `config` and serve until `shutdown` fires.
pub async fn launch(config: GatewayConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(&config)?;

    if config.admin.enabled {
        let listener = bind(&config.admin.bind_address).await?;
        let state = AdminState::new(server.tenants(), &config.admin.api_key);
        let admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = serve_admin(listener, state, admin_shutdown).await {
                tracing::error!(error = %e, "Admin API stopped");
            }
        });
    }

    let listener = bind(&config.listener.bind_address).await?;
    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)
}
