//! Tenant gateway (v1)
//!
//! A reverse proxy that routes each request to a backend service chosen by
//! its tenant (project id) header.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────┐
//!                              │                  TENANT GATEWAY                   │
//!                              │                                                   │
//!     Client Request           │  ┌─────────┐    ┌──────────────┐                  │
//!     ─────────────────────────┼─▶│  http   │───▶│   routing    │── 400 / 404 ─────┼──▶ Client
//!     (x-project-id)           │  │ server  │    │ tenant table │                  │
//!                              │  └─────────┘    └──────┬───────┘                  │
//!                              │                        │ upstream                 │
//!                              │                        ▼                          │
//!     Client Response          │  ┌─────────┐    ┌──────────────┐                  │
//!     ◀────────────────────────┼──│response │◀───│   forward    │◀─────────────────┼──── Upstream
//!                              │  │ / 500   │    │ (deadline)   │                  │     Service
//!                              │  └─────────┘    └──────────────┘                  │
//!                              │                                                   │
//!                              │  config · observability · security · lifecycle    │
//!                              └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use tenant_gateway::config::load_config;
use tenant_gateway::lifecycle::{launch, signals, Shutdown};
use tenant_gateway::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "tenant-gateway")]
#[command(about = "Routes requests to backend services by tenant header", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    init_logging(&config.observability);

    tracing::info!("tenant-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tenant_header = %config.routing.tenant_header,
        tenants = config.routing.upstreams.len(),
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    launch(config, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
