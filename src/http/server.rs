//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (request ID, tracing)
//! - Bind server to listener, stop on the shutdown broadcast
//! - Resolve each request's tenant and forward it upstream
//! - Observability (metrics, structured logs with request IDs)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::http::forward::Forwarder;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::http::response::ProxyError;
use crate::observability::metrics;
use crate::routing::{BuildError, TenantRouter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<TenantRouter>,
    pub forwarder: Forwarder,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    tenants: Arc<TenantRouter>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// The routing table is compiled here, once, and never rebuilt.
    pub fn new(config: &GatewayConfig) -> Result<Self, BuildError> {
        let tenants = Arc::new(TenantRouter::from_config(&config.routing)?);
        let state = AppState {
            router: tenants.clone(),
            forwarder: Forwarder::from_config(config),
        };

        let router = Self::build_router(state);
        Ok(Self { router, tenants })
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request.request_id(),
                        )
                    }))
                    .layer(propagate_request_id_layer()),
            )
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            tenants = self.tenants.table().len(),
            tenant_header = %self.tenants.tenant_header(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The compiled tenant router, shared with the admin API.
    pub fn tenants(&self) -> Arc<TenantRouter> {
        self.tenants.clone()
    }
}

/// Main proxy handler.
/// Resolves the tenant, then forwards the request or rejects it locally.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    // 1. Resolve tenant (no network before this succeeds)
    let route = match state.router.resolve(request.headers()) {
        Ok(route) => route,
        Err(e) => {
            let err = ProxyError::from(e);
            tracing::warn!(request_id = %request_id, path = %path, error = %err, "Request rejected");
            return reject(err, method.as_str(), metrics::NO_TENANT, start_time);
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        tenant = %route.tenant,
        upstream = %route.upstream,
        "Proxying request"
    );

    // 2. Forward
    match state.forwarder.forward(route.upstream, request, client).await {
        Ok(response) => {
            metrics::record_request(
                method.as_str(),
                response.status().as_u16(),
                &route.tenant,
                start_time,
            );
            tracing::debug!(
                request_id = %request_id,
                tenant = %route.tenant,
                status = %response.status(),
                elapsed = ?start_time.elapsed(),
                "Upstream responded"
            );
            response
        }
        Err(err) => {
            match &err {
                ProxyError::UpstreamUnavailable(_) | ProxyError::UpstreamTimeout(_) => {
                    tracing::error!(
                        request_id = %request_id,
                        tenant = %route.tenant,
                        upstream = %route.upstream,
                        error = ?err,
                        "Upstream error"
                    );
                }
                _ => {
                    tracing::warn!(request_id = %request_id, tenant = %route.tenant, error = %err, "Request rejected");
                }
            }
            reject(err, method.as_str(), &route.tenant, start_time)
        }
    }
}

fn reject(err: ProxyError, method: &str, tenant: &str, start_time: Instant) -> Response {
    metrics::record_rejection(err.reason());
    metrics::record_request(method, err.status().as_u16(), tenant, start_time);
    err.into_response()
}
