//! Response handling and local rejections.
//!
//! # Responsibilities
//! - Map every local failure to a well-formed JSON response
//! - Keep the status/body contract for rejections in one place
//!
//! # Design Decisions
//! - Rejections never reach an upstream and never panic
//! - Every forwarding failure collapses to the same 500 body
//! - Upstream detail goes to logs, never to the client

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::resilience::timeouts::DeadlineElapsed;
use crate::routing::RouteError;

pub const MISSING_TENANT_MESSAGE: &str = "projectid is required";
pub const UNKNOWN_TENANT_MESSAGE: &str = "projectid invalid";
pub const PROXY_ERROR_MESSAGE: &str = "Proxy error occurred";
pub const BODY_TOO_LARGE_MESSAGE: &str = "request body too large";
pub const INVALID_BODY_MESSAGE: &str = "invalid request body";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Terminal outcome produced without relaying an upstream response.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("tenant header missing")]
    MissingTenant,
    #[error("unknown tenant {0:?}")]
    UnknownTenant(String),
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
    #[error("failed to read request body: {0}")]
    InvalidBody(#[source] BoxError),
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(#[source] BoxError),
    #[error("upstream timed out: {0}")]
    UpstreamTimeout(#[from] DeadlineElapsed),
}

impl ProxyError {
    pub fn upstream(err: impl Into<BoxError>) -> Self {
        Self::UpstreamUnavailable(err.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingTenant | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::UnknownTenant(_) => StatusCode::NOT_FOUND,
            Self::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UpstreamUnavailable(_) | Self::UpstreamTimeout(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingTenant => MISSING_TENANT_MESSAGE,
            Self::UnknownTenant(_) => UNKNOWN_TENANT_MESSAGE,
            Self::BodyTooLarge { .. } => BODY_TOO_LARGE_MESSAGE,
            Self::InvalidBody(_) => INVALID_BODY_MESSAGE,
            Self::UpstreamUnavailable(_) | Self::UpstreamTimeout(_) => PROXY_ERROR_MESSAGE,
        }
    }

    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingTenant => "missing_tenant",
            Self::UnknownTenant(_) => "unknown_tenant",
            Self::BodyTooLarge { .. } => "body_too_large",
            Self::InvalidBody(_) => "invalid_body",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::UpstreamTimeout(_) => "upstream_timeout",
        }
    }
}

impl From<RouteError> for ProxyError {
    fn from(err: RouteError) -> Self {
        match err {
            RouteError::MissingTenant => Self::MissingTenant,
            RouteError::UnknownTenant(tenant) => Self::UnknownTenant(tenant),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorBody {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
