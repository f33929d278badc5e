//! Upstream forwarding.
//!
//! # Responsibilities
//! - Rewrite an inbound request onto the resolved upstream
//! - Send it through the pooled HTTP client under a deadline
//! - Relay the upstream response, or fail with a local rejection
//!
//! # Design Decisions
//! - Request and response bodies are buffered, so `Content-Length` is exact
//!   and a failure mid-response becomes a 500 rather than a truncated 200
//! - The whole round trip, body included, shares one deadline; expiry drops
//!   the in-flight call and its connection
//! - No retries

use std::net::IpAddr;

use axum::body::{Body, Bytes};
use axum::http::header::{CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use axum::http::{request, HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::GatewayConfig;
use crate::http::response::ProxyError;
use crate::resilience::timeouts::UpstreamTimeouts;
use crate::routing::Upstream;
use crate::security::headers::{append_forwarded, strip_hop_by_hop};

/// Pooled HTTP/1.1 client used for all upstreams.
pub type HttpClient = Client<HttpConnector, Body>;

/// Forwards requests to upstreams.
#[derive(Clone)]
pub struct Forwarder {
    client: HttpClient,
    timeouts: UpstreamTimeouts,
    max_body_bytes: usize,
    add_forwarded_headers: bool,
}

impl Forwarder {
    pub fn new(timeouts: UpstreamTimeouts, max_body_bytes: usize, add_forwarded_headers: bool) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeouts.connect));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            timeouts,
            max_body_bytes,
            add_forwarded_headers,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            UpstreamTimeouts::from_config(&config.timeouts),
            config.limits.max_body_bytes,
            config.forwarding.add_forwarded_headers,
        )
    }

    /// Forward `request` to `upstream` and return its response.
    ///
    /// `client` is the peer address, used for `X-Forwarded-For` when enabled.
    pub async fn forward(
        &self,
        upstream: &Upstream,
        request: Request<Body>,
        client: Option<IpAddr>,
    ) -> Result<Response<Body>, ProxyError> {
        let (parts, body) = request.into_parts();
        let body = read_body(body, self.max_body_bytes).await?;

        let head = parts.method == Method::HEAD;
        let proxied = self.build_request(upstream, parts, body, client)?;

        self.timeouts.enforce(self.round_trip(proxied, head)).await?
    }

    fn build_request(
        &self,
        upstream: &Upstream,
        parts: request::Parts,
        body: Bytes,
        client: Option<IpAddr>,
    ) -> Result<Request<Body>, ProxyError> {
        let uri = upstream.target_uri(&parts.uri).map_err(ProxyError::upstream)?;
        let mut headers = parts.headers;

        let declared_body =
            headers.contains_key(CONTENT_LENGTH) || headers.contains_key(TRANSFER_ENCODING);

        if self.add_forwarded_headers {
            if let Some(ip) = client {
                append_forwarded(&mut headers, ip);
            }
        }

        strip_hop_by_hop(&mut headers);
        headers.remove(CONTENT_LENGTH);
        let host = HeaderValue::from_str(upstream.authority().as_str()).map_err(ProxyError::upstream)?;
        headers.insert(HOST, host);
        if declared_body || !body.is_empty() {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        }

        let mut request = Request::new(Body::from(body));
        *request.method_mut() = parts.method;
        *request.uri_mut() = uri;
        *request.headers_mut() = headers;
        Ok(request)
    }

    async fn round_trip(&self, request: Request<Body>, head: bool) -> Result<Response<Body>, ProxyError> {
        let response = self
            .client
            .request(request)
            .await
            .map_err(ProxyError::upstream)?;

        let (mut parts, body) = response.into_parts();
        let bytes = body.collect().await.map_err(ProxyError::upstream)?.to_bytes();

        strip_hop_by_hop(&mut parts.headers);
        if !head && has_body(parts.status) {
            parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));
        }

        Ok(Response::from_parts(parts, Body::from(bytes)))
    }
}

/// Statuses that may carry a body (and therefore a content length).
fn has_body(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes, ProxyError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.is::<LengthLimitError>() => Err(ProxyError::BodyTooLarge { limit }),
        Err(err) => Err(ProxyError::InvalidBody(err)),
    }
}
