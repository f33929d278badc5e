//! Tenant → upstream routing table.
//!
//! # Responsibilities
//! - Parse upstream base URLs once, at startup
//! - Store the immutable tenant → upstream mapping
//! - Rewrite inbound request URIs onto an upstream
//!
//! # Design Decisions
//! - Built once, then shared read-only via `Arc` (no locks)
//! - A missing tenant is a lookup miss, never a table error
//! - Only plain `http` upstreams; TLS terminates in front of the backends

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::Uri;
use thiserror::Error;
use url::Url;

use crate::config::schema::RoutingConfig;

/// Reasons an upstream base URL is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("not a valid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("unsupported scheme {0:?}, only http is supported")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
    #[error("URL must not carry credentials")]
    Credentials,
    #[error("URL must not carry a query or fragment")]
    QueryOrFragment,
    #[error("invalid authority {0:?}")]
    Authority(String),
}

/// A parsed upstream base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    authority: Authority,
    /// Path prefix without trailing slash; empty for a bare host.
    base_path: String,
}

impl Upstream {
    /// Parse an upstream base URL such as `http://127.0.0.1:9001` or
    /// `http://novel:3000/api`.
    pub fn parse(raw: &str) -> Result<Self, UpstreamError> {
        let url = Url::parse(raw)?;
        if url.scheme() != "http" {
            return Err(UpstreamError::UnsupportedScheme(url.scheme().to_string()));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(UpstreamError::Credentials);
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(UpstreamError::QueryOrFragment);
        }

        let host = url.host_str().ok_or(UpstreamError::MissingHost)?;
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let authority =
            Authority::from_str(&authority).map_err(|_| UpstreamError::Authority(authority))?;

        Ok(Self {
            authority,
            base_path: url.path().trim_end_matches('/').to_string(),
        })
    }

    /// Host (and port) requests are sent to; also the rewritten `Host` header.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Build the upstream URI for an inbound request URI, keeping its path
    /// and query verbatim behind the upstream's base path.
    pub fn target_uri(&self, inbound: &Uri) -> Result<Uri, axum::http::Error> {
        let original = inbound.path_and_query().map(PathAndQuery::as_str).unwrap_or("/");
        let path_and_query = if self.base_path.is_empty() {
            PathAndQuery::from_str(original)?
        } else {
            PathAndQuery::from_str(&format!("{}{}", self.base_path, original))?
        };

        Ok(Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()?)
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http://{}{}", self.authority, self.base_path)
    }
}

/// Error building a routing table from configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("tenant identifier must not be empty")]
    EmptyTenant,
    #[error("upstream for tenant {tenant:?}: {source}")]
    InvalidUpstream {
        tenant: String,
        #[source]
        source: UpstreamError,
    },
}

/// Immutable mapping from tenant identifier to upstream.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    entries: HashMap<String, Upstream>,
}

impl RoutingTable {
    /// Compile the configured upstream table.
    pub fn from_config(config: &RoutingConfig) -> Result<Self, TableError> {
        let mut entries = HashMap::with_capacity(config.upstreams.len());
        for (tenant, raw) in &config.upstreams {
            if tenant.is_empty() {
                return Err(TableError::EmptyTenant);
            }
            let upstream = Upstream::parse(raw).map_err(|source| TableError::InvalidUpstream {
                tenant: tenant.clone(),
                source,
            })?;
            entries.insert(tenant.clone(), upstream);
        }
        Ok(Self { entries })
    }

    /// Look up the upstream for a tenant. `None` means unknown tenant.
    pub fn lookup(&self, tenant: &str) -> Option<&Upstream> {
        self.entries.get(tenant)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, sorted by tenant identifier.
    pub fn entries(&self) -> Vec<(&str, &Upstream)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(tenant, upstream)| (tenant.as_str(), upstream))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}
