//! Tenant lookup and dispatch decision.
//!
//! # Responsibilities
//! - Read the tenant identifier from an inbound request
//! - Resolve it against the routing table
//! - Return the matched upstream or an explicit rejection
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Resolution never touches the network: rejections are decided up front

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName};
use thiserror::Error;

use crate::config::schema::RoutingConfig;
use crate::routing::table::{RoutingTable, TableError, Upstream};
use crate::routing::tenant::extract_tenant;

/// Why a request could not be routed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("tenant header missing")]
    MissingTenant,
    #[error("unknown tenant {0:?}")]
    UnknownTenant(String),
}

/// Error building a router from configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid tenant header name {0:?}")]
    InvalidHeader(String),
    #[error(transparent)]
    Table(#[from] TableError),
}

/// A resolved destination for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route<'a> {
    pub tenant: String,
    pub upstream: &'a Upstream,
}

/// Resolves requests to upstreams by tenant header.
#[derive(Debug, Clone)]
pub struct TenantRouter {
    header: HeaderName,
    table: Arc<RoutingTable>,
}

impl TenantRouter {
    pub fn new(header: HeaderName, table: Arc<RoutingTable>) -> Self {
        Self { header, table }
    }

    /// Compile header name and routing table from configuration.
    pub fn from_config(config: &RoutingConfig) -> Result<Self, BuildError> {
        let header = HeaderName::from_bytes(config.tenant_header.as_bytes())
            .map_err(|_| BuildError::InvalidHeader(config.tenant_header.clone()))?;
        let table = RoutingTable::from_config(config)?;
        Ok(Self::new(header, Arc::new(table)))
    }

    /// Resolve the request headers to a route.
    pub fn resolve(&self, headers: &HeaderMap) -> Result<Route<'_>, RouteError> {
        let tenant = extract_tenant(headers, &self.header).ok_or(RouteError::MissingTenant)?;
        let upstream = self
            .table
            .lookup(tenant)
            .ok_or_else(|| RouteError::UnknownTenant(tenant.to_string()))?;

        Ok(Route {
            tenant: tenant.to_string(),
            upstream,
        })
    }

    pub fn tenant_header(&self) -> &HeaderName {
        &self.header
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }
}
