//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every upstream URL parses into a usable upstream
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::routing::table::{Upstream, UpstreamError};

/// A single semantic problem in the configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no upstreams configured")]
    NoUpstreams,
    #[error("tenant identifier must not be empty")]
    EmptyTenant,
    #[error("upstream for tenant {tenant:?}: {reason}")]
    InvalidUpstream {
        tenant: String,
        reason: UpstreamError,
    },
    #[error("invalid tenant header name {0:?}")]
    InvalidTenantHeader(String),
    #[error("{field} is not a socket address: {value:?}")]
    InvalidAddress { field: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("admin.api_key must be set when the admin API is enabled")]
    MissingAdminKey,
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);

    if HeaderName::from_bytes(config.routing.tenant_header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidTenantHeader(
            config.routing.tenant_header.clone(),
        ));
    }

    if config.routing.upstreams.is_empty() {
        errors.push(ValidationError::NoUpstreams);
    }
    for (tenant, raw) in &config.routing.upstreams {
        if tenant.is_empty() {
            errors.push(ValidationError::EmptyTenant);
            continue;
        }
        if let Err(reason) = Upstream::parse(raw) {
            errors.push(ValidationError::InvalidUpstream {
                tenant: tenant.clone(),
                reason,
            });
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.connect_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.upstream_secs"));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("limits.max_body_bytes"));
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::MissingAdminKey);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
