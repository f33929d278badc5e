//! Tenant identifier extraction.
//!
//! # Design Decisions
//! - Identifier comes from exactly one configured header
//! - Empty or non-UTF-8 values count as absent
//! - Values are matched exactly (no trimming, no case folding)

use axum::http::{HeaderMap, HeaderName};

/// Extract the tenant identifier from the request headers.
pub fn extract_tenant<'a>(headers: &'a HeaderMap, header: &HeaderName) -> Option<&'a str> {
    headers
        .get(header)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}
