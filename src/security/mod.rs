//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request:
//!     → headers.rs (strip hop-by-hop, optional X-Forwarded-*)
//!     → Forward to upstream
//!
//! Upstream response:
//!     → headers.rs (strip hop-by-hop)
//!     → Relay to client
//! ```
//!
//! # Design Decisions
//! - No trust in client-supplied hop-by-hop headers
//! - Request body size is capped before any upstream contact

pub mod headers;
