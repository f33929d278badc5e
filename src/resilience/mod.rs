//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (enforce connect/round-trip deadline)
//!     → On expiry: request abandoned, 500 returned
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - No retries here: retry policy belongs to callers or infrastructure

pub mod timeouts;
