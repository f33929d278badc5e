//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (headers)
//!     → tenant.rs (read tenant identifier header)
//!     → router.rs (resolve against table)
//!     → Return: Route { tenant, upstream } or RouteError
//!
//! Table Compilation (at startup):
//!     [routing.upstreams] + GATEWAY_UPSTREAMS
//!     → table.rs (parse upstream URLs)
//!     → Freeze as immutable RoutingTable
//! ```
//!
//! # Design Decisions
//! - Table compiled at startup, immutable at runtime
//! - Deterministic: same header always resolves to the same upstream
//! - Missing and unknown tenants are distinct rejections

pub mod router;
pub mod table;
pub mod tenant;

pub use router::{BuildError, Route, RouteError, TenantRouter};
pub use table::{RoutingTable, TableError, Upstream, UpstreamError};
