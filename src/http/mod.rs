//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all handler)
//!     → request.rs (request ID assigned / kept)
//!     → routing (tenant header → upstream, or 400/404)
//!     → forward.rs (rewrite, send under deadline, buffer response)
//!     → response.rs (local rejections as JSON)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::Forwarder;
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::ProxyError;
pub use server::{AppState, HttpServer};
