//! # HTTP Middleware
//!
//! - `security_headers` — protective response headers added at every access level.
//! - `tracing_layer` — per-request spans that never record credentials.

pub mod security_headers;
pub mod tracing_layer;
