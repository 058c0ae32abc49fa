//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outgoing response:
//!     → headers.rs (hardening headers on every response)
//! ```
//!
//! Request size limits are enforced by the server's body limit layer;
//! per-endpoint authentication lives in `http::middleware::auth`.

pub mod headers;

pub use headers::with_security_headers;
