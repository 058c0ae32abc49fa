//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, request ID, limits, timeout, tracing)
//!     → [materialized route] → middleware/ (per-endpoint chain)
//!     → dispatch.rs (extract arguments, call handler, shape reply)
//!     → error.rs (422 / 500 / 404 bodies)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod request;
pub mod server;

pub use dispatch::Dispatcher;
pub use error::{FieldError, HandlerError, ValidationErrors};
pub use handler::{ApiResponse, Argument, Arguments, Handler, HandlerRef, Reply, RequestContext};
pub use middleware::{Middleware, MiddlewareRef};
pub use request::{MakeRequestUuid, RequestIdExt, X_REQUEST_ID};
pub use server::HttpServer;
