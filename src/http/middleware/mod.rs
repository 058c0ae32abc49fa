//! Per-endpoint middleware.
//!
//! # Data Flow
//! ```text
//! Request
//!     → middleware[0] → middleware[1] → ... (declaration order)
//!     → dispatcher
//! ```
//!
//! Any middleware may answer the request itself instead of calling `next`.

pub mod auth;
pub mod cors;
pub mod multipart;
pub mod no_cache;
pub mod properties;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use futures_util::future::BoxFuture;

pub use auth::require_bearer;
pub use cors::{cors, CorsOptions};
pub use multipart::{multipart_text, upload_array, upload_single, FormData, UploadedFile, Uploads};
pub use no_cache::no_cache;
pub use properties::{insert_property, RequestProperties};

/// A request-processing step that runs before the endpoint dispatcher.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, request: Request<Body>, next: Next) -> BoxFuture<'static, Response>;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Request<Body>, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn handle(&self, request: Request<Body>, next: Next) -> BoxFuture<'static, Response> {
        Box::pin(self(request, next))
    }
}

/// Shared, named reference to a middleware.
#[derive(Clone)]
pub struct MiddlewareRef {
    name: Arc<str>,
    inner: Arc<dyn Middleware>,
}

impl MiddlewareRef {
    pub fn new(name: impl Into<String>, middleware: impl Middleware) -> Self {
        Self {
            name: Arc::from(name.into()),
            inner: Arc::new(middleware),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self, request: Request<Body>, next: Next) -> BoxFuture<'static, Response> {
        self.inner.handle(request, next)
    }
}

impl fmt::Debug for MiddlewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MiddlewareRef").field(&self.name).finish()
    }
}
