//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap the materialized routes with the server-wide middleware stack
//! - Answer unmatched requests with the JSON 404, including a declared path
//!   requested with an undeclared method
//! - Serve on a listener until shutdown is signalled
//!
//! # Layer order (outermost first)
//! ```text
//! SetRequestId → Trace → PropagateRequestId → Timeout → BodyLimit
//!     → security headers → routes | 404 fallback
//! ```

use std::time::Duration;

use axum::{body::Body, http::Request, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::error::not_found;
use crate::http::request::{MakeRequestUuid, RequestIdExt, X_REQUEST_ID};
use crate::security::with_security_headers;

/// HTTP server for the API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Wrap materialized `routes` with the server-wide layers.
    pub fn new(routes: Router, config: &AppConfig) -> Self {
        Self {
            router: Self::build_router(routes, config),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(routes: Router, config: &AppConfig) -> Router {
        let mut router = routes.fallback(not_found).method_not_allowed_fallback(not_found);
        if config.security.enable_headers {
            router = with_security_headers(router);
        }

        router
            .layer(RequestBodyLimitLayer::new(config.server.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request.request_id().unwrap_or("unknown"),
                )
            }))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
