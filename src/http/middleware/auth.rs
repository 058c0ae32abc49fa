use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::MiddlewareRef;

/// Reject the request with 401 unless it carries `Authorization: Bearer <token>`.
pub fn require_bearer(token: impl Into<String>) -> MiddlewareRef {
    let expected: Arc<str> = Arc::from(format!("Bearer {}", token.into()));
    MiddlewareRef::new("require_bearer", move |request: Request<Body>, next: Next| {
        let expected = expected.clone();
        async move { bearer_auth(&expected, request, next).await }
    })
}

async fn bearer_auth(expected: &str, request: Request<Body>, next: Next) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    if let Some(auth_val) = auth_header {
        if auth_val == expected {
            return next.run(request).await;
        }
    }

    tracing::debug!(path = %request.uri().path(), "Rejected request without valid bearer token");
    StatusCode::UNAUTHORIZED.into_response()
}
