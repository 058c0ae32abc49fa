//! Per-endpoint CORS headers.
//!
//! # Design Decisions
//! - `origin: None` disables CORS for the endpoint: requests pass through untouched
//! - Preflight requests are answered here with 204 and never reach the handler

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use super::MiddlewareRef;

#[derive(Debug, Clone)]
pub struct CorsOptions {
    /// Allowed origin (`"*"` or an exact origin). `None` disables CORS.
    pub origin: Option<String>,
    pub methods: String,
    pub headers: String,
}

impl CorsOptions {
    pub fn disabled() -> Self {
        Self {
            origin: None,
            ..Self::default()
        }
    }

    pub fn allow_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: Some(origin.into()),
            ..Self::default()
        }
    }
}

impl Default for CorsOptions {
    fn default() -> Self {
        Self {
            origin: Some("*".to_string()),
            methods: "GET,HEAD,PUT,PATCH,POST,DELETE".to_string(),
            headers: "X-Requested-With,Content-Type,Authorization".to_string(),
        }
    }
}

pub fn cors(options: CorsOptions) -> MiddlewareRef {
    let options = Arc::new(options);
    MiddlewareRef::new("cors", move |request: Request<Body>, next: Next| {
        let options = options.clone();
        async move { apply_cors(&options, request, next).await }
    })
}

async fn apply_cors(options: &CorsOptions, request: Request<Body>, next: Next) -> Response {
    let Some(origin) = options.origin.as_deref() else {
        return next.run(request).await;
    };
    let allow_origin = match HeaderValue::from_str(origin) {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!(origin = %origin, "Ignoring CORS origin that is not a valid header value");
            return next.run(request).await;
        }
    };

    let is_preflight = request.method() == Method::OPTIONS
        && request
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD);

    let mut response = if is_preflight {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        let headers = response.headers_mut();
        if let Ok(v) = HeaderValue::from_str(&options.methods) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, v);
        }
        if let Ok(v) = HeaderValue::from_str(&options.headers) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, v);
        }
        response
    } else {
        next.run(request).await
    };

    response
        .headers_mut()
        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
    response
}
