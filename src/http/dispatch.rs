//! Per-endpoint request dispatcher.
//!
//! # Responsibilities
//! - Extract each bound parameter from the request into its positional slot
//! - Invoke the endpoint handler and await it
//! - Shape the reply into exactly one HTTP response
//! - Forward every failure to the error stage
//!
//! # Design Decisions
//! - Missing or malformed path/query/header values become `Null`, never errors
//! - The body is read only when a parameter is bound to it
//! - Panics while extracting or in the handler are caught and answered like
//!   any other internal failure
//! - No state is shared between requests beyond the immutable endpoint data

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{FromRequestParts, Query, RawPathParams},
    http::{request::Parts, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures_util::FutureExt;
use serde_json::Value;

use crate::http::error::HandlerError;
use crate::http::handler::{ApiResponse, Argument, Arguments, HandlerRef, Reply, RequestContext};
use crate::http::middleware::{FormData, RequestProperties, Uploads};
use crate::observability::metrics;
use crate::routing::model::{ParameterEntry, SourceKind};

struct Endpoint {
    /// `Controller.endpoint`, for logs.
    label: String,
    route: String,
    handler: HandlerRef,
    parameters: Vec<ParameterEntry>,
    success: StatusCode,
}

/// Generated request handler bound to one endpoint.
#[derive(Clone)]
pub struct Dispatcher {
    endpoint: Arc<Endpoint>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("endpoint", &self.endpoint.label)
            .field("route", &self.endpoint.route)
            .field("success", &self.endpoint.success)
            .finish()
    }
}

impl Dispatcher {
    pub fn new(
        label: impl Into<String>,
        route: impl Into<String>,
        handler: HandlerRef,
        parameters: Vec<ParameterEntry>,
        success: StatusCode,
    ) -> Self {
        Self {
            endpoint: Arc::new(Endpoint {
                label: label.into(),
                route: route.into(),
                handler,
                parameters,
                success,
            }),
        }
    }

    /// Handle one request. Always produces a response.
    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().clone();

        let outcome = AssertUnwindSafe(self.run(request))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(HandlerError::Panicked(panic_message(panic))));
        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                match &err {
                    HandlerError::Validation(details) => tracing::warn!(
                        endpoint = %self.endpoint.label,
                        fields = details.len(),
                        "Validation failed"
                    ),
                    other => tracing::error!(
                        endpoint = %self.endpoint.label,
                        error = %other,
                        "Route handler reported error"
                    ),
                }
                err.into_response()
            }
        };

        tracing::debug!(
            endpoint = %self.endpoint.label,
            method = %method,
            status = response.status().as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Dispatched request"
        );
        metrics::record_request(method.as_str(), response.status().as_u16(), &self.endpoint.route, start);
        response
    }

    async fn run(&self, request: Request<Body>) -> Result<Response, HandlerError> {
        let args = self.extract(request).await?;
        let reply = self.endpoint.handler.call(args).await?;
        Ok(shape(reply, self.endpoint.success))
    }

    async fn extract(&self, request: Request<Body>) -> Result<Arguments, HandlerError> {
        let params = &self.endpoint.parameters;
        let (mut parts, body) = request.into_parts();

        let path_params = path_params(&mut parts).await;
        let query: HashMap<String, String> = Query::try_from_uri(&parts.uri)
            .map(|Query(q)| q)
            .unwrap_or_default();
        let form = parts.extensions.get::<FormData>().cloned();

        let body_value = if params.iter().any(|p| p.source == SourceKind::Body) {
            match &form {
                Some(form) => form.fields_json(),
                None => read_json_body(body).await?,
            }
        } else {
            Value::Null
        };

        let context = params
            .iter()
            .any(|p| p.source == SourceKind::Request)
            .then(|| {
                Arc::new(RequestContext {
                    method: parts.method.clone(),
                    uri: parts.uri.clone(),
                    headers: parts.headers.clone(),
                    path_params: path_params.clone(),
                    query: query.clone(),
                })
            });

        let len = params
            .iter()
            .map(|p| p.index.saturating_add(1))
            .max()
            .unwrap_or(0)
            .max(params.len());
        let mut slots = vec![Argument::Unset; len];

        for param in params {
            let name = param.source_name.as_str();
            slots[param.index] = match param.source {
                SourceKind::Path => text_or_null(path_params.get(name).map(String::as_str)),
                SourceKind::Query => text_or_null(query.get(name).map(String::as_str)),
                SourceKind::Header => {
                    text_or_null(parts.headers.get(name).and_then(|v| v.to_str().ok()))
                }
                SourceKind::Body => json_or_null(body_value.clone()),
                SourceKind::Request => context
                    .clone()
                    .map(Argument::Request)
                    .unwrap_or(Argument::Null),
                SourceKind::FormField => text_or_null(form.as_ref().and_then(|f| f.field(name))),
                SourceKind::Files => match form.as_ref().map(|f| &f.uploads) {
                    Some(Uploads::Single(file)) => Argument::File(file.clone()),
                    Some(Uploads::Many(files)) => Argument::Files(files.clone()),
                    _ => Argument::Null,
                },
                SourceKind::Property => parts
                    .extensions
                    .get::<RequestProperties>()
                    .and_then(|props| props.get(name))
                    .cloned()
                    .map(json_or_null)
                    .unwrap_or(Argument::Null),
            };
        }

        Ok(Arguments::new(slots))
    }
}

async fn path_params(parts: &mut Parts) -> HashMap<String, String> {
    match RawPathParams::from_request_parts(parts, &()).await {
        Ok(raw) => raw
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        Err(_) => HashMap::new(),
    }
}

async fn read_json_body(body: Body) -> Result<Value, HandlerError> {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| HandlerError::Body(e.to_string()))?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::debug!(error = %e, "Request body is not JSON; binding null");
            Ok(Value::Null)
        }
    }
}

fn text_or_null(value: Option<&str>) -> Argument {
    match value {
        Some(v) if !v.is_empty() => Argument::Text(v.to_string()),
        _ => Argument::Null,
    }
}

fn json_or_null(value: Value) -> Argument {
    match value {
        Value::Null => Argument::Null,
        v => Argument::Json(v),
    }
}

fn shape(reply: Reply, success: StatusCode) -> Response {
    match reply {
        Reply::Explicit(ApiResponse {
            status,
            body: Some(body),
        }) => (status, Json(body)).into_response(),
        Reply::Explicit(ApiResponse { status, body: None }) => status.into_response(),
        Reply::Value(value) => (success, Json(value)).into_response(),
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
