//! Multipart form parsing.
//!
//! # Responsibilities
//! - Read a `multipart/form-data` body once, before the dispatcher runs
//! - Store text fields and uploaded files as [`FormData`] in request extensions
//!
//! # Design Decisions
//! - Three modes: one file, an array of files under one field, or text only
//! - A file outside the accepted mode is a client error (400), not ignored
//! - The body is replaced with an empty one after parsing

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Multipart},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

use super::MiddlewareRef;

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field_name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Files accepted by the multipart middleware.
#[derive(Debug, Clone, Default)]
pub enum Uploads {
    #[default]
    None,
    Single(UploadedFile),
    Many(Vec<UploadedFile>),
}

/// Parsed multipart body.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    pub fields: HashMap<String, String>,
    pub uploads: Uploads,
}

impl FormData {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Text fields as a JSON object (what a `body` parameter sees).
    pub fn fields_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }
}

#[derive(Debug, Clone)]
enum UploadMode {
    Single { field: String },
    Array { field: String, max: usize },
    TextOnly,
}

/// Accept exactly one file under `field`.
pub fn upload_single(field: impl Into<String>) -> MiddlewareRef {
    multipart_middleware("upload_single", UploadMode::Single { field: field.into() })
}

/// Accept up to `max` files under `field`.
pub fn upload_array(field: impl Into<String>, max: usize) -> MiddlewareRef {
    multipart_middleware(
        "upload_array",
        UploadMode::Array {
            field: field.into(),
            max,
        },
    )
}

/// Accept text fields only.
pub fn multipart_text() -> MiddlewareRef {
    multipart_middleware("multipart_text", UploadMode::TextOnly)
}

fn multipart_middleware(name: &str, mode: UploadMode) -> MiddlewareRef {
    let mode = Arc::new(mode);
    MiddlewareRef::new(name, move |request: Request<Body>, next: Next| {
        let mode = mode.clone();
        async move {
            match parse_form(&mode, request).await {
                Ok(request) => next.run(request).await,
                Err(response) => response,
            }
        }
    })
}

fn reject(message: impl Into<String>) -> Response {
    let message = message.into();
    tracing::debug!(reason = %message, "Rejected multipart request");
    (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
}

async fn parse_form(mode: &UploadMode, request: Request<Body>) -> Result<Request<Body>, Response> {
    let (mut parts, body) = request.into_parts();

    let mut rebuilt = Request::new(body);
    *rebuilt.headers_mut() = parts.headers.clone();
    let mut multipart = Multipart::from_request(rebuilt, &())
        .await
        .map_err(IntoResponse::into_response)?;

    let mut form = FormData::default();
    let mut files = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(reject(format!("Malformed multipart body: {e}"))),
        };

        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        if file_name.is_none() {
            let text = field
                .text()
                .await
                .map_err(|e| reject(format!("Unreadable field {field_name}: {e}")))?;
            form.fields.insert(field_name, text);
            continue;
        }

        let accepted = match mode {
            UploadMode::Single { field: expected } | UploadMode::Array { field: expected, .. } => {
                *expected == field_name
            }
            UploadMode::TextOnly => false,
        };
        if !accepted {
            return Err(reject(format!("Unexpected file field: {field_name}")));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| reject(format!("Unreadable file {field_name}: {e}")))?;
        files.push(UploadedFile {
            field_name,
            file_name,
            content_type,
            data,
        });
    }

    form.uploads = match mode {
        UploadMode::Single { field } => match files.len() {
            0 => Uploads::None,
            1 => Uploads::Single(files.remove(0)),
            _ => return Err(reject(format!("Only one file is accepted for field: {field}"))),
        },
        UploadMode::Array { field, max } => {
            if files.len() > *max {
                return Err(reject(format!("Too many files for field {field} (max {max})")));
            }
            Uploads::Many(files)
        }
        UploadMode::TextOnly => Uploads::None,
    };

    parts.extensions.insert(form);
    Ok(Request::from_parts(parts, Body::empty()))
}
