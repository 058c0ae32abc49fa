//! Centralized error stage.
//!
//! # Responsibilities
//! - Map handler failures to HTTP responses
//! - Answer requests that matched no route
//!
//! # Design Decisions
//! - Validation failures are the only errors whose detail reaches the client
//! - Everything else collapses to a generic 500 body; detail stays in logs

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Field errors keyed by field name, serialized as the 422 `details` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem with `field`. A later problem on the same field replaces the earlier one.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>, value: Option<Value>) {
        self.fields.insert(
            field.into(),
            FieldError {
                message: message.into(),
                value,
            },
        );
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.fields.get(field)
    }

    /// `Ok(())` when nothing was recorded, otherwise a validation failure.
    pub fn into_result(self) -> Result<(), HandlerError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(HandlerError::Validation(self))
        }
    }
}

/// Failure raised while extracting arguments or running a handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("validation failed for {} field(s)", .0.len())]
    Validation(ValidationErrors),

    #[error("failed to read request body: {0}")]
    Body(String),

    #[error("handler panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    /// Shorthand for a single-field validation failure.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>, value: Option<Value>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message, value);
        HandlerError::Validation(errors)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        HandlerError::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "message": "Validation Failed",
                    "details": errors,
                })),
            )
                .into_response(),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Internal Server Error" })),
            )
                .into_response(),
        }
    }
}

/// Terminal handler for requests that matched no declared route.
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Not Found" }))).into_response()
}
