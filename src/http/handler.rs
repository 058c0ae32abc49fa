//! Handler calling convention.
//!
//! A handler receives its inputs as positional [`Arguments`], filled by the
//! dispatcher from the endpoint's parameter bindings, and answers with a
//! [`Reply`]: either a plain value (serialized with the endpoint's declared
//! success status) or an explicit [`ApiResponse`] carrying its own status.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use axum::http::{HeaderMap, Method, StatusCode, Uri};
use futures_util::future::BoxFuture;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::http::error::HandlerError;
use crate::http::middleware::multipart::UploadedFile;

/// Snapshot of the inbound request handed to `request`-bound parameters.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub path_params: HashMap<String, String>,
    pub query: HashMap<String, String>,
}

impl RequestContext {
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// One positional argument slot.
#[derive(Debug, Clone, Default)]
pub enum Argument {
    /// No parameter was declared at this index.
    #[default]
    Unset,
    /// Declared, but the request carried no usable value.
    Null,
    Text(String),
    Json(Value),
    Request(Arc<RequestContext>),
    File(UploadedFile),
    Files(Vec<UploadedFile>),
}

impl Argument {
    /// True for both `Unset` and `Null`.
    pub fn is_absent(&self) -> bool {
        matches!(self, Argument::Unset | Argument::Null)
    }
}

static UNSET: Argument = Argument::Unset;

/// Positional arguments for one handler invocation.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    slots: Vec<Argument>,
}

impl Arguments {
    pub fn new(slots: Vec<Argument>) -> Self {
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The argument at `index`, or `Unset` past the end.
    pub fn get(&self, index: usize) -> &Argument {
        self.slots.get(index).unwrap_or(&UNSET)
    }

    /// Move the argument out, leaving `Unset` behind.
    pub fn take(&mut self, index: usize) -> Argument {
        self.slots
            .get_mut(index)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Text view of a scalar argument. JSON strings count as text.
    pub fn text(&self, index: usize) -> Option<&str> {
        match self.get(index) {
            Argument::Text(s) => Some(s.as_str()),
            Argument::Json(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Parse a scalar argument; empty or unparseable values yield `None`.
    pub fn parse<T: FromStr>(&self, index: usize) -> Option<T> {
        self.text(index)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse().ok())
    }

    pub fn json(&self, index: usize) -> Option<&Value> {
        match self.get(index) {
            Argument::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Deserialize a body-like argument into `T`. Absent values give `Ok(None)`.
    pub fn deserialize<T: DeserializeOwned>(&self, index: usize) -> Result<Option<T>, HandlerError> {
        match self.get(index) {
            Argument::Json(v) => serde_json::from_value(v.clone()).map(Some).map_err(|e| {
                HandlerError::invalid_field(format!("argument[{index}]"), e.to_string(), None)
            }),
            _ => Ok(None),
        }
    }

    pub fn request(&self, index: usize) -> Option<&RequestContext> {
        match self.get(index) {
            Argument::Request(ctx) => Some(ctx.as_ref()),
            _ => None,
        }
    }

    pub fn file(&self, index: usize) -> Option<&UploadedFile> {
        match self.get(index) {
            Argument::File(f) => Some(f),
            _ => None,
        }
    }

    pub fn files(&self, index: usize) -> Option<&[UploadedFile]> {
        match self.get(index) {
            Argument::Files(f) => Some(f.as_slice()),
            Argument::File(f) => Some(std::slice::from_ref(f)),
            _ => None,
        }
    }
}

/// Response override: emitted verbatim regardless of the endpoint's declared status.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    pub fn empty(status: StatusCode) -> Self {
        Self { status, body: None }
    }
}

/// What a handler hands back to the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Value(Value),
    Explicit(ApiResponse),
}

impl Reply {
    /// Serialize `value` as the plain success body.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, HandlerError> {
        serde_json::to_value(value)
            .map(Reply::Value)
            .map_err(|e| HandlerError::internal(format!("failed to serialize reply: {e}")))
    }

    pub fn explicit(status: StatusCode, body: Value) -> Self {
        Reply::Explicit(ApiResponse::new(status, body))
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::Value(value)
    }
}

impl From<ApiResponse> for Reply {
    fn from(response: ApiResponse) -> Self {
        Reply::Explicit(response)
    }
}

/// An asynchronous endpoint function.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, args: Arguments) -> BoxFuture<'static, Result<Reply, HandlerError>>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Reply, HandlerError>> + Send + 'static,
{
    fn call(&self, args: Arguments) -> BoxFuture<'static, Result<Reply, HandlerError>> {
        Box::pin(self(args))
    }
}

/// Shared, named reference to a handler.
#[derive(Clone)]
pub struct HandlerRef {
    name: Arc<str>,
    inner: Arc<dyn Handler>,
}

impl HandlerRef {
    pub fn new(name: impl Into<String>, handler: impl Handler) -> Self {
        Self {
            name: Arc::from(name.into()),
            inner: Arc::new(handler),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: Arguments) -> BoxFuture<'static, Result<Reply, HandlerError>> {
        self.inner.call(args)
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HandlerRef").field(&self.name).finish()
    }
}
