//! Routing metadata model.
//!
//! Controllers own endpoints; endpoints own their parameter bindings and
//! middleware. Entries are created on first reference and filled in by
//! later declarations, so every field has a usable default.

use std::fmt;

use axum::http::StatusCode;
use indexmap::IndexMap;

use crate::http::handler::HandlerRef;
use crate::http::middleware::MiddlewareRef;

/// HTTP methods an endpoint can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a handler argument is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Path,
    Query,
    /// The whole parsed body; the source name is ignored.
    Body,
    Header,
    /// A snapshot of the request itself.
    Request,
    FormField,
    /// The single uploaded file, else all uploaded files.
    Files,
    /// A value placed in `RequestProperties` by middleware, keyed by source name.
    Property,
}

/// One positional argument binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterEntry {
    pub index: usize,
    pub source: SourceKind,
    /// Key read from the source.
    pub source_name: String,
    /// The handler's own name for the argument.
    pub argument_name: String,
}

impl ParameterEntry {
    /// Binding whose source key defaults to the argument name.
    pub fn new(index: usize, source: SourceKind, argument_name: impl Into<String>) -> Self {
        let argument_name = argument_name.into();
        Self {
            index,
            source,
            source_name: argument_name.clone(),
            argument_name,
        }
    }

    /// Replace the source key, keeping the position.
    pub fn with_source_name(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = source_name.into();
        self
    }
}

/// One method + path bound to a handler.
#[derive(Debug, Clone)]
pub struct EndpointEntry {
    pub name: String,
    pub method: Option<HttpMethod>,
    pub route_suffix: String,
    pub handler: Option<HandlerRef>,
    pub success_status: StatusCode,
    pub success_description: String,
    pub parameters: Vec<ParameterEntry>,
    pub middleware: Vec<MiddlewareRef>,
}

impl EndpointEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: None,
            route_suffix: String::new(),
            handler: None,
            success_status: StatusCode::OK,
            success_description: "OK".to_string(),
            parameters: Vec::new(),
            middleware: Vec::new(),
        }
    }

    pub fn parameter(&self, index: usize) -> Option<&ParameterEntry> {
        self.parameters.iter().find(|p| p.index == index)
    }
}

/// A group of endpoints sharing a route prefix.
#[derive(Debug, Clone)]
pub struct ControllerEntry {
    pub name: String,
    pub route_prefix: String,
    pub endpoints: IndexMap<String, EndpointEntry>,
}

impl ControllerEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            route_prefix: String::new(),
            endpoints: IndexMap::new(),
        }
    }

    pub fn endpoint(&self, name: &str) -> Option<&EndpointEntry> {
        self.endpoints.get(name)
    }
}
