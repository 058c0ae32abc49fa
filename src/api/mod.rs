//! Data endpoints.
//!
//! # Data Flow
//! ```text
//! StationsController / ReadingsController (ControllerDefinition)
//!     → declared through routing::declare at startup
//!     → handlers read positional query arguments (query.rs)
//!     → StationStore
//! ```
//!
//! # Design Decisions
//! - Every data endpoint disables caching and CORS
//! - Bearer auth is attached only when an API key is configured
//! - Store failures answer an explicit 500; detail stays in logs

pub mod query;
pub mod readings;
pub mod stations;

use axum::http::StatusCode;
use serde_json::json;

use crate::http::handler::Reply;
use crate::http::middleware::{cors, no_cache, require_bearer, CorsOptions, MiddlewareRef};
use crate::routing::declare::EndpointDecl;
use crate::store::StoreError;

pub use readings::ReadingsController;
pub use stations::StationsController;

/// Middleware shared by the data endpoints, in execution order.
#[derive(Debug, Clone, Default)]
pub struct DataAccess {
    pub api_key: Option<String>,
}

impl DataAccess {
    pub fn middleware(&self) -> Vec<MiddlewareRef> {
        let mut chain = vec![no_cache(), cors(CorsOptions::disabled())];
        if let Some(key) = &self.api_key {
            chain.push(require_bearer(key.clone()));
        }
        chain
    }

    pub(crate) fn apply<'a>(&self, mut endpoint: EndpointDecl<'a>) -> EndpointDecl<'a> {
        for middleware in self.middleware() {
            endpoint = endpoint.middleware(middleware);
        }
        endpoint
    }
}

pub(crate) fn query_failed(endpoint: &str, err: StoreError) -> Reply {
    tracing::error!(endpoint = %endpoint, error = %err, "Store query failed");
    Reply::explicit(StatusCode::INTERNAL_SERVER_ERROR, json!("Failed to execute query."))
}
