//! Fire weather datamart API.
//!
//! Controllers declare their endpoints through a small routing engine
//! (`routing`): declarations fill a registry, the registry is materialized
//! once into axum routes, and a generated dispatcher (`http::dispatch`) turns
//! each request into positional handler arguments.

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;

// Application
pub mod api;
pub mod health;
pub mod store;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{Declarations, Registry};
