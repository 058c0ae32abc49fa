//! Declarative routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     ControllerDefinition[]
//!     → declare.rs (one registry mutation per builder call, errors collected)
//!     → registry.rs (controllers → endpoints → parameters/middleware)
//!     → materialize.rs (once: middleware chain + dispatcher per endpoint)
//!     → axum_sink.rs (live axum routes)
//!
//! Per request:
//!     axum route → middleware chain → http::dispatch::Dispatcher
//! ```
//!
//! # Design Decisions
//! - Declaration order is route order
//! - The registry is frozen once routes are materialized
//! - Registration problems never abort on their own; bootstrap decides

pub mod axum_sink;
pub mod declare;
pub mod materialize;
pub mod model;
pub mod path;
pub mod registry;

pub use axum_sink::AxumRouteSink;
pub use declare::{ControllerDecl, ControllerDefinition, Declarations, EndpointDecl};
pub use materialize::{HandlerChain, InstalledRoute, Materialized, RouteSink};
pub use model::{ControllerEntry, EndpointEntry, HttpMethod, ParameterEntry, SourceKind};
pub use registry::{RegistrationError, Registry, RegistryState};
