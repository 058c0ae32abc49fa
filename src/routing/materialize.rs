//! One-time route materialization.
//!
//! # Responsibilities
//! - Walk the registry in declaration order (controllers, then endpoints)
//! - Compute each endpoint's full path
//! - Install middleware chain + generated dispatcher on a [`RouteSink`]
//!
//! # Design Decisions
//! - Runs once per registry; a second call is an explicit error
//! - Endpoints without a method or handler are skipped, not fatal
//! - A route the sink rejects (bad path, conflict, duplicate) is skipped and
//!   reported; the remaining endpoints are still installed

use crate::http::dispatch::Dispatcher;
use crate::http::middleware::MiddlewareRef;
use crate::observability::metrics;
use crate::routing::model::HttpMethod;
use crate::routing::path;
use crate::routing::registry::{RegistrationError, Registry, RegistryState};

/// Ordered request-processing chain for one route: middleware, then the dispatcher.
#[derive(Debug, Clone)]
pub struct HandlerChain {
    pub middleware: Vec<MiddlewareRef>,
    pub dispatcher: Dispatcher,
}

/// A router that accepts method/path/chain registrations.
pub trait RouteSink {
    /// Install one route. An error means the route was not installed.
    fn register(&mut self, method: HttpMethod, path: &str, chain: HandlerChain) -> Result<(), RegistrationError>;
}

/// A route handed to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledRoute {
    pub method: HttpMethod,
    pub path: String,
    pub controller: String,
    pub endpoint: String,
}

/// Outcome of a materialization pass.
#[derive(Debug, Default)]
pub struct Materialized {
    /// Routes the sink accepted, in installation order.
    pub routes: Vec<InstalledRoute>,
    /// Routes the sink refused.
    pub rejected: Vec<RegistrationError>,
}

impl Registry {
    /// Install every declared endpoint on `sink`. Callable once.
    pub fn materialize(&mut self, sink: &mut dyn RouteSink) -> Result<Materialized, RegistrationError> {
        if self.state() == RegistryState::Materialized {
            tracing::error!("Routes already initialized; ignoring second materialization");
            return Err(RegistrationError::AlreadyMaterialized);
        }

        tracing::info!("Initializing routes");
        let mut outcome = Materialized::default();

        for controller in self.controllers() {
            tracing::info!(controller = %controller.name, "Building routes for controller");

            for endpoint in controller.endpoints.values() {
                let label = format!("{}.{}", controller.name, endpoint.name);
                let (Some(method), Some(handler)) = (endpoint.method, endpoint.handler.clone()) else {
                    tracing::warn!(
                        endpoint = %label,
                        has_method = endpoint.method.is_some(),
                        has_handler = endpoint.handler.is_some(),
                        "Endpoint is incomplete; no route created"
                    );
                    continue;
                };

                let full_path = path::join(&controller.route_prefix, &endpoint.route_suffix);
                tracing::info!(method = %method, endpoint = %label, path = %full_path, "Creating route");

                let dispatcher = Dispatcher::new(
                    label.clone(),
                    full_path.clone(),
                    handler,
                    endpoint.parameters.clone(),
                    endpoint.success_status,
                );
                let chain = HandlerChain {
                    middleware: endpoint.middleware.clone(),
                    dispatcher,
                };
                if let Err(err) = sink.register(method, &full_path, chain) {
                    tracing::warn!(endpoint = %label, error = %err, "Route rejected; endpoint not served");
                    metrics::record_registration_error();
                    outcome.rejected.push(err);
                    continue;
                }

                outcome.routes.push(InstalledRoute {
                    method,
                    path: full_path,
                    controller: controller.name.clone(),
                    endpoint: endpoint.name.clone(),
                });
            }
        }

        self.mark_materialized();
        Ok(outcome)
    }
}
