//! Controller declarations.
//!
//! Builder calls evaluated once at startup. Each call applies exactly one
//! registry mutation immediately; failures are logged and collected so that
//! one bad declaration only affects its own endpoint.
//!
//! ```ignore
//! let mut decls = Declarations::new(Registry::new());
//! let mut stations = decls.controller("StationsController");
//! stations.route("stations");
//! stations
//!     .endpoint("getStation")
//!     .get("/{code}")
//!     .success(200, "OK")
//!     .middleware(no_cache())
//!     .path(0, "code")
//!     .handler(HandlerRef::new("getStation", get_station));
//! let (registry, errors) = decls.finish();
//! ```

use crate::http::handler::HandlerRef;
use crate::http::middleware::MiddlewareRef;
use crate::observability::metrics;
use crate::routing::model::{HttpMethod, ParameterEntry, SourceKind};
use crate::routing::path;
use crate::routing::registry::{RegistrationError, Registry};

/// A controller type that knows how to declare its own routes.
pub trait ControllerDefinition {
    /// Stable controller identity.
    fn name(&self) -> &str;

    fn declare(&self, controller: &mut ControllerDecl<'_>);
}

/// Declaration pass over a registry.
pub struct Declarations {
    registry: Registry,
    errors: Vec<RegistrationError>,
}

impl Declarations {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            errors: Vec::new(),
        }
    }

    fn record(&mut self, result: Result<(), RegistrationError>) {
        if let Err(err) = result {
            tracing::warn!(error = %err, "Route declaration failed");
            metrics::record_registration_error();
            self.errors.push(err);
        }
    }

    /// Declare (or reopen) a controller.
    pub fn controller(&mut self, name: &str) -> ControllerDecl<'_> {
        let result = self.registry.get_or_create_controller(name).map(|_| ());
        self.record(result);
        ControllerDecl {
            decls: self,
            name: name.to_string(),
        }
    }

    /// Let a controller definition declare itself.
    pub fn register(&mut self, definition: &dyn ControllerDefinition) {
        let mut controller = self.controller(definition.name());
        definition.declare(&mut controller);
    }

    pub fn errors(&self) -> &[RegistrationError] {
        &self.errors
    }

    /// End the declaration pass.
    pub fn finish(self) -> (Registry, Vec<RegistrationError>) {
        (self.registry, self.errors)
    }
}

pub struct ControllerDecl<'a> {
    decls: &'a mut Declarations,
    name: String,
}

impl ControllerDecl<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the route prefix shared by the controller's endpoints.
    pub fn route(&mut self, prefix: &str) -> &mut Self {
        let prefix = path::normalize(prefix);
        let result = self.decls.registry.set_prefix(&self.name, &prefix);
        self.decls.record(result);
        self
    }

    /// Declare (or reopen) an endpoint of this controller.
    pub fn endpoint(&mut self, name: &str) -> EndpointDecl<'_> {
        let result = self
            .decls
            .registry
            .get_or_create_endpoint(&self.name, name)
            .map(|_| ());
        self.decls.record(result);
        EndpointDecl {
            decls: &mut *self.decls,
            controller: self.name.clone(),
            endpoint: name.to_string(),
        }
    }
}

pub struct EndpointDecl<'a> {
    decls: &'a mut Declarations,
    controller: String,
    endpoint: String,
}

impl EndpointDecl<'_> {
    pub fn handler(self, handler: HandlerRef) -> Self {
        let result = self
            .decls
            .registry
            .set_handler(&self.controller, &self.endpoint, handler);
        self.decls.record(result);
        self
    }

    /// Bind the endpoint to `method` at `path` (whole-segment `{name}` tokens allowed).
    /// A malformed path leaves the endpoint unbound.
    pub fn method(self, method: HttpMethod, path: &str) -> Self {
        let result = path::rewrite_params(path)
            .map_err(|reason| RegistrationError::InvalidPath {
                path: path.to_string(),
                reason,
            })
            .and_then(|suffix| {
                self.decls
                    .registry
                    .set_route(&self.controller, &self.endpoint, &suffix, method)
            });
        self.decls.record(result);
        self
    }

    pub fn get(self, path: &str) -> Self {
        self.method(HttpMethod::Get, path)
    }

    pub fn post(self, path: &str) -> Self {
        self.method(HttpMethod::Post, path)
    }

    pub fn put(self, path: &str) -> Self {
        self.method(HttpMethod::Put, path)
    }

    pub fn patch(self, path: &str) -> Self {
        self.method(HttpMethod::Patch, path)
    }

    pub fn delete(self, path: &str) -> Self {
        self.method(HttpMethod::Delete, path)
    }

    pub fn options(self, path: &str) -> Self {
        self.method(HttpMethod::Options, path)
    }

    pub fn success(self, status: u16, description: &str) -> Self {
        let result = self.decls.registry.set_success(
            &self.controller,
            &self.endpoint,
            status,
            Some(description),
        );
        self.decls.record(result);
        self
    }

    /// Append a middleware; it runs after those declared before it.
    pub fn middleware(self, middleware: MiddlewareRef) -> Self {
        let result = self
            .decls
            .registry
            .append_middleware(&self.controller, &self.endpoint, middleware);
        self.decls.record(result);
        self
    }

    /// Bind argument `index` with an explicit source entry.
    pub fn param(self, parameter: ParameterEntry) -> Self {
        let result = self
            .decls
            .registry
            .append_parameter(&self.controller, &self.endpoint, parameter);
        self.decls.record(result);
        self
    }

    pub fn path(self, index: usize, argument: &str) -> Self {
        self.param(ParameterEntry::new(index, SourceKind::Path, argument))
    }

    pub fn path_as(self, index: usize, argument: &str, source: &str) -> Self {
        self.param(ParameterEntry::new(index, SourceKind::Path, argument).with_source_name(source))
    }

    pub fn query(self, index: usize, argument: &str) -> Self {
        self.param(ParameterEntry::new(index, SourceKind::Query, argument))
    }

    pub fn query_as(self, index: usize, argument: &str, source: &str) -> Self {
        self.param(ParameterEntry::new(index, SourceKind::Query, argument).with_source_name(source))
    }

    pub fn header(self, index: usize, argument: &str) -> Self {
        self.param(ParameterEntry::new(index, SourceKind::Header, argument))
    }

    pub fn header_as(self, index: usize, argument: &str, source: &str) -> Self {
        self.param(ParameterEntry::new(index, SourceKind::Header, argument).with_source_name(source))
    }

    pub fn form_field(self, index: usize, argument: &str) -> Self {
        self.param(ParameterEntry::new(index, SourceKind::FormField, argument))
    }

    pub fn form_field_as(self, index: usize, argument: &str, source: &str) -> Self {
        self.param(ParameterEntry::new(index, SourceKind::FormField, argument).with_source_name(source))
    }

    pub fn body(self, index: usize, argument: &str) -> Self {
        self.param(ParameterEntry::new(index, SourceKind::Body, argument))
    }

    pub fn request(self, index: usize, argument: &str) -> Self {
        self.param(ParameterEntry::new(index, SourceKind::Request, argument))
    }

    pub fn files(self, index: usize, argument: &str) -> Self {
        self.param(ParameterEntry::new(index, SourceKind::Files, argument))
    }

    /// Bind to a middleware-provided request property.
    pub fn property(self, index: usize, argument: &str, property: &str) -> Self {
        self.param(ParameterEntry::new(index, SourceKind::Property, argument).with_source_name(property))
    }
}
