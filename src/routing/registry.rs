//! Routing metadata registry.
//!
//! # Responsibilities
//! - Own every controller and endpoint declaration
//! - Enforce uniqueness of names and parameter indices
//! - Refuse mutation once routes have been materialized
//!
//! # Design Decisions
//! - Explicitly constructed and passed around; there is no global instance
//! - Mutators report failures as values; callers decide whether to continue
//! - Insertion order is kept for controllers and endpoints (IndexMap)

use axum::http::StatusCode;
use indexmap::IndexMap;
use thiserror::Error;

use crate::http::handler::HandlerRef;
use crate::http::middleware::MiddlewareRef;
use crate::routing::model::{ControllerEntry, EndpointEntry, HttpMethod, ParameterEntry};

/// Failure to apply a routing declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("controller {0} has no definition")]
    ControllerNotFound(String),

    #[error("duplicate parameter index {index} on {controller}.{endpoint}; parameter ignored")]
    DuplicateParameter {
        controller: String,
        endpoint: String,
        index: usize,
    },

    #[error("invalid success status {status} on {controller}.{endpoint}")]
    InvalidStatus {
        controller: String,
        endpoint: String,
        status: u16,
    },

    #[error("parameter index {index} on {controller}.{endpoint} exceeds the limit of {max}")]
    ParameterIndexTooLarge {
        controller: String,
        endpoint: String,
        index: usize,
        max: usize,
    },

    #[error("invalid route path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("route {path} conflicts with {existing}: parameter names differ")]
    RouteConflict { path: String, existing: String },

    #[error("route {method} {path} already registered")]
    DuplicateRoute { method: HttpMethod, path: String },

    #[error("routes already materialized; registry is read-only")]
    Frozen,

    #[error("routes already initialized")]
    AlreadyMaterialized,
}

/// Highest parameter index + 1 an endpoint may declare.
pub const MAX_PARAMETERS: usize = 64;

/// Lifecycle of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    Declaring,
    Materialized,
}

#[derive(Debug)]
pub struct Registry {
    controllers: IndexMap<String, ControllerEntry>,
    state: RegistryState,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            controllers: IndexMap::new(),
            state: RegistryState::Declaring,
        }
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    pub(crate) fn mark_materialized(&mut self) {
        self.state = RegistryState::Materialized;
    }

    /// Controllers in declaration order.
    pub fn controllers(&self) -> impl Iterator<Item = &ControllerEntry> {
        self.controllers.values()
    }

    pub fn controller(&self, name: &str) -> Option<&ControllerEntry> {
        self.controllers.get(name)
    }

    pub fn endpoint(&self, controller: &str, endpoint: &str) -> Option<&EndpointEntry> {
        self.controllers.get(controller)?.endpoints.get(endpoint)
    }

    fn ensure_declaring(&self) -> Result<(), RegistrationError> {
        match self.state {
            RegistryState::Declaring => Ok(()),
            RegistryState::Materialized => Err(RegistrationError::Frozen),
        }
    }

    /// Find the named controller, creating an empty one on first reference.
    pub fn get_or_create_controller(&mut self, name: &str) -> Result<&mut ControllerEntry, RegistrationError> {
        self.ensure_declaring()?;
        Ok(self
            .controllers
            .entry(name.to_string())
            .or_insert_with(|| ControllerEntry::new(name)))
    }

    /// Find the named endpoint, creating it on first reference. The controller must exist.
    pub fn get_or_create_endpoint(
        &mut self,
        controller: &str,
        endpoint: &str,
    ) -> Result<&mut EndpointEntry, RegistrationError> {
        self.ensure_declaring()?;
        let entry = self
            .controllers
            .get_mut(controller)
            .ok_or_else(|| RegistrationError::ControllerNotFound(controller.to_string()))?;
        Ok(entry
            .endpoints
            .entry(endpoint.to_string())
            .or_insert_with(|| EndpointEntry::new(endpoint)))
    }

    pub fn set_prefix(&mut self, controller: &str, prefix: &str) -> Result<(), RegistrationError> {
        self.get_or_create_controller(controller)?.route_prefix = prefix.to_string();
        Ok(())
    }

    pub fn set_route(
        &mut self,
        controller: &str,
        endpoint: &str,
        suffix: &str,
        method: HttpMethod,
    ) -> Result<(), RegistrationError> {
        let entry = self.get_or_create_endpoint(controller, endpoint)?;
        entry.route_suffix = suffix.to_string();
        entry.method = Some(method);
        Ok(())
    }

    pub fn set_success(
        &mut self,
        controller: &str,
        endpoint: &str,
        status: u16,
        description: Option<&str>,
    ) -> Result<(), RegistrationError> {
        self.ensure_declaring()?;
        let status = StatusCode::from_u16(status).map_err(|_| RegistrationError::InvalidStatus {
            controller: controller.to_string(),
            endpoint: endpoint.to_string(),
            status,
        })?;
        let entry = self.get_or_create_endpoint(controller, endpoint)?;
        entry.success_status = status;
        if let Some(description) = description {
            entry.success_description = description.to_string();
        }
        Ok(())
    }

    pub fn set_handler(
        &mut self,
        controller: &str,
        endpoint: &str,
        handler: HandlerRef,
    ) -> Result<(), RegistrationError> {
        self.get_or_create_endpoint(controller, endpoint)?.handler = Some(handler);
        Ok(())
    }

    pub fn append_middleware(
        &mut self,
        controller: &str,
        endpoint: &str,
        middleware: MiddlewareRef,
    ) -> Result<(), RegistrationError> {
        self.get_or_create_endpoint(controller, endpoint)?
            .middleware
            .push(middleware);
        Ok(())
    }

    /// Add a parameter binding. An index that is already bound is rejected and the
    /// existing binding kept.
    pub fn append_parameter(
        &mut self,
        controller: &str,
        endpoint: &str,
        parameter: ParameterEntry,
    ) -> Result<(), RegistrationError> {
        let entry = self.get_or_create_endpoint(controller, endpoint)?;
        if parameter.index >= MAX_PARAMETERS {
            return Err(RegistrationError::ParameterIndexTooLarge {
                controller: controller.to_string(),
                endpoint: endpoint.to_string(),
                index: parameter.index,
                max: MAX_PARAMETERS,
            });
        }
        if entry.parameter(parameter.index).is_some() {
            return Err(RegistrationError::DuplicateParameter {
                controller: controller.to_string(),
                endpoint: endpoint.to_string(),
                index: parameter.index,
            });
        }
        entry.parameters.push(parameter);
        Ok(())
    }
}
