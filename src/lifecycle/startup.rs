//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the station store
//! - Run the declaration pass over every controller
//! - Materialize routes once and wrap them in the HTTP server
//!
//! # Design Decisions
//! - Declaration errors and routes the router refuses are logged and tolerated
//!   unless `strict_routes` is set
//! - Nothing here binds a socket; the caller owns the listener

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::api::{DataAccess, ReadingsController, StationsController};
use crate::config::{AppConfig, StoreConfig};
use crate::health::{HealthController, HealthValidator, StoreHealthCheck};
use crate::http::HttpServer;
use crate::routing::{AxumRouteSink, Declarations, InstalledRoute, RegistrationError, Registry};
use crate::store::{MemoryStore, StationStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{} route registration(s) failed and strict_routes is enabled", .0.len())]
    Registration(Vec<RegistrationError>),

    #[error("route materialization failed: {0}")]
    Materialize(#[from] RegistrationError),

    #[error("store initialization failed: {0}")]
    Store(#[from] StoreError),
}

/// A fully wired service, ready to be served.
pub struct Application {
    pub server: HttpServer,
    pub routes: Vec<InstalledRoute>,
    /// Declaration failures and refused routes tolerated during startup.
    pub registration_errors: Vec<RegistrationError>,
}

/// Open the configured store: the seed file when set, else an empty store.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn StationStore>, StartupError> {
    match &config.seed_path {
        Some(path) => Ok(Arc::new(MemoryStore::from_seed_file(Path::new(path)).await?)),
        None => {
            tracing::warn!("No seed file configured; serving an empty store");
            Ok(Arc::new(MemoryStore::default()))
        }
    }
}

/// Declare the health, stations and readings controllers and assemble the server.
pub fn build_application(config: &AppConfig, store: Arc<dyn StationStore>) -> Result<Application, StartupError> {
    let access = DataAccess {
        api_key: config.auth.api_key.clone(),
    };

    let store_check: Arc<dyn HealthValidator> = Arc::new(StoreHealthCheck::new(store.clone()));

    let mut decls = Declarations::new(Registry::new());
    decls.register(&HealthController::new(vec![store_check]));
    decls.register(&StationsController::new(store.clone(), access.clone()));
    decls.register(&ReadingsController::new(store, access));

    assemble(decls, config)
}

/// Finish a declaration pass, materialize its routes and wrap them in the server.
pub fn assemble(decls: Declarations, config: &AppConfig) -> Result<Application, StartupError> {
    let (mut registry, mut errors) = decls.finish();

    if !errors.is_empty() {
        for err in &errors {
            tracing::error!(error = %err, "Route declaration error");
        }
        if config.server.strict_routes {
            return Err(StartupError::Registration(errors));
        }
        tracing::warn!(count = errors.len(), "Route initialization completed with errors");
    }

    let mut sink = AxumRouteSink::new();
    let outcome = registry.materialize(&mut sink)?;
    if !outcome.rejected.is_empty() {
        if config.server.strict_routes {
            errors.extend(outcome.rejected);
            return Err(StartupError::Registration(errors));
        }
        tracing::warn!(count = outcome.rejected.len(), "Some routes were not installed");
        errors.extend(outcome.rejected);
    }
    tracing::info!(routes = outcome.routes.len(), "Routes initialized");

    Ok(Application {
        server: HttpServer::new(sink.into_router(), config),
        routes: outcome.routes,
        registration_errors: errors,
    })
}
