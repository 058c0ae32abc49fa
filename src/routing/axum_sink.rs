//! Axum adapter for materialized routes.
//!
//! # Design Decisions
//! - Registry paths (`:name`) are translated to axum's `{name}` syntax here
//! - The first declared middleware runs first (outermost layer)
//! - Paths axum would refuse are rejected up front with a [`RegistrationError`]:
//!   literals starting with `*` or `:`, a parameter renamed at a position two
//!   routes share, or a second registration of the same method + path.
//!   The first registration wins.

use std::collections::{HashMap, HashSet};

use axum::{
    body::Body,
    http::Request,
    middleware::{self as axum_middleware, Next},
    routing::{on, MethodFilter, MethodRouter},
    Router,
};

use crate::routing::materialize::{HandlerChain, RouteSink};
use crate::routing::model::HttpMethod;
use crate::routing::path;
use crate::routing::registry::RegistrationError;

/// Builds an [`axum::Router`] from materialized routes.
#[derive(Default)]
pub struct AxumRouteSink {
    router: Router,
    seen: HashSet<(HttpMethod, String)>,
    /// Parameter name claimed at each path shape, with the path that claimed it.
    /// Keyed by the segments before the parameter, parameters written as `:`.
    params: HashMap<String, (String, String)>,
}

impl AxumRouteSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_router(self) -> Router {
        self.router
    }

    /// New `(shape, name)` claims for `path`, or the conflicting route.
    fn claims(&self, path: &str) -> Result<Vec<(String, String)>, RegistrationError> {
        let mut shape = String::new();
        let mut claims = Vec::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let Some(name) = segment.strip_prefix(':') else {
                shape.push('/');
                shape.push_str(segment);
                continue;
            };
            match self.params.get(&shape) {
                Some((existing, first)) if existing != name => {
                    return Err(RegistrationError::RouteConflict {
                        path: path.to_string(),
                        existing: first.clone(),
                    });
                }
                Some(_) => {}
                None => claims.push((shape.clone(), name.to_string())),
            }
            shape.push_str("/:");
        }
        Ok(claims)
    }
}

fn method_filter(method: HttpMethod) -> MethodFilter {
    match method {
        HttpMethod::Get => MethodFilter::GET,
        HttpMethod::Post => MethodFilter::POST,
        HttpMethod::Put => MethodFilter::PUT,
        HttpMethod::Patch => MethodFilter::PATCH,
        HttpMethod::Delete => MethodFilter::DELETE,
        HttpMethod::Options => MethodFilter::OPTIONS,
    }
}

fn method_router(method: HttpMethod, chain: HandlerChain) -> MethodRouter {
    let dispatcher = chain.dispatcher;
    let mut route = on(method_filter(method), move |request: Request<Body>| {
        let dispatcher = dispatcher.clone();
        async move { dispatcher.dispatch(request).await }
    });

    // Last layer added runs first.
    for middleware in chain.middleware.into_iter().rev() {
        route = route.layer(axum_middleware::from_fn(move |request: Request<Body>, next: Next| {
            let middleware = middleware.clone();
            async move { middleware.handle(request, next).await }
        }));
    }
    route
}

impl RouteSink for AxumRouteSink {
    fn register(&mut self, method: HttpMethod, path: &str, chain: HandlerChain) -> Result<(), RegistrationError> {
        path::check(path).map_err(|reason| RegistrationError::InvalidPath {
            path: path.to_string(),
            reason,
        })?;
        let claims = self.claims(path)?;
        if self.seen.contains(&(method, path.to_string())) {
            return Err(RegistrationError::DuplicateRoute {
                method,
                path: path.to_string(),
            });
        }

        self.seen.insert((method, path.to_string()));
        for (shape, name) in claims {
            self.params.insert(shape, (name, path.to_string()));
        }
        let axum_path = path::to_axum(path);
        let router = std::mem::take(&mut self.router);
        self.router = router.route(&axum_path, method_router(method, chain));
        Ok(())
    }
}
