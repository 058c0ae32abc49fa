//! Named per-request values set by middleware.
//!
//! Parameters bound with a property source read from here, which lets a
//! middleware hand data to the handler without a dedicated request field.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{body::Body, http::Request, middleware::Next};
use serde_json::Value;

use super::MiddlewareRef;

/// Request extension holding middleware-provided values.
#[derive(Debug, Clone, Default)]
pub struct RequestProperties {
    values: HashMap<String, Value>,
}

impl RequestProperties {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }
}

/// Set property `name` to `value` on every request passing through.
pub fn insert_property(name: impl Into<String>, value: Value) -> MiddlewareRef {
    let name: Arc<str> = Arc::from(name.into());
    let value = Arc::new(value);
    let label = format!("insert_property({name})");
    MiddlewareRef::new(label, move |mut request: Request<Body>, next: Next| {
        let name = name.clone();
        let value = value.clone();
        async move {
            let extensions = request.extensions_mut();
            if extensions.get::<RequestProperties>().is_none() {
                extensions.insert(RequestProperties::default());
            }
            if let Some(props) = extensions.get_mut::<RequestProperties>() {
                props.insert(name.as_ref(), value.as_ref().clone());
            }
            next.run(request).await
        }
    })
}
