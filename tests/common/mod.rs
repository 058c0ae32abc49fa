//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use datamart_api::config::AppConfig;
use datamart_api::lifecycle::{build_application, Shutdown};
use datamart_api::store::MemoryStore;
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const SEED: &str = r#"{
    "stations": [
        {"code": "101", "name": "Kamloops", "latitude": 50.67, "longitude": -120.33, "elevation": 345.0},
        {"code": "102", "name": "Vernon", "latitude": 50.27, "longitude": -119.27, "elevation": 482.0},
        {"code": "103", "name": "Abbotsford", "latitude": 49.03, "longitude": -122.36, "elevation": 58.0},
        {"code": "104", "name": "Prince George", "latitude": 53.88, "longitude": -122.68}
    ],
    "readings": [
        {"station_code": "101", "weather_date": "2024-07-01T12:00:00Z", "temperature": 28.5, "ffmc": 88.1},
        {"station_code": "101", "weather_date": "2024-07-01T13:00:00Z", "temperature": 29.1},
        {"station_code": "102", "weather_date": "2024-07-01T12:00:00Z", "temperature": 26.0, "ffmc": 85.4},
        {"station_code": "103", "weather_date": "2024-07-02T12:00:00Z", "temperature": 22.0},
        {"station_code": "104", "weather_date": "2024-07-02T09:00:00Z", "temperature": 15.3}
    ]
}"#;

pub fn seeded_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::from_json(SEED).expect("seed parses"))
}

/// The full application router over the seeded store.
pub fn test_app(config: &AppConfig) -> (Router, Arc<MemoryStore>) {
    let store = seeded_store();
    let app = build_application(config, store.clone()).expect("application builds");
    (app.server.router(), store)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Drive one request through `router` in-process.
pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body reads");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    TestResponse { status, headers, body }
}

pub async fn get(router: &Router, uri: &str) -> TestResponse {
    send(router, request(Method::GET, uri)).await
}

pub fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
}

/// Serve the full application on an ephemeral port.
pub async fn start_server(config: AppConfig) -> (SocketAddr, Shutdown) {
    let app = build_application(&config, seeded_store()).expect("application builds");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = app.server.run(listener, server_shutdown).await;
    });
    (addr, shutdown)
}

/// Build a `multipart/form-data` body: `(name, Some(file_name), content)` for
/// files, `(name, None, content)` for text fields.
pub fn multipart_body(boundary: &str, parts: &[(&str, Option<&str>, &str)]) -> String {
    let mut body = String::new();
    for (name, file_name, content) in parts {
        body.push_str(&format!("--{boundary}\r\n"));
        match file_name {
            Some(file_name) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: text/plain\r\n\r\n"
            )),
            None => body.push_str(&format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")),
        }
        body.push_str(content);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{boundary}--\r\n"));
    body
}
