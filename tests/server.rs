//! End-to-end tests over a real listener.

mod common;

use std::time::Duration;

use datamart_api::config::AppConfig;
use reqwest::StatusCode;
use serde_json::Value;

use common::start_server;

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_serves_requests_until_shutdown() {
    let (addr, shutdown) = start_server(AppConfig::default()).await;
    let client = client();

    let response = client
        .get(format!("http://{addr}/stations/101"))
        .send()
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body: Value = response.json().await.unwrap();
    assert_eq!(body[0]["name"], "Kamloops");

    let response = client
        .get(format!("http://{addr}/readings?start=2024-07-01&end=2024-07-02"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["collection"].as_array().unwrap().len(), 3);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), async {
        while shutdown.receiver_count() > 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("server stops after shutdown");
}

#[tokio::test]
async fn test_caller_supplied_request_id_is_echoed() {
    let (addr, shutdown) = start_server(AppConfig::default()).await;

    let response = client()
        .get(format!("http://{addr}/healthCheck"))
        .header("x-request-id", "trace-abc")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "trace-abc");

    shutdown.trigger();
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut config = AppConfig::default();
    config.server.max_body_size = 16;
    let (addr, shutdown) = start_server(config).await;

    let response = client()
        .get(format!("http://{addr}/stations"))
        .body(vec![b'x'; 1024])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (addr, shutdown) = start_server(AppConfig::default()).await;

    let response = client().get(format!("http://{addr}/nowhere")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Not Found");

    shutdown.trigger();
}
