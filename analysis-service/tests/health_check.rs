//! End-to-end tests against a spawned server using the mock provider.

mod common;

use analysis_service::config::ProviderKind;
use analysis_service::services::providers::mock::MockVisionProvider;
use analysis_service::startup::Application;
use common::test_config;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Spawn the application on a random port and return the port number.
async fn spawn_app() -> u16 {
    let app = Application::build_with_provider(
        test_config(ProviderKind::Mock),
        Arc::new(MockVisionProvider::new()),
    )
    .await
    .expect("Failed to build application");

    let port = app.port();

    // Spawn the server in the background
    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });

    port
}

#[tokio::test]
async fn health_check_returns_ok() {
    let port = spawn_app().await;
    let client = Client::new();

    let response = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], "mock");
}

#[tokio::test]
async fn readiness_check_returns_ok_with_mock_provider() {
    let port = spawn_app().await;

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/ready", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
async fn analyze_round_trip_over_http() {
    let port = spawn_app().await;

    let response = Client::new()
        .post(format!("http://127.0.0.1:{}/api/analyze", port))
        .json(&json!({ "base64Image": "aGVsbG8=", "mimeType": "image/jpeg" }))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body[0]["conditionName"], "Acne Vulgaris");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let mut config = test_config(ProviderKind::Mock);
    config.body_limit_bytes = 1024;
    let app = Application::build_with_provider(config, Arc::new(MockVisionProvider::new()))
        .await
        .expect("Failed to build application");
    let port = app.port();
    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });

    let response = Client::new()
        .post(format!("http://127.0.0.1:{}/api/analyze", port))
        .json(&json!({ "base64Image": "A".repeat(4096), "mimeType": "image/jpeg" }))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 413);
}
