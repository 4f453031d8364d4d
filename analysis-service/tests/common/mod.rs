//! Shared helpers for analysis-service integration tests.

use analysis_service::config::{AnalysisConfig, ProviderConfig, ProviderKind};
use analysis_service::services::providers::VisionProvider;
use analysis_service::services::{Analyzer, ConditionCatalog};
use analysis_service::startup::{build_router, AppState};
use axum::body::{to_bytes, Body};
use axum::http::Response;
use axum::Router;
use secrecy::Secret;
use std::sync::Arc;

pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

pub fn test_config(provider: ProviderKind) -> AnalysisConfig {
    AnalysisConfig {
        common: service_core::config::Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            log_level: "debug".to_string(),
        },
        provider: ProviderConfig {
            kind: provider,
            model: "gemini-2.5-flash".to_string(),
            api_key: Secret::new("test-api-key".to_string()),
            api_base: "http://127.0.0.1:1".to_string(),
            timeout_secs: 5,
        },
        conditions_file: None,
        body_limit_bytes: BODY_LIMIT,
        otlp_endpoint: None,
    }
}

pub fn router_with(provider: Arc<dyn VisionProvider>) -> Router {
    let analyzer = Arc::new(Analyzer::new(provider, ConditionCatalog::builtin()));
    build_router(AppState::new(analyzer), BODY_LIMIT)
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}
