use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Liveness probe.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "analysis-service",
            "version": env!("CARGO_PKG_VERSION"),
            "model": state.analyzer.model(),
        })),
    )
}

/// Readiness probe: the vision provider must be configured and reachable.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.analyzer.health_check().await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "error": e.to_string()
                })),
            )
        }
    }
}
