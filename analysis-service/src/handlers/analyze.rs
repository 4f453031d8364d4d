use crate::models::{AnalyzeRequest, Finding};
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, Method, StatusCode},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

pub const MISSING_FIELDS_MESSAGE: &str = "Missing base64Image or mimeType in request body";

/// `POST /api/analyze`: forward one face photo to the vision model.
///
/// Always answers 200 with a JSON array once the model has replied, even when
/// its output was unusable (the array is then empty).
pub async fn analyze_face(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<Vec<Finding>>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(rejection.body_text())
        } else {
            AppError::BadRequest(anyhow::anyhow!(rejection.body_text()))
        }
    })?;

    if request.validate().is_err() {
        return Err(AppError::BadRequest(anyhow::anyhow!(MISSING_FIELDS_MESSAGE)));
    }

    let findings = state.analyzer.analyze(request).await?;

    Ok(Json(findings))
}

/// Any verb other than POST on the analysis route.
pub async fn method_not_allowed(method: Method) -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        format!("Method {} Not Allowed", method),
    )
}
