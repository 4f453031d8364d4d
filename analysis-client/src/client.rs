//! HTTP client for `POST /api/analyze`.

use crate::asset::ImageAsset;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::findings::AnalysisFinding;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;

/// Anything that can turn a normalized photo into findings.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, image: &ImageAsset) -> Result<Vec<AnalysisFinding>, ClientError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeBody<'a> {
    base64_image: &'a str,
    mime_type: &'a str,
}

/// Posts base64-encoded images to the analysis service.
#[derive(Clone)]
pub struct SubmissionClient {
    client: Client,
    url: String,
}

impl SubmissionClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.analyze_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send already-encoded image data and parse the finding list.
    pub async fn submit(
        &self,
        base64_image: &str,
        mime_type: &str,
    ) -> Result<Vec<AnalysisFinding>, ClientError> {
        let body = AnalyzeBody {
            base64_image,
            mime_type,
        };

        tracing::debug!(url = %self.url, %mime_type, payload_len = base64_image.len(), "Submitting image for analysis");

        let response = self.client.post(&self.url).json(&body).send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = server_error_message(status, &text);
            tracing::warn!(status = status.as_u16(), error = %message, "Analysis request failed");
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }

        parse_findings(&text)
    }
}

#[async_trait]
impl AnalysisBackend for SubmissionClient {
    async fn analyze(&self, image: &ImageAsset) -> Result<Vec<AnalysisFinding>, ClientError> {
        let encoded = STANDARD.encode(&image.bytes);
        self.submit(&encoded, &image.mime_type).await
    }
}

/// Prefer the `error` field, then the raw body, then the status code.
pub fn server_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        if let Some(Value::String(error)) = map.get("error") {
            if !error.trim().is_empty() {
                return error.clone();
            }
        }
    }

    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }

    format!("Server responded with status: {}", status.as_u16())
}

/// Parse a success body. Anything other than a JSON array of findings is malformed.
pub fn parse_findings(body: &str) -> Result<Vec<AnalysisFinding>, ClientError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ClientError::MalformedResponse(format!("response is not JSON: {}", e)))?;

    if !value.is_array() {
        return Err(ClientError::MalformedResponse(
            "response is not a JSON array".to_string(),
        ));
    }

    serde_json::from_value(value)
        .map_err(|e| ClientError::MalformedResponse(format!("unexpected finding shape: {}", e)))
}
