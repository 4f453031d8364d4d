//! Gemini vision provider implementation.
//!
//! Sends the image as inline data next to the prompt and asks for JSON output
//! constrained by a response schema.

use super::{
    FinishReason, ImageInput, ProviderError, ProviderResponse, VisionProvider, VisionRequest,
};
use crate::config::ProviderConfig;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Header carrying the API key, kept out of URLs so it never lands in logs.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Secret<String>,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl From<&ProviderConfig> for GeminiConfig {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Gemini vision provider.
pub struct GeminiVisionProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiVisionProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Build the API URL for the configured model and method.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.api_base, self.config.model, method
        )
    }

    fn build_request(image: &ImageInput, request: &VisionRequest) -> GenerateContentRequest {
        let parts = vec![
            ContentPart::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.base64_data.clone(),
                },
            },
            ContentPart::Text {
                text: request.prompt.clone(),
            },
        ];

        GenerateContentRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![ContentPart::Text {
                    text: request.system_instruction.clone(),
                }],
            }),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: request
                    .response_schema
                    .as_ref()
                    .map(|_| "application/json".to_string()),
                response_schema: request.response_schema.clone(),
            }),
        }
    }
}

#[async_trait]
impl VisionProvider for GeminiVisionProvider {
    async fn analyze(
        &self,
        image: &ImageInput,
        request: &VisionRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        if self.config.api_key.expose_secret().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        let body = Self::build_request(image, request);
        let url = self.api_url("generateContent");

        tracing::debug!(
            model = %self.config.model,
            mime_type = %image.mime_type,
            image_b64_len = image.base64_data.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            if status.as_u16() == 400 {
                return Err(ProviderError::InvalidRequest(format!(
                    "Gemini rejected the request: {}",
                    error_text
                )));
            }

            return Err(ProviderError::ApiError(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        if api_response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_ref())
            .is_some()
        {
            return Err(ProviderError::ContentFiltered);
        }

        let candidate = api_response.candidates.first();

        let finish_reason = candidate
            .map(|c| match c.finish_reason.as_deref() {
                Some("STOP") => FinishReason::Complete,
                Some("MAX_TOKENS") => FinishReason::Length,
                Some("SAFETY") => FinishReason::ContentFilter,
                _ => FinishReason::Complete,
            })
            .unwrap_or(FinishReason::Complete);

        if finish_reason == FinishReason::ContentFilter {
            return Err(ProviderError::ContentFiltered);
        }

        // Long answers may come back split over several text parts.
        let text = candidate.and_then(|c| c.content.as_ref()).map(|content| {
            content
                .parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<String>()
        });

        let usage = api_response.usage_metadata.unwrap_or_default();

        Ok(ProviderResponse {
            text,
            input_tokens: usage.prompt_token_count.unwrap_or(0),
            output_tokens: usage.candidates_token_count.unwrap_or(0),
            finish_reason,
        })
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.api_key.expose_secret().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        // Fetch the model resource to verify both key and model name
        let url = format!("{}/models/{}", self.config.api_base, self.config.model);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::ApiError(format!(
                "Health check failed: {}",
                response.status()
            )))
        }
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
