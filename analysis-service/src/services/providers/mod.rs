//! Vision model provider abstractions and implementations.
//!
//! The analysis endpoint talks to a provider through [`VisionProvider`], so the
//! hosted Gemini backend and the deterministic mock are interchangeable.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use serde_json::Value;
use service_core::error::AppError;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError(_) => "api_error",
            ProviderError::InvalidRequest(_) => "invalid_request",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::ContentFiltered => "content_filtered",
            ProviderError::NetworkError(_) => "network_error",
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::RateLimited => AppError::TooManyRequests(
                "The analysis model is rate limited, please try again later".to_string(),
                None,
            ),
            ProviderError::NotConfigured(_) => AppError::ServiceUnavailable,
            other => AppError::UpstreamError(other.to_string()),
        }
    }
}

/// Inline image handed to the model, already base64-encoded by the client.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub base64_data: String,
    pub mime_type: String,
}

/// Everything the model needs besides the image.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub system_instruction: String,
    pub prompt: String,
    /// JSON schema the model output must follow; requests JSON output when set.
    pub response_schema: Option<Value>,
}

/// Result of a provider response.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Raw text returned by the model (JSON when a schema was requested).
    pub text: Option<String>,

    /// Input tokens consumed.
    pub input_tokens: i32,

    /// Output tokens generated.
    pub output_tokens: i32,

    /// Finish reason.
    pub finish_reason: FinishReason,
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
}

impl FinishReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Complete => "complete",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content_filter",
        }
    }
}

/// Trait for image-understanding providers (e.g., Gemini).
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Run one image + instruction request and return the raw model text.
    async fn analyze(
        &self,
        image: &ImageInput,
        request: &VisionRequest,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Model identifier, for logs and metrics.
    fn model(&self) -> &str;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
