//! Mock provider implementation for local runs and tests.

use super::{
    FinishReason, ImageInput, ProviderError, ProviderResponse, VisionProvider, VisionRequest,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Canned answer returned by [`MockVisionProvider::new`].
pub const DEFAULT_MOCK_RESPONSE: &str = r#"[{"conditionName":"Acne Vulgaris","confidenceScore":62,"description":"Scattered small inflamed papules are visible on the cheeks."}]"#;

/// What the mock answers with.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return this raw model text (or no text at all).
    Respond(Option<String>),
    RateLimited,
    ApiError(String),
    NetworkError(String),
}

/// Mock vision provider.
pub struct MockVisionProvider {
    behavior: MockBehavior,
    calls: AtomicUsize,
}

impl MockVisionProvider {
    pub fn new() -> Self {
        Self::with_behavior(MockBehavior::Respond(Some(DEFAULT_MOCK_RESPONSE.to_string())))
    }

    pub fn with_response(text: impl Into<String>) -> Self {
        Self::with_behavior(MockBehavior::Respond(Some(text.into())))
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `analyze` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockVisionProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    async fn analyze(
        &self,
        image: &ImageInput,
        request: &VisionRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            MockBehavior::Respond(text) => Ok(ProviderResponse {
                text: text.clone(),
                input_tokens: ((image.base64_data.len() + request.prompt.len()) / 4) as i32,
                output_tokens: text.as_ref().map(|t| t.len() / 4).unwrap_or(0) as i32,
                finish_reason: FinishReason::Complete,
            }),
            MockBehavior::RateLimited => Err(ProviderError::RateLimited),
            MockBehavior::ApiError(msg) => Err(ProviderError::ApiError(msg.clone())),
            MockBehavior::NetworkError(msg) => Err(ProviderError::NetworkError(msg.clone())),
        }
    }

    fn model(&self) -> &str {
        "mock"
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
