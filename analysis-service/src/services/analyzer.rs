//! Face analysis orchestration: prompt assembly, provider call, output shaping.

use crate::models::{sanitize_findings, AnalyzeRequest, Finding, RawFinding};
use crate::services::metrics;
use crate::services::prompt::{response_schema, system_instruction, ConditionCatalog, ANALYSIS_PROMPT};
use crate::services::providers::{ImageInput, ProviderError, VisionProvider, VisionRequest};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// How the model's text was interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOutput {
    /// A JSON array; unusable elements were dropped.
    Findings(Vec<Finding>),
    /// Empty text, invalid JSON, or JSON that is not an array.
    Malformed(String),
}

impl ModelOutput {
    /// Collapse to the list returned to clients. Malformed output becomes `[]`.
    pub fn into_findings(self) -> Vec<Finding> {
        match self {
            ModelOutput::Findings(findings) => findings,
            ModelOutput::Malformed(_) => Vec::new(),
        }
    }
}

/// Interpret raw model text as a finding list.
pub fn parse_model_output(text: Option<&str>) -> ModelOutput {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return ModelOutput::Malformed("model returned an empty response".to_string());
    };

    let value: Value = match serde_json::from_str(strip_code_fence(text)) {
        Ok(value) => value,
        Err(e) => return ModelOutput::Malformed(format!("model output is not JSON: {}", e)),
    };

    let Value::Array(items) = value else {
        return ModelOutput::Malformed("model output is not a JSON array".to_string());
    };

    let findings = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawFinding>(item) {
            Ok(raw) => Some(Finding::from(raw)),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed finding from model output");
                None
            }
        })
        .collect();

    ModelOutput::Findings(sanitize_findings(findings))
}

/// Models occasionally wrap JSON in a markdown fence despite the JSON mime type.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Runs one face analysis against the configured vision provider.
pub struct Analyzer {
    provider: Arc<dyn VisionProvider>,
    catalog: ConditionCatalog,
    system_instruction: String,
}

impl Analyzer {
    pub fn new(provider: Arc<dyn VisionProvider>, catalog: ConditionCatalog) -> Self {
        let system_instruction = system_instruction(&catalog);
        Self {
            provider,
            catalog,
            system_instruction,
        }
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub fn catalog(&self) -> &ConditionCatalog {
        &self.catalog
    }

    pub async fn health_check(&self) -> Result<(), ProviderError> {
        self.provider.health_check().await
    }

    /// Metrics label for a finding. Names outside the condition list share
    /// one series so model output cannot grow the registry.
    fn finding_label<'a>(&self, finding: &'a Finding) -> &'a str {
        if finding.is_invalid_image() || self.catalog.contains(&finding.condition_name) {
            &finding.condition_name
        } else {
            tracing::warn!(
                condition = %finding.condition_name,
                "Model reported a condition outside the configured list"
            );
            metrics::OTHER_CONDITION_LABEL
        }
    }

    #[tracing::instrument(skip_all, fields(model = %self.provider.model(), mime_type = %request.mime_type))]
    pub async fn analyze(&self, request: AnalyzeRequest) -> Result<Vec<Finding>, ProviderError> {
        let model = self.provider.model().to_string();

        let image = ImageInput {
            base64_data: request.base64_image,
            mime_type: request.mime_type,
        };
        let vision_request = VisionRequest {
            system_instruction: self.system_instruction.clone(),
            prompt: ANALYSIS_PROMPT.to_string(),
            response_schema: Some(response_schema()),
        };

        let start = Instant::now();
        let result = self.provider.analyze(&image, &vision_request).await;
        metrics::record_provider_latency(&model, start.elapsed().as_secs_f64());

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Vision provider call failed");
                metrics::record_provider_error(&model, e.kind());
                metrics::record_analysis(&model, "error");
                return Err(e);
            }
        };

        metrics::record_tokens(&model, response.input_tokens, response.output_tokens);

        let findings = match parse_model_output(response.text.as_deref()) {
            ModelOutput::Findings(findings) => findings,
            ModelOutput::Malformed(reason) => {
                tracing::warn!(
                    reason = %reason,
                    finish_reason = response.finish_reason.as_str(),
                    "Model output unusable, answering with an empty finding list"
                );
                metrics::record_analysis(&model, "malformed");
                return Ok(Vec::new());
            }
        };

        let outcome = match findings.as_slice() {
            [] => "no_findings",
            [only] if only.is_invalid_image() => "invalid_image",
            _ => "findings",
        };
        metrics::record_analysis(&model, outcome);

        for finding in &findings {
            metrics::record_finding(self.finding_label(finding));
        }

        tracing::info!(
            outcome,
            finding_count = findings.len(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Face analysis completed"
        );

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::INVALID_IMAGE;
    use crate::services::providers::mock::{MockBehavior, MockVisionProvider};

    fn request() -> AnalyzeRequest {
        AnalyzeRequest {
            base64_image: "aGVsbG8=".to_string(),
            mime_type: "image/jpeg".to_string(),
        }
    }

    #[test]
    fn empty_text_is_malformed() {
        assert!(matches!(parse_model_output(None), ModelOutput::Malformed(_)));
        assert!(matches!(
            parse_model_output(Some("   ")),
            ModelOutput::Malformed(_)
        ));
    }

    #[test]
    fn non_array_json_is_malformed() {
        let output = parse_model_output(Some(r#"{"conditionName":"Acne"}"#));
        assert!(matches!(output, ModelOutput::Malformed(_)));
        assert!(output.into_findings().is_empty());
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert!(matches!(
            parse_model_output(Some("I think this is acne")),
            ModelOutput::Malformed(_)
        ));
    }

    #[test]
    fn fenced_json_is_accepted() {
        let text = "```json\n[{\"conditionName\":\"Milia\",\"confidenceScore\":55,\"description\":\"Small white bumps.\"}]\n```";
        let findings = parse_model_output(Some(text)).into_findings();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].condition_name, "Milia");
    }

    #[test]
    fn malformed_elements_are_dropped() {
        let text = r#"[
            {"conditionName":"Rosacea","confidenceScore":81,"description":"Central facial redness."},
            {"conditionName":"Acne"},
            "junk"
        ]"#;
        let findings = parse_model_output(Some(text)).into_findings();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].confidence_score, 81);
    }

    #[tokio::test]
    async fn analyze_returns_sanitized_findings() {
        let provider = Arc::new(MockVisionProvider::with_response(format!(
            r#"[{{"conditionName":"{}","confidenceScore":40,"description":"Not a face."}}]"#,
            INVALID_IMAGE
        )));
        let analyzer = Analyzer::new(provider.clone(), ConditionCatalog::builtin());

        let findings = analyzer.analyze(request()).await.unwrap();

        assert_eq!(findings.len(), 1);
        assert!(findings[0].is_invalid_image());
        assert_eq!(findings[0].confidence_score, 100);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn off_list_conditions_share_one_metrics_series() {
        metrics::init_metrics();
        let names: Vec<String> = (0..5).map(|i| format!("made-up-condition-{}", i)).collect();
        let body = names
            .iter()
            .map(|name| {
                format!(
                    r#"{{"conditionName":"{}","confidenceScore":60,"description":"?"}}"#,
                    name
                )
            })
            .collect::<Vec<_>>()
            .join(",");
        let provider = Arc::new(MockVisionProvider::with_response(format!("[{}]", body)));
        let analyzer = Analyzer::new(provider, ConditionCatalog::builtin());

        let findings = analyzer.analyze(request()).await.unwrap();
        assert_eq!(findings.len(), 5);

        let text = metrics::get_metrics().unwrap();
        assert!(!text.contains("made-up-condition"));
        assert!(text.contains(&format!(
            "analysis_findings_total{{condition=\"{}\"}}",
            metrics::OTHER_CONDITION_LABEL
        )));
    }

    #[test]
    fn catalog_names_and_sentinel_keep_their_own_label() {
        let provider = Arc::new(MockVisionProvider::new());
        let catalog = ConditionCatalog::builtin();
        let known = catalog.names()[0].clone();
        let analyzer = Analyzer::new(provider, catalog);

        let finding = |name: &str| Finding {
            condition_name: name.to_string(),
            confidence_score: 70,
            description: "x".to_string(),
        };
        let listed = finding(&known);
        let sentinel = finding(INVALID_IMAGE);
        let unknown = finding("Dragon scales");

        assert_eq!(analyzer.finding_label(&listed), known);
        assert_eq!(analyzer.finding_label(&sentinel), INVALID_IMAGE);
        assert_eq!(
            analyzer.finding_label(&unknown),
            metrics::OTHER_CONDITION_LABEL
        );
    }

    #[tokio::test]
    async fn analyze_degrades_malformed_output_to_empty_list() {
        let provider = Arc::new(MockVisionProvider::with_response("not json at all"));
        let analyzer = Analyzer::new(provider, ConditionCatalog::builtin());

        let findings = analyzer.analyze(request()).await.unwrap();
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn analyze_propagates_provider_errors() {
        let provider = Arc::new(MockVisionProvider::with_behavior(MockBehavior::ApiError(
            "quota".to_string(),
        )));
        let analyzer = Analyzer::new(provider, ConditionCatalog::builtin());

        let err = analyzer.analyze(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::ApiError(_)));
    }
}
