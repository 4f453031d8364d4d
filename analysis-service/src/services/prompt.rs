//! Instructions and response schema sent to the vision model.

use crate::models::INVALID_IMAGE;
use serde::Deserialize;
use serde_json::{json, Value};
use service_core::error::AppError;
use std::path::Path;

/// User-turn text sent next to the image.
pub const ANALYSIS_PROMPT: &str = "Analyze the face in this image for potential skin conditions from the list provided in your system instructions, following all rules.";

/// Reason the model is told to give for an unusable photo.
pub const INVALID_IMAGE_REASON: &str =
    "The uploaded image does not appear to be a human face suitable for analysis.";

const BUILTIN_CONDITIONS: &[&str] = &[
    "Acne Vulgaris",
    "Rosacea",
    "Melasma",
    "Seborrheic Dermatitis",
    "Atopic Dermatitis",
    "Psoriasis",
    "Perioral Dermatitis",
    "Actinic Keratosis",
    "Seborrheic Keratosis",
    "Milia",
    "Vitiligo",
    "Post-inflammatory Hyperpigmentation",
    "Solar Lentigines",
    "Telangiectasia",
];

/// The closed list of condition names the model may report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionCatalog {
    names: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogEntry {
    condition_name: String,
}

impl ConditionCatalog {
    pub fn builtin() -> Self {
        Self {
            names: BUILTIN_CONDITIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Parse a `[{"conditionName": "..."}]` document. Extra fields are ignored.
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Invalid condition list: {}", e))
        })?;

        let mut names: Vec<String> = Vec::with_capacity(entries.len());
        for entry in entries {
            let name = entry.condition_name.trim();
            if name.is_empty() || name == INVALID_IMAGE || names.iter().any(|n| n == name) {
                continue;
            }
            names.push(name.to_string());
        }

        if names.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Condition list contains no usable condition names"
            )));
        }

        Ok(Self { names })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Failed to read condition list {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&contents)
    }

    /// Built-in list unless an override file is configured.
    pub fn load(path: Option<&str>) -> Result<Self, AppError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

/// System instruction constraining the model to visual, list-bound findings.
pub fn system_instruction(catalog: &ConditionCatalog) -> String {
    let sentinel = json!([{
        "conditionName": INVALID_IMAGE,
        "confidenceScore": 100,
        "description": INVALID_IMAGE_REASON,
    }]);

    format!(
        r#"You are an expert AI assistant specializing in identifying visual signs of dermatological conditions from images of human faces.
Your analysis must be strictly visual and objective. You must not provide any medical advice or diagnosis.
Your response MUST be in JSON format and conform to the provided schema.

**Analysis Steps:**
1.  **Image validation:** First, determine if the image is a clear photograph of a human face where skin is visible.
2.  **Action based on validation:**
    - **If the image IS NOT a valid human face** (e.g., it's a cartoon, an animal, an object, a landscape, or too blurry), you MUST return a single-element array with this exact structure: `{sentinel}`.
    - **If the image IS a valid human face**, proceed to the next step.
3.  **Condition analysis:** Analyze the face for potential conditions ONLY from this list: {conditions}.
    - For each potential condition you identify, provide its name, a confidence score (0-100), and a brief, one-sentence, neutral description of the visual signs.
    - **If you analyze the face and find no clear visual signs of any conditions from the list, you MUST return an empty array `[]`**.
"#,
        sentinel = sentinel,
        conditions = catalog.names().join(", "),
    )
}

/// Response schema in the Gemini `responseSchema` dialect.
pub fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "conditionName": {
                    "type": "STRING",
                    "description": format!(
                        "The name of the potential condition detected, chosen from the pre-approved list. Or \"{}\" if the image is not suitable.",
                        INVALID_IMAGE
                    ),
                },
                "confidenceScore": {
                    "type": "INTEGER",
                    "description": format!(
                        "A confidence score from 0 to 100. For {}, this must be 100.",
                        INVALID_IMAGE
                    ),
                },
                "description": {
                    "type": "STRING",
                    "description": "A brief, neutral, one-sentence description of the visual signs, or the reason the image is invalid.",
                },
            },
            "required": ["conditionName", "confidenceScore", "description"],
        },
    })
}
