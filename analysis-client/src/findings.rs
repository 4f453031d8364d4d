use serde::{Deserialize, Deserializer, Serialize};

/// Reserved condition name meaning "this is not a usable face photo".
pub const INVALID_IMAGE: &str = "INVALID_IMAGE";

/// One potential condition reported by the analysis endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisFinding {
    pub condition_name: String,
    #[serde(deserialize_with = "deserialize_score")]
    pub confidence_score: u8,
    #[serde(default)]
    pub description: String,
}

impl AnalysisFinding {
    pub fn is_invalid_image(&self) -> bool {
        self.condition_name == INVALID_IMAGE
    }
}

/// Accept any JSON number and clamp it into 0..=100.
fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if raw.is_nan() {
        return Ok(0);
    }
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}
