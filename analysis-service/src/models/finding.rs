use serde::{Deserialize, Serialize};

/// Condition name the model uses to reject a photo that is not a usable face.
pub const INVALID_IMAGE: &str = "INVALID_IMAGE";

/// One potential condition reported for the analyzed face.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub condition_name: String,
    /// Always within `0..=100`.
    pub confidence_score: u8,
    pub description: String,
}

/// A finding as the model emitted it, before range checks.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFinding {
    pub condition_name: String,
    pub confidence_score: f64,
    #[serde(default)]
    pub description: String,
}

impl From<RawFinding> for Finding {
    fn from(raw: RawFinding) -> Self {
        let score = if raw.confidence_score.is_finite() {
            raw.confidence_score.round().clamp(0.0, 100.0) as u8
        } else {
            0
        };

        Finding {
            condition_name: raw.condition_name.trim().to_string(),
            confidence_score: score,
            description: raw.description.trim().to_string(),
        }
    }
}

impl Finding {
    pub fn is_invalid_image(&self) -> bool {
        self.condition_name == INVALID_IMAGE
    }
}

/// Enforce the sentinel rule: an `INVALID_IMAGE` record is the only element of
/// its list and carries a score of 100.
pub fn sanitize_findings(mut findings: Vec<Finding>) -> Vec<Finding> {
    match findings.iter().position(|f| f.is_invalid_image()) {
        Some(pos) => {
            let mut sentinel = findings.swap_remove(pos);
            sentinel.confidence_score = 100;
            vec![sentinel]
        }
        None => findings,
    }
}
