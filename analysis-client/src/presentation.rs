//! Decide what to show for a finding list, and render it as text.

use crate::findings::AnalysisFinding;
use serde::Serialize;
use std::fmt::Write as _;

pub const HEALTHCARE_REMINDER: &str =
    "Next Step: Always consult a qualified healthcare professional for a proper diagnosis.";

pub const NO_ANOMALIES_MESSAGE: &str = "Based on the analysis, no significant potential conditions were identified. Remember, this AI is not a substitute for a professional medical opinion.";

pub const RETRY_HINT: &str = "Please try again with a clear photo of a face.";

/// Confidence band used to colour a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s > 75 => Severity::High,
            s if s > 50 => Severity::Medium,
            _ => Severity::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingView {
    pub condition_name: String,
    pub confidence_score: u8,
    pub description: String,
    pub severity: Severity,
    pub reminder: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    NoAnomalies,
    NotSuitable { reason: String },
    Findings { findings: Vec<FindingView> },
}

pub fn decide(findings: &[AnalysisFinding]) -> View {
    match findings {
        [] => View::NoAnomalies,
        [only] if only.is_invalid_image() => View::NotSuitable {
            reason: only.description.clone(),
        },
        many => View::Findings {
            findings: many
                .iter()
                .map(|f| {
                    let score = f.confidence_score.min(100);
                    FindingView {
                        condition_name: f.condition_name.clone(),
                        confidence_score: score,
                        description: f.description.clone(),
                        severity: Severity::from_score(score),
                        reminder: HEALTHCARE_REMINDER,
                    }
                })
                .collect(),
        },
    }
}

pub fn render_text(view: &View) -> String {
    let mut out = String::new();

    match view {
        View::NoAnomalies => {
            let _ = writeln!(out, "No anomalies detected.");
            let _ = writeln!(out, "{}", NO_ANOMALIES_MESSAGE);
        }
        View::NotSuitable { reason } => {
            let _ = writeln!(out, "Image not suitable for analysis.");
            let _ = writeln!(out, "{} {}", reason.trim(), RETRY_HINT);
        }
        View::Findings { findings } => {
            let _ = writeln!(out, "Potential conditions ({}):", findings.len());
            for finding in findings {
                let _ = writeln!(out);
                let _ = writeln!(
                    out,
                    "[{:<6}] {} ({}%)",
                    finding.severity.label(),
                    finding.condition_name,
                    finding.confidence_score
                );
                let _ = writeln!(out, "  {}", confidence_bar(finding.confidence_score));
                if !finding.description.is_empty() {
                    let _ = writeln!(out, "  {}", finding.description);
                }
                let _ = writeln!(out, "  {}", finding.reminder);
            }
        }
    }

    out
}

fn confidence_bar(score: u8) -> String {
    let filled = (score.min(100) as usize + 5) / 10;
    format!("{}{}", "#".repeat(filled), ".".repeat(10 - filled))
}
