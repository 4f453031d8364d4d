use secrecy::Secret;
use service_core::config::{self as core_config, is_production};
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

/// Default upstream model for face analysis.
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Gemini REST API base URL.
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Request body limit. A 5MB image grows by a third once base64-encoded, so
/// 10MB leaves room for the JSON envelope.
const DEFAULT_BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub common: core_config::Config,
    pub provider: ProviderConfig,
    /// Optional JSON file (`[{"conditionName": "..."}]`) replacing the built-in condition list.
    pub conditions_file: Option<String>,
    pub body_limit_bytes: usize,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub model: String,
    pub api_key: Secret<String>,
    pub api_base: String,
    pub timeout_secs: u64,
}

/// Which vision backend serves `/api/analyze`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Mock,
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown ANALYSIS_PROVIDER '{}', expected 'gemini' or 'mock'",
                other
            ))),
        }
    }
}

impl AnalysisConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = is_production();

        let kind: ProviderKind = get_env("ANALYSIS_PROVIDER", Some("gemini"), false)?.parse()?;

        // The mock provider never talks to Google, so the key is only mandatory for Gemini.
        let api_key = match kind {
            ProviderKind::Gemini => get_env("GOOGLE_API_KEY", None, is_prod)?,
            ProviderKind::Mock => env::var("GOOGLE_API_KEY").unwrap_or_default(),
        };

        Ok(AnalysisConfig {
            common: common_config,
            provider: ProviderConfig {
                kind,
                model: get_env("ANALYSIS_MODEL", Some(DEFAULT_MODEL), false)?,
                api_key: Secret::new(api_key),
                api_base: get_env("GEMINI_API_BASE", Some(DEFAULT_GEMINI_API_BASE), false)?,
                timeout_secs: get_env(
                    "ANALYSIS_PROVIDER_TIMEOUT_SECS",
                    Some(&DEFAULT_PROVIDER_TIMEOUT_SECS.to_string()),
                    false,
                )?
                .parse()
                .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS),
            },
            conditions_file: env::var("ANALYSIS_CONDITIONS_FILE")
                .ok()
                .filter(|p| !p.is_empty()),
            body_limit_bytes: get_env(
                "ANALYSIS_BODY_LIMIT_BYTES",
                Some(&DEFAULT_BODY_LIMIT_BYTES.to_string()),
                false,
            )?
            .parse()
            .unwrap_or(DEFAULT_BODY_LIMIT_BYTES),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|e| !e.is_empty()),
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
