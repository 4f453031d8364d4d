use crate::error::ClientError;
use config::{Config as Cfg, Environment};
use serde::Deserialize;
use std::time::Duration;

/// Settings for the capture → normalize → submit pipeline.
///
/// Loaded from `.env` and `ANALYSIS_CLIENT__*` environment variables
/// (e.g. `ANALYSIS_CLIENT__BASE_URL=http://analysis:8080`).
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_max_dimension")]
    pub max_width: u32,
    #[serde(default = "default_max_dimension")]
    pub max_height: u32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_max_dimension() -> u32 {
    1024
}

fn default_jpeg_quality() -> u8 {
    90
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            max_width: default_max_dimension(),
            max_height: default_max_dimension(),
            jpeg_quality: default_jpeg_quality(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Read `ANALYSIS_CLIENT__*` settings. Call [`ClientConfig::validate`]
    /// once command-line overrides have been applied.
    pub fn load() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(
                Environment::with_prefix("ANALYSIS_CLIENT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Reject settings the normalizer or encoder cannot work with.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(ClientError::Config(
                "max_width and max_height must be at least 1".to_string(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ClientError::Config(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        if self.base_url.trim().is_empty() {
            return Err(ClientError::Config("base_url must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn analyze_url(&self) -> String {
        format!("{}/api/analyze", self.base_url.trim_end_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_normalizer_contract() {
        let config = ClientConfig::default();
        assert_eq!(config.max_width, 1024);
        assert_eq!(config.max_height, 1024);
        assert_eq!(config.jpeg_quality, 90);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn analyze_url_tolerates_trailing_slash() {
        let config = ClientConfig {
            base_url: "http://analysis:8080/".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(config.analyze_url(), "http://analysis:8080/api/analyze");
    }

    #[test]
    fn zero_quality_is_rejected() {
        let config = ClientConfig {
            jpeg_quality: 0,
            ..ClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));
    }
}
