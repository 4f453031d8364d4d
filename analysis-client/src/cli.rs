use analysis_client::ClientConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "skin-check",
    version,
    about = "Analyze a face photo for visible skin conditions"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(long, global = true, default_value = "warn", help = "Log filter used when RUST_LOG is unset")]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Normalize a JPEG or PNG photo and send it to the analysis service.
    Analyze {
        path: PathBuf,
        #[command(flatten)]
        overrides: ClientOverrides,
    },
    /// Render a saved finding list (the JSON array returned by the service).
    Render { path: PathBuf },
}

/// Command-line values that win over `ANALYSIS_CLIENT__*` settings.
#[derive(clap::Args, Debug, Default)]
pub struct ClientOverrides {
    #[arg(long, help = "Analysis service base URL")]
    pub base_url: Option<String>,
    #[arg(long)]
    pub max_width: Option<u32>,
    #[arg(long)]
    pub max_height: Option<u32>,
    #[arg(long, help = "JPEG quality for the uploaded image (1-100)")]
    pub jpeg_quality: Option<u8>,
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl ClientOverrides {
    pub fn apply(self, mut config: ClientConfig) -> ClientConfig {
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(max_width) = self.max_width {
            config.max_width = max_width;
        }
        if let Some(max_height) = self.max_height {
            config.max_height = max_height;
        }
        if let Some(jpeg_quality) = self.jpeg_quality {
            config.jpeg_quality = jpeg_quality;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn overrides_replace_only_given_values() {
        let cli = Cli::parse_from([
            "skin-check",
            "analyze",
            "face.png",
            "--base-url",
            "http://analysis:9000",
            "--max-width",
            "512",
        ]);
        let Commands::Analyze { path, overrides } = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(path, PathBuf::from("face.png"));

        let config = overrides.apply(ClientConfig::default());
        assert_eq!(config.base_url, "http://analysis:9000");
        assert_eq!(config.max_width, 512);
        assert_eq!(config.max_height, 1024);
    }

    #[test]
    fn flag_repairs_an_invalid_environment_setting() {
        std::env::set_var("ANALYSIS_CLIENT__JPEG_QUALITY", "0");
        let loaded = ClientConfig::load();
        std::env::remove_var("ANALYSIS_CLIENT__JPEG_QUALITY");

        let loaded = loaded.unwrap();
        assert_eq!(loaded.jpeg_quality, 0);
        assert!(loaded.validate().is_err());

        let cli = Cli::parse_from(["skin-check", "analyze", "face.png", "--jpeg-quality", "80"]);
        let Commands::Analyze { overrides, .. } = cli.command else {
            panic!("expected analyze");
        };
        let config = overrides.apply(loaded);
        assert_eq!(config.jpeg_quality, 80);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_flag_is_global() {
        let cli = Cli::parse_from(["skin-check", "render", "out.json", "--json"]);
        assert!(cli.json);
    }
}
