mod cli;

use analysis_client::capture::FileSource;
use analysis_client::client::parse_findings;
use analysis_client::normalizer::Normalizer;
use analysis_client::presentation::{decide, render_text};
use analysis_client::{AnalysisFinding, ClientConfig, SubmissionClient, Workflow};
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use service_core::observability::init_cli_tracing;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_cli_tracing(&cli.log_level);

    match cli.command {
        Commands::Analyze { path, overrides } => {
            let config = overrides.apply(ClientConfig::load()?);
            config.validate()?;
            let findings = analyze(&config, &path).await?;
            print_findings(&findings, cli.json)
        }
        Commands::Render { path } => {
            let body = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let findings = match parse_findings(&body) {
                Ok(findings) => findings,
                Err(e) => {
                    tracing::warn!(error = %e, "Saved response is not a finding list, rendering as empty");
                    Vec::new()
                }
            };
            print_findings(&findings, cli.json)
        }
    }
}

async fn analyze(config: &ClientConfig, path: &Path) -> Result<Vec<AnalysisFinding>> {
    let client = SubmissionClient::new(config)?;
    tracing::info!(url = %client.url(), file = %path.display(), "Starting analysis");

    let workflow = Workflow::new(Arc::new(client), Normalizer::from(config));

    let mut source = FileSource::new(path);
    workflow.select_from(&mut source).await?;

    workflow
        .analyze()
        .await
        .map_err(|e| anyhow!(e.user_message()))
}

fn print_findings(findings: &[AnalysisFinding], json: bool) -> Result<()> {
    let view = decide(findings);
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render_text(&view));
    }
    Ok(())
}
