//! File on disk → workflow → stubbed service → rendered view.

use analysis_client::capture::FileSource;
use analysis_client::normalizer::Normalizer;
use analysis_client::presentation::{decide, render_text, Severity, View};
use analysis_client::{ClientConfig, ClientError, SubmissionClient, Workflow, WorkflowState};
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Write a PNG to a per-test file under the system temp dir.
fn write_png(name: &str, width: u32, height: u32) -> PathBuf {
    let img = RgbImage::from_pixel(width, height, image::Rgb([210, 170, 150]));
    let mut bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut bytes)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .expect("Failed to encode PNG");

    let path = std::env::temp_dir().join(format!("skin-check-{}-{}.png", name, std::process::id()));
    std::fs::write(&path, bytes).expect("Failed to write PNG");
    path
}

async fn workflow_for(server: &MockServer) -> Workflow {
    let config = ClientConfig {
        base_url: server.uri(),
        timeout_secs: 5,
        ..ClientConfig::default()
    };
    let client = SubmissionClient::new(&config).expect("Failed to build client");
    Workflow::new(Arc::new(client), Normalizer::from(&config))
}

#[tokio::test]
async fn findings_render_with_severity_bands() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "conditionName": "Rosacea", "confidenceScore": 80, "description": "Redness." },
            { "conditionName": "Melasma", "confidenceScore": 60, "description": "Patches." }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let workflow = workflow_for(&server).await;
    let file = write_png("bands", 1600, 1200);

    workflow
        .select_from(&mut FileSource::new(&file))
        .await
        .expect("select failed");
    let WorkflowState::Previewing { image } = workflow.state() else {
        panic!("expected preview");
    };
    assert_eq!(image.dimensions, Some((1024, 768)));

    let findings = workflow.analyze().await.expect("analyze failed");
    let View::Findings { findings: views } = decide(&findings) else {
        panic!("expected findings view");
    };
    assert_eq!(views[0].severity, Severity::High);
    assert_eq!(views[1].severity, Severity::Medium);

    let _ = std::fs::remove_file(file);
}

#[tokio::test]
async fn sentinel_renders_not_suitable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "conditionName": "INVALID_IMAGE", "confidenceScore": 100, "description": "This is a landscape." }
        ])))
        .mount(&server)
        .await;

    let workflow = workflow_for(&server).await;
    let file = write_png("sentinel", 64, 64);
    workflow
        .select_from(&mut FileSource::new(&file))
        .await
        .expect("select failed");

    let findings = workflow.analyze().await.expect("analyze failed");
    let text = render_text(&decide(&findings));

    assert!(text.contains("Image not suitable"));
    assert!(text.contains("This is a landscape."));
    assert!(!text.contains("%)"));

    let _ = std::fs::remove_file(file);
}

#[tokio::test]
async fn malformed_response_renders_no_anomalies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"unexpected":"object"}"#))
        .mount(&server)
        .await;

    let workflow = workflow_for(&server).await;
    let file = write_png("malformed", 32, 32);
    workflow
        .select_from(&mut FileSource::new(&file))
        .await
        .expect("select failed");

    let findings = workflow.analyze().await.expect("malformed body should not fail");
    assert_eq!(decide(&findings), View::NoAnomalies);

    let _ = std::fs::remove_file(file);
}

#[tokio::test]
async fn server_failure_surfaces_single_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({ "error": "rate limited" })),
        )
        .mount(&server)
        .await;

    let workflow = workflow_for(&server).await;
    let file = write_png("failure", 32, 32);
    workflow
        .select_from(&mut FileSource::new(&file))
        .await
        .expect("select failed");

    let err = workflow.analyze().await.unwrap_err();
    assert!(matches!(err, ClientError::Server { status: 429, .. }));

    let WorkflowState::Error { message, .. } = workflow.state() else {
        panic!("expected error state");
    };
    assert_eq!(message, "Failed to analyze image: rate limited");

    let _ = std::fs::remove_file(file);
}
