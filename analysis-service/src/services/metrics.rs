//! Prometheus metrics for analysis-service.
//!
//! Provides HTTP and analysis-specific metrics for observability.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{Once, OnceLock};
use std::time::Instant;

static INIT: Once = Once::new();

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// HTTP metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Analysis metrics
pub static ANALYSIS_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static ANALYSIS_FINDINGS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static ANALYSIS_TOKENS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static ANALYSIS_PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static ANALYSIS_PROVIDER_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Safe to call more than once; later calls are no-ops.
pub fn init_metrics() {
    INIT.call_once(register_metrics);
}

fn register_metrics() {
    let registry = Registry::new();

    let http_requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("Failed to create http_requests_total metric");

    let http_request_duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["method", "path"],
    )
    .expect("Failed to create http_request_duration_seconds metric");

    // outcome: findings, no_findings, invalid_image, malformed, error
    let analysis_requests = IntCounterVec::new(
        Opts::new("analysis_requests_total", "Total face analysis requests"),
        &["model", "outcome"],
    )
    .expect("Failed to create analysis_requests_total metric");

    let analysis_findings = IntCounterVec::new(
        Opts::new(
            "analysis_findings_total",
            "Findings returned to clients, by condition",
        ),
        &["condition"],
    )
    .expect("Failed to create analysis_findings_total metric");

    let analysis_tokens = IntCounterVec::new(
        Opts::new("analysis_tokens_total", "Total model tokens processed"),
        &["model", "type"], // type: input, output
    )
    .expect("Failed to create analysis_tokens_total metric");

    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "analysis_provider_latency_seconds",
            "Vision provider round-trip latency in seconds",
        )
        .buckets(vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0]),
        &["model"],
    )
    .expect("Failed to create analysis_provider_latency_seconds metric");

    let provider_errors = IntCounterVec::new(
        Opts::new(
            "analysis_provider_errors_total",
            "Total vision provider errors",
        ),
        &["model", "error_type"],
    )
    .expect("Failed to create analysis_provider_errors_total metric");

    registry
        .register(Box::new(http_requests_total.clone()))
        .expect("Failed to register http_requests_total");
    registry
        .register(Box::new(http_request_duration.clone()))
        .expect("Failed to register http_request_duration_seconds");
    registry
        .register(Box::new(analysis_requests.clone()))
        .expect("Failed to register analysis_requests_total");
    registry
        .register(Box::new(analysis_findings.clone()))
        .expect("Failed to register analysis_findings_total");
    registry
        .register(Box::new(analysis_tokens.clone()))
        .expect("Failed to register analysis_tokens_total");
    registry
        .register(Box::new(provider_latency.clone()))
        .expect("Failed to register analysis_provider_latency_seconds");
    registry
        .register(Box::new(provider_errors.clone()))
        .expect("Failed to register analysis_provider_errors_total");

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(http_requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(http_request_duration);
    let _ = ANALYSIS_REQUESTS_TOTAL.set(analysis_requests);
    let _ = ANALYSIS_FINDINGS_TOTAL.set(analysis_findings);
    let _ = ANALYSIS_TOKENS_TOTAL.set(analysis_tokens);
    let _ = ANALYSIS_PROVIDER_LATENCY_SECONDS.set(provider_latency);
    let _ = ANALYSIS_PROVIDER_ERRORS_TOTAL.set(provider_errors);
}

/// Render all metrics in the Prometheus text format.
pub fn get_metrics() -> Result<String, prometheus::Error> {
    let Some(registry) = REGISTRY.get() else {
        return Ok(String::new());
    };

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

// ============================================================================
// Recording helpers
// ============================================================================

pub fn record_analysis(model: &str, outcome: &str) {
    if let Some(counter) = ANALYSIS_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[model, outcome]).inc();
    }
}

/// Label for condition names outside the configured list.
pub const OTHER_CONDITION_LABEL: &str = "other";

pub fn record_finding(condition: &str) {
    if let Some(counter) = ANALYSIS_FINDINGS_TOTAL.get() {
        counter.with_label_values(&[condition]).inc();
    }
}

pub fn record_tokens(model: &str, input_tokens: i32, output_tokens: i32) {
    if let Some(counter) = ANALYSIS_TOKENS_TOTAL.get() {
        counter
            .with_label_values(&[model, "input"])
            .inc_by(input_tokens.max(0) as u64);
        counter
            .with_label_values(&[model, "output"])
            .inc_by(output_tokens.max(0) as u64);
    }
}

pub fn record_provider_latency(model: &str, seconds: f64) {
    if let Some(histogram) = ANALYSIS_PROVIDER_LATENCY_SECONDS.get() {
        histogram.with_label_values(&[model]).observe(seconds);
    }
}

pub fn record_provider_error(model: &str, error_type: &str) {
    if let Some(counter) = ANALYSIS_PROVIDER_ERRORS_TOTAL.get() {
        counter.with_label_values(&[model, error_type]).inc();
    }
}

/// Per-request HTTP counters, labelled by route template rather than raw URI.
pub async fn http_metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();

    if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[&method, &path, &status]).inc();
    }
    if let Some(histogram) = HTTP_REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[&method, &path])
            .observe(start.elapsed().as_secs_f64());
    }

    response
}
