//! Application startup and lifecycle management.

use crate::config::{AnalysisConfig, ProviderKind};
use crate::handlers::{
    analyze::{analyze_face, method_not_allowed},
    health::{health_check, readiness_check},
    metrics::metrics,
};
use crate::services::metrics::{http_metrics_middleware, init_metrics};
use crate::services::providers::gemini::{GeminiConfig, GeminiVisionProvider};
use crate::services::providers::mock::MockVisionProvider;
use crate::services::providers::VisionProvider;
use crate::services::{Analyzer, ConditionCatalog};
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    make_request_span, request_id_middleware, security_headers_middleware,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

impl AppState {
    pub fn new(analyzer: Arc<Analyzer>) -> Self {
        Self { analyzer }
    }
}

/// Instantiate the vision provider selected by configuration.
pub fn build_provider(config: &AnalysisConfig) -> Result<Arc<dyn VisionProvider>, AppError> {
    match config.provider.kind {
        ProviderKind::Gemini => {
            let provider = GeminiVisionProvider::new(GeminiConfig::from(&config.provider))
                .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;
            tracing::info!(model = %config.provider.model, "Initialized Gemini vision provider");
            Ok(Arc::new(provider))
        }
        ProviderKind::Mock => {
            tracing::warn!("Using mock vision provider, responses are canned");
            Ok(Arc::new(MockVisionProvider::new()))
        }
    }
}

/// Build the HTTP router with all middleware.
pub fn build_router(state: AppState, body_limit_bytes: usize) -> Router {
    init_metrics();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .route(
            "/api/analyze",
            post(analyze_face).fallback(method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(from_fn(http_metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: AnalysisConfig) -> Result<Self, AppError> {
        let provider = build_provider(&config)?;
        Self::build_with_provider(config, provider).await
    }

    /// Build with an explicit provider (tests inject mocks here).
    pub async fn build_with_provider(
        config: AnalysisConfig,
        provider: Arc<dyn VisionProvider>,
    ) -> Result<Self, AppError> {
        let catalog = ConditionCatalog::load(config.conditions_file.as_deref())?;
        tracing::info!(
            conditions = catalog.names().len(),
            "Loaded condition list"
        );

        let analyzer = Arc::new(Analyzer::new(provider, catalog));
        let router = build_router(AppState::new(analyzer), config.body_limit_bytes);

        // Bind HTTP listener (port 0 = random port for testing)
        let address = config.common.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Analysis service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}
