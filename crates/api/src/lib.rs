//! NeuroPlay Prediction Server
//!
//! HTTP surface for the drawing and voice screening pipelines. Engines are
//! loaded once at startup and shared read-only across handlers.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use feature_engine::{DrawingExtractor, SchemaId, VoiceConfig, VoiceExtractor};
use inference_engine::{InferenceEngine, InferenceError};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub mod audio;
pub mod config;
pub mod error;
mod routes;

pub use config::ServerConfig;
pub use error::ApiError;

/// Application state shared across handlers
pub struct AppState {
    pub drawing_extractor: DrawingExtractor,
    pub drawing_engine: InferenceEngine,
    pub voice_extractor: VoiceExtractor,
    pub voice_engine: InferenceEngine,
    /// Rendered by `/metrics` when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Request body cap (bytes)
    pub max_upload_bytes: usize,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(drawing_engine: InferenceEngine, voice_engine: InferenceEngine, voice: VoiceConfig) -> Self {
        Self {
            drawing_extractor: DrawingExtractor::new(),
            drawing_engine,
            voice_extractor: VoiceExtractor::new(voice),
            voice_engine,
            metrics: None,
            max_upload_bytes: ServerConfig::default().max_upload_bytes,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    /// Load both engines from their configured artifacts
    pub fn from_config(config: &ServerConfig) -> Result<Self, InferenceError> {
        let drawing = InferenceEngine::from_config(SchemaId::Drawing, &config.drawing_model)?;
        let voice = InferenceEngine::from_config(SchemaId::Voice, &config.voice_model)?;

        let mut state = Self::new(drawing, voice, config.voice.clone());
        state.max_upload_bytes = config.max_upload_bytes;
        Ok(state)
    }

    /// Attach a Prometheus handle for `/metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/predict", post(routes::drawing::predict_drawing))
        .route("/voice-predict", post(routes::voice::predict_voice))
        .route("/health", get(routes::health::health))
        .route("/metrics", get(routes::health::metrics))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Initialize logging; `RUST_LOG` takes precedence over `level`
pub fn init_logging(level: &str, json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!(e))
}

/// Run the server
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    use anyhow::Context;

    let mut state = AppState::from_config(&config).context("failed to load models")?;
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => warn!("Metrics recorder unavailable: {}", e),
    }

    let app = create_router(Arc::new(state));

    info!("Starting API server on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
