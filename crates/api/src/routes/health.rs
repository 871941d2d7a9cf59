//! Health and Metrics Routes

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use inference_engine::InferenceEngine;
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub models: ModelsHealth,
}

/// Loaded classifiers
#[derive(Debug, Serialize)]
pub struct ModelsHealth {
    pub drawing: ModelHealth,
    pub voice: ModelHealth,
}

/// One loaded classifier
#[derive(Debug, Serialize)]
pub struct ModelHealth {
    pub schema: String,
    pub input_width: usize,
    pub has_probability: bool,
}

impl From<&InferenceEngine> for ModelHealth {
    fn from(engine: &InferenceEngine) -> Self {
        Self {
            schema: engine.schema().schema().id(),
            input_width: engine.input_width(),
            has_probability: engine.supports_probability(),
        }
    }
}

/// Health check handler
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        models: ModelsHealth {
            drawing: (&state.drawing_engine).into(),
            voice: (&state.voice_engine).into(),
        },
    })
}

/// Prometheus exposition
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}
