//! Drawing Prediction Route

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use feature_engine::SamplePoint;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

use super::{record_outcome, run_blocking, PredictionResponse};
use crate::{error::ApiError, AppState};

/// Body of `POST /predict`
#[derive(Debug, Deserialize)]
pub struct DrawingRequest {
    /// One stroke, in capture order
    #[serde(default)]
    pub strokes: Option<Vec<SamplePoint>>,
}

/// Classify one drawing stroke
pub async fn predict_drawing(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DrawingRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let started = Instant::now();
    let result = predict(state, payload).await;
    record_outcome("drawing", &result, started);
    result.map(Json)
}

async fn predict(
    state: Arc<AppState>,
    payload: Result<Json<DrawingRequest>, JsonRejection>,
) -> Result<PredictionResponse, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let strokes = request
        .strokes
        .ok_or_else(|| ApiError::BadRequest("No stroke data provided".to_string()))?;

    let result = run_blocking(move || {
        let features = state.drawing_extractor.extract(&strokes)?;
        Ok(state.drawing_engine.predict(&features)?)
    })
    .await?;

    Ok(result.prediction.into())
}
