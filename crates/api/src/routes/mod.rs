//! API Routes

pub mod drawing;
pub mod health;
pub mod voice;

use crate::error::ApiError;
use inference_engine::Prediction;
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

/// Successful prediction body
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub success: bool,
    pub prediction: i64,
    pub confidence: f64,
}

impl From<Prediction> for PredictionResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            success: true,
            prediction: prediction.label,
            confidence: prediction.confidence,
        }
    }
}

/// Count and log one request outcome
pub(crate) fn record_outcome<T>(pipeline: &'static str, result: &Result<T, ApiError>, started: Instant) {
    let elapsed = started.elapsed();
    let outcome = match result {
        Ok(_) => {
            info!(pipeline, elapsed_ms = elapsed.as_millis() as u64, "Prediction served");
            "success"
        }
        Err(e) => {
            warn!(pipeline, kind = e.kind(), "Prediction failed: {}", e);
            e.kind()
        }
    };

    metrics::counter!("predictions_total", "pipeline" => pipeline, "outcome" => outcome).increment(1);
    metrics::histogram!("prediction_latency_seconds", "pipeline" => pipeline).record(elapsed.as_secs_f64());
}

/// Join a blocking extraction task
pub(crate) async fn run_blocking<T, F>(task: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ApiError::Internal(format!("extraction task failed: {}", e)))?
}
