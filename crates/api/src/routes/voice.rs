//! Voice Prediction Route

use axum::extract::{multipart::MultipartRejection, Multipart, State};
use axum::Json;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use super::{record_outcome, run_blocking, PredictionResponse};
use crate::{audio, error::ApiError, AppState};

/// Multipart field carrying the recording
pub const UPLOAD_FIELD: &str = "file";

/// Classify one uploaded voice recording
pub async fn predict_voice(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let started = Instant::now();
    let result = predict(state, multipart).await;
    record_outcome("voice", &result, started);
    result.map(Json)
}

async fn predict(
    state: Arc<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<PredictionResponse, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field.bytes().await.map_err(|e| ApiError::BadRequest(e.body_text()))?;
            upload = Some(bytes);
            break;
        }
    }
    let bytes = upload.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
    }

    let result = run_blocking(move || {
        // Removed on drop, whichever way this closure exits
        let file = audio::spool_upload(&bytes)?;
        let waveform = audio::decode_wav(file.path())?;
        debug!("Analyzing {:.2}s of audio", waveform.duration_secs());

        let features = state.voice_extractor.extract(&waveform)?;
        Ok(state.voice_engine.predict(&features)?)
    })
    .await?;

    Ok(result.prediction.into())
}
