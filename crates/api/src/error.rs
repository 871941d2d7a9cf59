//! API Errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use data_validator::ValidationError;
use feature_engine::ExtractionError;
use inference_engine::InferenceError;
use serde_json::json;
use thiserror::Error;

/// Request failure, rendered as `{"success": false, "error": msg}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("{0}")]
    UpstreamIo(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Short machine-readable category, used for logs and metrics labels
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Extraction(e) => match e {
                ExtractionError::InsufficientData { .. } => "insufficient_data",
                ExtractionError::InsufficientSignal(_) => "insufficient_signal",
                ExtractionError::SamplingRateTooLow { .. } => "sampling_rate_too_low",
            },
            ApiError::Inference(InferenceError::Validation(e)) => match e {
                ValidationError::DimensionMismatch { .. } => "dimension_mismatch",
                ValidationError::InvalidValues { .. } => "invalid_values",
                ValidationError::SchemaMismatch { .. } | ValidationError::InvalidScaler(_) => {
                    "schema_mismatch"
                }
            },
            ApiError::Inference(_) | ApiError::Internal(_) => "internal_error",
            ApiError::UpstreamIo(_) => "upstream_io_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_)
            | ApiError::Extraction(_)
            | ApiError::UpstreamIo(_)
            | ApiError::Inference(InferenceError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Inference(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}
