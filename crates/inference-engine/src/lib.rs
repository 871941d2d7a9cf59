//! Classifier Adapter
//!
//! Wraps a pre-trained classifier artifact behind a schema-checked engine:
//! validate, standardize, predict, derive confidence.

mod classifier;
mod engine;
mod onnx;

pub use classifier::{Classifier, LinearClassifier};
pub use engine::{
    InferenceEngine, InferenceResult, ModelConfig, ModelKind, Prediction, FALLBACK_CONFIDENCE,
};
pub use onnx::OnnxClassifier;

use data_validator::ValidationError;
use thiserror::Error;

/// Errors during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
    #[error("{component} width {actual} does not match schema {schema} ({expected} features)")]
    SchemaMismatch {
        schema: String,
        component: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
