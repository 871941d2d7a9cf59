//! Validation Error Types

use thiserror::Error;

/// Errors during feature vector validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Vector width differs from what the classifier was trained on
    #[error("Feature count mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// NaN or infinite entry
    #[error("Invalid feature value {value} at index {index}")]
    InvalidValues { index: usize, value: f64 },

    /// Vector laid out against a different schema
    #[error("Schema mismatch: expected {expected}, got {actual}")]
    SchemaMismatch { expected: String, actual: String },

    /// Malformed scaler parameters
    #[error("Invalid scaler: {0}")]
    InvalidScaler(String),
}
