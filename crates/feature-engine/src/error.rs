//! Extraction Error Types

use thiserror::Error;

/// Errors raised while turning raw samples into a feature vector
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    /// Too few raw samples to extract any feature
    #[error("Insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Too little voiced signal for the acoustic measures
    #[error("Insufficient signal: {0}")]
    InsufficientSignal(String),

    /// Sampling rate puts the analysis band above Nyquist
    #[error("Sampling rate {fs:.2} Hz is too low for the {high_hz} Hz band edge")]
    SamplingRateTooLow { fs: f64, high_hz: f64 },
}
