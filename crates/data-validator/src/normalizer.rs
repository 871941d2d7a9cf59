//! Feature Standardization
//!
//! Per-feature z-scoring with parameters fitted offline alongside the
//! classifier. Mirrors scikit-learn's `StandardScaler` artifact: a zero or
//! non-finite scale leaves the centered feature unscaled.

use crate::error::ValidationError;
use crate::validator::validate_vector;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Fitted standard scaler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Per-feature mean
    pub mean: Vec<f64>,
    /// Per-feature standard deviation
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Create a scaler from fitted parameters
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ValidationError> {
        if mean.len() != scale.len() {
            return Err(ValidationError::InvalidScaler(format!(
                "mean has {} entries but scale has {}",
                mean.len(),
                scale.len()
            )));
        }
        if mean.iter().any(|m| !m.is_finite()) {
            return Err(ValidationError::InvalidScaler("non-finite mean".to_string()));
        }
        Ok(Self { mean, scale })
    }

    /// Load scaler parameters from a JSON file (`{"mean": [...], "scale": [...]}`)
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ValidationError::InvalidScaler(format!("{}: {}", path.display(), e)))?;
        let raw: StandardScaler = serde_json::from_str(&text)
            .map_err(|e| ValidationError::InvalidScaler(format!("{}: {}", path.display(), e)))?;
        let scaler = Self::new(raw.mean, raw.scale)?;
        info!("Loaded scaler for {} features from {}", scaler.width(), path.display());
        Ok(scaler)
    }

    /// Number of features
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// Standardize a vector
    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>, ValidationError> {
        validate_vector(values, self.width())?;
        Ok(values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| {
                let s = if *s == 0.0 || !s.is_finite() { 1.0 } else { *s };
                (v - m) / s
            })
            .collect())
    }
}
