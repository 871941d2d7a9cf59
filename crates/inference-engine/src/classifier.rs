//! Classifier Artifacts

use crate::InferenceError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Pre-trained classifier, read-only after load
pub trait Classifier: Send + Sync {
    /// Declared input dimensionality
    fn input_width(&self) -> usize;

    /// Predicted class id
    fn predict(&self, features: &[f64]) -> Result<i64, InferenceError>;

    /// Class probability distribution, `None` when the model has no such capability
    fn predict_proba(&self, _features: &[f64]) -> Result<Option<Vec<f64>>, InferenceError> {
        Ok(None)
    }

    /// Whether `predict_proba` can return a distribution
    fn supports_probability(&self) -> bool {
        false
    }

    /// Label and optional distribution in one call
    fn classify(&self, features: &[f64]) -> Result<(i64, Option<Vec<f64>>), InferenceError> {
        Ok((self.predict(features)?, self.predict_proba(features)?))
    }
}

/// Linear model exported from scikit-learn style parameters.
///
/// One coefficient row is a binary model (positive decision picks
/// `classes[1]`, probability via the logistic function); several rows are
/// one-vs-rest with softmax probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearClassifier {
    /// Weight rows, each `input_width` long
    pub coefficients: Vec<Vec<f64>>,
    /// One intercept per row
    pub intercepts: Vec<f64>,
    /// Class ids
    pub classes: Vec<i64>,
    /// Expose probabilities
    #[serde(default = "default_probability")]
    pub probability: bool,
}

fn default_probability() -> bool {
    true
}

impl LinearClassifier {
    /// Create a classifier, checking parameter shapes
    pub fn new(
        coefficients: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
        classes: Vec<i64>,
        probability: bool,
    ) -> Result<Self, InferenceError> {
        let invalid = |msg: String| Err(InferenceError::ModelLoadError(msg));

        let Some(width) = coefficients.first().map(Vec::len) else {
            return invalid("linear model has no coefficient rows".to_string());
        };
        if width == 0 || coefficients.iter().any(|row| row.len() != width) {
            return invalid("coefficient rows must share a non-zero width".to_string());
        }
        if intercepts.len() != coefficients.len() {
            return invalid(format!(
                "{} intercepts for {} coefficient rows",
                intercepts.len(),
                coefficients.len()
            ));
        }
        let expected_classes = if coefficients.len() == 1 { 2 } else { coefficients.len() };
        if classes.len() != expected_classes {
            return invalid(format!("expected {} classes, got {}", expected_classes, classes.len()));
        }

        Ok(Self {
            coefficients,
            intercepts,
            classes,
            probability,
        })
    }

    /// Load from a JSON artifact
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        let load_err = |e: String| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e));
        let text = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        let raw: LinearClassifier = serde_json::from_str(&text).map_err(|e| load_err(e.to_string()))?;
        let model = Self::new(raw.coefficients, raw.intercepts, raw.classes, raw.probability)?;
        info!(
            "Loaded linear model from {} ({} features, {} classes)",
            path.display(),
            model.input_width(),
            model.classes.len()
        );
        Ok(model)
    }

    fn decision(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        if features.len() != self.input_width() {
            return Err(InferenceError::InvalidInputShape {
                expected: self.input_width(),
                actual: features.len(),
            });
        }
        Ok(self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect())
    }
}

impl Classifier for LinearClassifier {
    fn input_width(&self) -> usize {
        self.coefficients[0].len()
    }

    fn predict(&self, features: &[f64]) -> Result<i64, InferenceError> {
        let scores = self.decision(features)?;
        let idx = if scores.len() == 1 {
            usize::from(scores[0] > 0.0)
        } else {
            argmax(&scores)
        };
        Ok(self.classes[idx])
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Option<Vec<f64>>, InferenceError> {
        if !self.probability {
            return Ok(None);
        }
        let scores = self.decision(features)?;
        if scores.len() == 1 {
            let p = 1.0 / (1.0 + (-scores[0]).exp());
            return Ok(Some(vec![1.0 - p, p]));
        }
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        Ok(Some(exps.iter().map(|e| e / total).collect()))
    }

    fn supports_probability(&self) -> bool {
        self.probability
    }
}

pub(crate) fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
