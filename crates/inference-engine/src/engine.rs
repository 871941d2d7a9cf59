//! Inference Engine Implementation

use crate::classifier::{Classifier, LinearClassifier};
use crate::onnx::OnnxClassifier;
use crate::InferenceError;
use data_validator::{StandardScaler, Validator};
use feature_engine::{FeatureVector, SchemaId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Confidence reported when the classifier has no probability capability
pub const FALLBACK_CONFIDENCE: f64 = 1.0;

/// Artifact format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// JSON linear model
    #[default]
    Linear,
    /// ONNX graph run by tract
    Onnx,
}

/// Where one pipeline's classifier artifact lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Artifact format
    #[serde(default)]
    pub kind: ModelKind,
    /// Artifact path
    pub path: PathBuf,
    /// Optional fitted scaler (JSON)
    #[serde(default)]
    pub scaler_path: Option<PathBuf>,
}

/// Prediction result from inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted class id
    pub label: i64,
    /// Confidence score (0.0 to 1.0)
    pub confidence: f64,
    /// Class probabilities, when the classifier provides them
    pub probabilities: Option<Vec<f64>>,
}

/// Result of inference operation
#[derive(Debug, Clone)]
pub struct InferenceResult {
    /// The prediction
    pub prediction: Prediction,
    /// Inference latency in milliseconds
    pub latency_ms: u64,
}

/// Classifier adapter for one feature schema.
///
/// Built once at startup and shared read-only; construction fails when the
/// classifier or scaler width disagrees with the schema.
pub struct InferenceEngine {
    /// Schema the classifier was trained against
    schema: SchemaId,
    /// Pre-trained model
    classifier: Box<dyn Classifier>,
    /// Standardization applied after validation
    scaler: Option<StandardScaler>,
    /// Shape and finiteness gate
    validator: Validator,
}

impl InferenceEngine {
    /// Create a new inference engine
    pub fn new(
        schema: SchemaId,
        classifier: Box<dyn Classifier>,
        scaler: Option<StandardScaler>,
    ) -> Result<Self, InferenceError> {
        let definition = schema.schema();
        let width = classifier.input_width();
        if width != definition.len() {
            return Err(InferenceError::SchemaMismatch {
                schema: definition.id(),
                component: "classifier",
                expected: definition.len(),
                actual: width,
            });
        }
        if let Some(scaler) = &scaler {
            if scaler.width() != definition.len() {
                return Err(InferenceError::SchemaMismatch {
                    schema: definition.id(),
                    component: "scaler",
                    expected: definition.len(),
                    actual: scaler.width(),
                });
            }
        }

        info!(
            "Creating inference engine for {} (width={}, probability={}, scaler={})",
            definition.id(),
            width,
            classifier.supports_probability(),
            scaler.is_some()
        );

        Ok(Self {
            schema,
            classifier,
            scaler,
            validator: Validator::new(schema, width),
        })
    }

    /// Load the artifacts named by a model config
    pub fn from_config(schema: SchemaId, config: &ModelConfig) -> Result<Self, InferenceError> {
        let width = schema.schema().len();
        let classifier: Box<dyn Classifier> = match config.kind {
            ModelKind::Linear => Box::new(LinearClassifier::from_json_file(&config.path)?),
            ModelKind::Onnx => Box::new(OnnxClassifier::load(&config.path, width)?),
        };
        let scaler = config
            .scaler_path
            .as_ref()
            .map(StandardScaler::from_json_file)
            .transpose()?;
        Self::new(schema, classifier, scaler)
    }

    /// Run inference on a feature vector
    pub fn predict(&self, features: &FeatureVector) -> Result<InferenceResult, InferenceError> {
        let start = std::time::Instant::now();

        self.validator.validate(features)?;
        debug!(schema = ?self.schema, features = ?features.named(), "Feature vector");

        let input = match &self.scaler {
            Some(scaler) => scaler.transform(&features.values)?,
            None => features.values.clone(),
        };

        let (label, probabilities) = self.classifier.classify(&input)?;
        let confidence = probabilities
            .as_ref()
            .and_then(|p| p.iter().cloned().reduce(f64::max))
            .unwrap_or(FALLBACK_CONFIDENCE);

        let latency_ms = start.elapsed().as_millis() as u64;
        debug!(
            "Prediction: label={} confidence={:.3} probabilities={:?} ({}ms)",
            label, confidence, probabilities, latency_ms
        );

        Ok(InferenceResult {
            prediction: Prediction {
                label,
                confidence,
                probabilities,
            },
            latency_ms,
        })
    }

    /// Schema this engine accepts
    pub fn schema(&self) -> SchemaId {
        self.schema
    }

    /// Declared classifier input width
    pub fn input_width(&self) -> usize {
        self.validator.expected_width()
    }

    /// Whether confidence comes from a probability distribution
    pub fn supports_probability(&self) -> bool {
        self.classifier.supports_probability()
    }
}
