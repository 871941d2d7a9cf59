//! ONNX classifier backed by tract

use crate::classifier::{argmax, Classifier};
use crate::InferenceError;
use std::path::Path;
use tracing::info;
use tract_onnx::prelude::*;

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Classifier exported to ONNX with a single `f32 [1, width]` input.
///
/// Two outputs are read as `(label: i64, probabilities: f32 [1, k])`, the
/// layout skl2onnx produces with zipmap disabled. A single output is the
/// probability tensor and the label is its argmax.
pub struct OnnxClassifier {
    plan: Plan,
    input_width: usize,
}

impl OnnxClassifier {
    /// Load and optimize a model, pinning its input to `[1, input_width]`.
    ///
    /// A model whose graph cannot accept that width fails here rather than
    /// on the first request.
    pub fn load(path: impl AsRef<Path>, input_width: usize) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        info!("Loading ONNX model {} with input width {}", path.display(), input_width);

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact([1, input_width]).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?;

        Ok(Self { plan, input_width })
    }

    fn run(&self, features: &[f64]) -> Result<(i64, Vec<f64>), InferenceError> {
        if features.len() != self.input_width {
            return Err(InferenceError::InvalidInputShape {
                expected: self.input_width,
                actual: features.len(),
            });
        }

        let data: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let input = Tensor::from_shape(&[1, self.input_width], &data).map_err(failed)?;
        let outputs = self.plan.run(tvec!(input.into())).map_err(failed)?;

        let proba_index = if outputs.len() >= 2 { 1 } else { 0 };
        let probabilities: Vec<f64> = outputs[proba_index]
            .cast_to::<f32>()
            .map_err(failed)?
            .as_slice::<f32>()
            .map_err(failed)?
            .iter()
            .map(|&p| p as f64)
            .collect();

        let label = if outputs.len() >= 2 {
            let labels = outputs[0].cast_to::<i64>().map_err(failed)?;
            labels
                .as_slice::<i64>()
                .map_err(failed)?
                .first()
                .copied()
                .ok_or_else(|| InferenceError::InferenceFailed("empty label output".to_string()))?
        } else {
            argmax(&probabilities) as i64
        };

        Ok((label, probabilities))
    }
}

impl Classifier for OnnxClassifier {
    fn input_width(&self) -> usize {
        self.input_width
    }

    fn predict(&self, features: &[f64]) -> Result<i64, InferenceError> {
        self.run(features).map(|(label, _)| label)
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Option<Vec<f64>>, InferenceError> {
        self.run(features).map(|(_, proba)| Some(proba))
    }

    fn supports_probability(&self) -> bool {
        true
    }

    fn classify(&self, features: &[f64]) -> Result<(i64, Option<Vec<f64>>), InferenceError> {
        self.run(features).map(|(label, proba)| (label, Some(proba)))
    }
}

fn failed(e: impl std::fmt::Display) -> InferenceError {
    InferenceError::InferenceFailed(e.to_string())
}
