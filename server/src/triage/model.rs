//! Pretrained classifiers behind a common trait.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::vitals::FEATURE_COUNT;
use super::{TriageError, TriageLabel};

const LABEL_COUNT: usize = TriageLabel::MODEL_ORDER.len();

/// A model mapping the normalized feature vector to one score per label,
/// in `TriageLabel::MODEL_ORDER`.
pub trait TriageModel: Send + Sync {
    fn name(&self) -> &str;

    fn predict(&self, features: &[f32; FEATURE_COUNT]) -> Result<Vec<f32>, TriageError>;
}

/// Load a model, choosing the backend from the file extension.
pub fn load_model(path: &str, input_name: &str) -> Result<Box<dyn TriageModel>, TriageError> {
    let path_ref = Path::new(path);
    if !path_ref.exists() {
        return Err(TriageError::ModelNotFound(path.to_string()));
    }

    match path_ref.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(Box::new(LinearModel::load(path_ref)?)),
        #[cfg(feature = "onnx")]
        Some("onnx") => Ok(Box::new(onnx::OnnxModel::load(path_ref, input_name)?)),
        #[cfg(not(feature = "onnx"))]
        Some("onnx") => {
            let _ = input_name;
            Err(TriageError::UnsupportedFormat(
                "ONNX support not compiled in (build with --features onnx)".to_string(),
            ))
        }
        other => Err(TriageError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

/// Multinomial logistic regression exported as JSON:
/// `{"weights": [[f32; 8]; 4], "bias": [f32; 4]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    #[serde(default = "default_linear_name")]
    pub name: String,
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

fn default_linear_name() -> String {
    "linear".to_string()
}

impl LinearModel {
    pub fn new(weights: Vec<Vec<f32>>, bias: Vec<f32>) -> Result<Self, TriageError> {
        let model = Self {
            name: default_linear_name(),
            weights,
            bias,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn from_json(json: &str) -> Result<Self, TriageError> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: &Path) -> Result<Self, TriageError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), TriageError> {
        if self.weights.len() != LABEL_COUNT || self.bias.len() != LABEL_COUNT {
            return Err(TriageError::InvalidModel(format!(
                "expected {} output rows, got {} weight rows and {} biases",
                LABEL_COUNT,
                self.weights.len(),
                self.bias.len()
            )));
        }
        if let Some(row) = self.weights.iter().find(|r| r.len() != FEATURE_COUNT) {
            return Err(TriageError::InvalidModel(format!(
                "weight row has {} columns, expected {}",
                row.len(),
                FEATURE_COUNT
            )));
        }
        Ok(())
    }
}

impl TriageModel for LinearModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &[f32; FEATURE_COUNT]) -> Result<Vec<f32>, TriageError> {
        let logits: Vec<f32> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(features).map(|(w, x)| w * x).sum::<f32>() + b)
            .collect();

        // softmax, shifted by the max logit
        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f32 = exps.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(TriageError::Inference("degenerate softmax".to_string()));
        }
        Ok(exps.into_iter().map(|e| e / total).collect())
    }
}

#[cfg(feature = "onnx")]
mod onnx {
    use std::path::Path;
    use std::sync::Mutex;

    use ort::session::{builder::GraphOptimizationLevel, Session};
    use ort::value::Tensor;

    use super::{TriageModel, LABEL_COUNT};
    use crate::triage::vitals::FEATURE_COUNT;
    use crate::triage::TriageError;

    fn ort_error(e: ort::Error) -> TriageError {
        TriageError::Inference(e.to_string())
    }

    /// ONNX classifier (e.g. a scikit-learn export). The first f32 output
    /// with one value per label is taken as the score vector.
    pub struct OnnxModel {
        name: String,
        input_name: String,
        session: Mutex<Session>,
    }

    impl OnnxModel {
        pub fn load(path: &Path, input_name: &str) -> Result<Self, TriageError> {
            let session = Session::builder()
                .map_err(ort_error)?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(ort_error)?
                .commit_from_file(path)
                .map_err(|e| TriageError::InvalidModel(e.to_string()))?;

            Ok(Self {
                name: path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("onnx")
                    .to_string(),
                input_name: input_name.to_string(),
                session: Mutex::new(session),
            })
        }
    }

    impl TriageModel for OnnxModel {
        fn name(&self) -> &str {
            &self.name
        }

        fn predict(&self, features: &[f32; FEATURE_COUNT]) -> Result<Vec<f32>, TriageError> {
            let input = Tensor::from_array(([1usize, FEATURE_COUNT], features.to_vec()))
                .map_err(ort_error)?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| TriageError::Inference("session lock poisoned".to_string()))?;
            let outputs = session
                .run(ort::inputs![self.input_name.as_str() => input])
                .map_err(ort_error)?;

            for (_, value) in outputs.iter() {
                if let Ok((_shape, scores)) = value.try_extract_tensor::<f32>() {
                    if scores.len() == LABEL_COUNT {
                        return Ok(scores.to_vec());
                    }
                }
            }
            Err(TriageError::Inference(
                "no output with one score per label".to_string(),
            ))
        }
    }
}
