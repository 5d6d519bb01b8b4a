//! Inference Engine Implementation

use crate::model::{ModelArtifact, Regressor};
use crate::onnx::OnnxRegressor;
use crate::InferenceError;
use feature_engine::FeatureVector;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Prediction result from inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted value (expected charges)
    pub value: f64,
}

/// Result of inference operation
#[derive(Debug, Clone)]
pub struct InferenceResult {
    /// The prediction
    pub prediction: Prediction,
    /// Inference latency in microseconds
    pub latency_us: u64,
}

/// Inference engine holding one loaded model for the process lifetime
pub struct InferenceEngine {
    /// Model path
    model_path: String,
    model: Box<dyn Regressor>,
}

impl InferenceEngine {
    /// Wrap an already-built model
    pub fn new(model: Box<dyn Regressor>) -> Self {
        info!("Creating inference engine with in-memory {} model", model.kind());
        Self {
            model_path: "memory".to_string(),
            model,
        }
    }

    /// Load a model artifact and check it accepts `n_features` columns.
    ///
    /// `.onnx` files go through tract; anything else is read as a JSON
    /// [`ModelArtifact`].
    pub fn load(path: impl AsRef<Path>, n_features: usize) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        info!("Loading model from {}", path.display());

        let is_onnx = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("onnx"));

        let model: Box<dyn Regressor> = if is_onnx {
            Box::new(OnnxRegressor::load(path, n_features)?)
        } else {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                InferenceError::ModelLoadError(format!("{}: {}", path.display(), e))
            })?;
            ModelArtifact::from_json(&raw)?.into_regressor()
        };

        if model.n_features() != n_features {
            return Err(InferenceError::InvalidInputShape {
                expected: format!("[1, {}]", n_features),
                actual: format!("[1, {}]", model.n_features()),
            });
        }

        info!("Model loaded successfully: kind={}, features={}", model.kind(), n_features);
        Ok(Self {
            model_path: path.display().to_string(),
            model,
        })
    }

    /// Run inference on a feature vector
    pub fn predict(&self, features: &FeatureVector) -> Result<InferenceResult, InferenceError> {
        let start = std::time::Instant::now();

        if features.len() != self.model.n_features() {
            return Err(InferenceError::InvalidInputShape {
                expected: format!("[1, {}]", self.model.n_features()),
                actual: format!("[1, {}]", features.len()),
            });
        }

        let value = self.model.predict_row(features.as_slice())?;
        if !value.is_finite() {
            return Err(InferenceError::InferenceFailed(format!(
                "model returned non-finite value {}",
                value
            )));
        }

        let latency_us = start.elapsed().as_micros() as u64;
        debug!("Inference completed in {}us", latency_us);

        Ok(InferenceResult {
            prediction: Prediction { value },
            latency_us,
        })
    }

    /// Model family name
    pub fn model_kind(&self) -> &'static str {
        self.model.kind()
    }

    /// Number of input columns
    pub fn n_features(&self) -> usize {
        self.model.n_features()
    }

    /// Get model path
    pub fn model_path(&self) -> &str {
        &self.model_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinearRegressor;
    use std::io::Write;

    struct Exploding;

    impl Regressor for Exploding {
        fn kind(&self) -> &'static str {
            "exploding"
        }

        fn n_features(&self) -> usize {
            1
        }

        fn predict_row(&self, _row: &[f64]) -> Result<f64, InferenceError> {
            Ok(f64::INFINITY)
        }
    }

    fn vector(values: Vec<f64>) -> FeatureVector {
        FeatureVector { values }
    }

    #[test]
    fn test_linear_prediction() {
        let engine = InferenceEngine::new(Box::new(LinearRegressor::new(vec![100.0, 10.0], 5.0).unwrap()));

        let result = engine.predict(&vector(vec![2.0, 3.0])).unwrap();
        assert_eq!(result.prediction.value, 235.0);
        assert_eq!(engine.model_kind(), "linear");
    }

    #[test]
    fn test_shape_mismatch() {
        let engine = InferenceEngine::new(Box::new(LinearRegressor::new(vec![1.0, 1.0], 0.0).unwrap()));

        let err = engine.predict(&vector(vec![1.0])).unwrap_err();
        assert!(matches!(err, InferenceError::InvalidInputShape { .. }));
    }

    #[test]
    fn test_non_finite_output_rejected() {
        let engine = InferenceEngine::new(Box::new(Exploding));
        let err = engine.predict(&vector(vec![1.0])).unwrap_err();
        assert!(matches!(err, InferenceError::InferenceFailed(_)));
    }

    #[test]
    fn test_load_json_artifact() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"kind": "linear", "weights": [1.0, 2.0, 3.0], "intercept": 0.5}}"#).unwrap();

        let engine = InferenceEngine::load(file.path(), 3).unwrap();
        assert_eq!(engine.n_features(), 3);
        let result = engine.predict(&vector(vec![1.0, 1.0, 1.0])).unwrap();
        assert_eq!(result.prediction.value, 6.5);
    }

    #[test]
    fn test_load_rejects_feature_count_mismatch() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"kind": "linear", "weights": [1.0, 2.0]}}"#).unwrap();

        let err = InferenceEngine::load(file.path(), 11).err().unwrap();
        assert!(matches!(err, InferenceError::InvalidInputShape { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = InferenceEngine::load("/nonexistent/model.json", 3).err().unwrap();
        assert!(matches!(err, InferenceError::ModelLoadError(_)));
    }
}
