//! Model Artifacts

use crate::forest::ForestRegressor;
use crate::InferenceError;
use serde::{Deserialize, Serialize};

/// A trained single-output regression model
pub trait Regressor: Send + Sync {
    /// Short model family name, e.g. `linear`
    fn kind(&self) -> &'static str;

    /// Number of input columns the model expects
    fn n_features(&self) -> usize;

    /// Predict one row. Callers guarantee `row.len() == n_features()`.
    fn predict_row(&self, row: &[f64]) -> Result<f64, InferenceError>;
}

/// Ordinary linear model: `intercept + Σ weights[i] * row[i]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub weights: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

impl LinearRegressor {
    pub fn new(weights: Vec<f64>, intercept: f64) -> Result<Self, InferenceError> {
        let model = Self { weights, intercept };
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), InferenceError> {
        if self.weights.is_empty() {
            return Err(InferenceError::InvalidArtifact("linear model has no weights".into()));
        }
        if !self.intercept.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(InferenceError::InvalidArtifact(
                "linear model has non-finite coefficients".into(),
            ));
        }
        Ok(())
    }
}

impl Regressor for LinearRegressor {
    fn kind(&self) -> &'static str {
        "linear"
    }

    fn n_features(&self) -> usize {
        self.weights.len()
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64, InferenceError> {
        let dot: f64 = self.weights.iter().zip(row).map(|(w, x)| w * x).sum();
        Ok(self.intercept + dot)
    }
}

/// JSON model artifact, tagged by `kind`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearRegressor),
    Forest(ForestRegressor),
}

impl ModelArtifact {
    /// Parse and validate an artifact from JSON text
    pub fn from_json(raw: &str) -> Result<Self, InferenceError> {
        let artifact: ModelArtifact = serde_json::from_str(raw)
            .map_err(|e| InferenceError::ModelLoadError(format!("invalid model JSON: {}", e)))?;

        match &artifact {
            ModelArtifact::Linear(model) => model.validate()?,
            ModelArtifact::Forest(model) => model.validate()?,
        }
        Ok(artifact)
    }

    pub fn into_regressor(self) -> Box<dyn Regressor> {
        match self {
            ModelArtifact::Linear(model) => Box::new(model),
            ModelArtifact::Forest(model) => Box::new(model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_prediction() {
        let model = LinearRegressor::new(vec![2.0, -1.0, 0.5], 10.0).unwrap();
        let value = model.predict_row(&[3.0, 4.0, 8.0]).unwrap();
        assert!((value - 16.0).abs() < 1e-12);
        assert_eq!(model.n_features(), 3);
    }

    #[test]
    fn test_linear_rejects_bad_coefficients() {
        assert!(LinearRegressor::new(vec![], 1.0).is_err());
        assert!(LinearRegressor::new(vec![1.0, f64::NAN], 1.0).is_err());
    }

    #[test]
    fn test_artifact_linear_json() {
        let artifact = ModelArtifact::from_json(r#"{"kind": "linear", "weights": [1.5, 2.5]}"#).unwrap();
        let model = artifact.into_regressor();

        assert_eq!(model.kind(), "linear");
        assert_eq!(model.predict_row(&[2.0, 2.0]).unwrap(), 8.0);
    }

    #[test]
    fn test_artifact_unknown_kind() {
        let err = ModelArtifact::from_json(r#"{"kind": "svm", "weights": [1.0]}"#).unwrap_err();
        assert!(matches!(err, InferenceError::ModelLoadError(_)));
    }

    #[test]
    fn test_artifact_validation_runs() {
        let err = ModelArtifact::from_json(r#"{"kind": "linear", "weights": []}"#).unwrap_err();
        assert!(matches!(err, InferenceError::InvalidArtifact(_)));
    }
}
