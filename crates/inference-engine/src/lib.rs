//! Regression Inference Engine
//!
//! Loads a trained regression model once and runs single-row predictions
//! on encoded feature vectors. Supports JSON artifacts (linear and tree
//! ensemble) and ONNX graphs through tract.

mod engine;
mod forest;
mod model;
mod onnx;

pub use engine::{InferenceEngine, InferenceResult, Prediction};
pub use forest::{ForestRegressor, RegressionTree, TreeNode};
pub use model::{LinearRegressor, ModelArtifact, Regressor};
pub use onnx::OnnxRegressor;

use thiserror::Error;

/// Errors during model loading or inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },
}
