//! ONNX models via tract

use crate::model::Regressor;
use crate::InferenceError;
use std::path::Path;
use tracing::info;
use tract_onnx::prelude::*;

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Regression model exported to ONNX, e.g. from scikit-learn via skl2onnx.
///
/// The graph takes one `f32 [1, n]` input; the first element of the first
/// output is the prediction.
pub struct OnnxRegressor {
    plan: OnnxPlan,
    n_features: usize,
}

impl OnnxRegressor {
    pub fn load(path: &Path, n_features: usize) -> Result<Self, InferenceError> {
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| {
                model.with_input_fact(
                    0,
                    InferenceFact::dt_shape(f32::datum_type(), tvec!(1, n_features)),
                )
            })
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?;

        info!("Loaded ONNX model from {} ({} inputs)", path.display(), n_features);
        Ok(Self { plan, n_features })
    }
}

impl Regressor for OnnxRegressor {
    fn kind(&self) -> &'static str {
        "onnx"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64, InferenceError> {
        let failed = |e: TractError| InferenceError::InferenceFailed(e.to_string());

        let input: Vec<f32> = row.iter().map(|v| *v as f32).collect();
        let tensor = Tensor::from_shape(&[1, self.n_features], &input).map_err(failed)?;
        let outputs = self.plan.run(tvec!(tensor.into())).map_err(failed)?;

        let first = outputs
            .first()
            .ok_or_else(|| InferenceError::InferenceFailed("model produced no outputs".into()))?;
        let values = first.cast_to::<f32>().map_err(failed)?;
        let view = values.to_array_view::<f32>().map_err(failed)?;

        view.iter()
            .next()
            .map(|v| *v as f64)
            .ok_or_else(|| InferenceError::InferenceFailed("model output is empty".into()))
    }
}
