//! Submission to prediction pipeline: validate, encode, infer.

use crate::error::ApiError;
use data_validator::Validator;
use feature_engine::{FeatureEncoder, Submission};
use inference_engine::InferenceEngine;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Handling of fields that did not reach the feature vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissPolicy {
    /// Predict anyway, log at debug level only
    Ignore,
    /// Predict anyway, log a warning and tell the caller which fields were dropped
    #[default]
    Warn,
    /// Refuse to predict
    Reject,
}

/// A served prediction
#[derive(Debug, Clone)]
pub struct PredictionOutcome {
    pub value: f64,
    /// Fields left at zero; empty unless the policy is `warn`
    pub ignored: Vec<&'static str>,
}

impl PredictionOutcome {
    /// Text shown on the result page
    pub fn bill_text(&self) -> String {
        format!("Expected Bill will be ${:.2}", self.value)
    }
}

/// Everything needed to turn a submission into a prediction
pub struct Predictor {
    validator: Validator,
    encoder: FeatureEncoder,
    engine: InferenceEngine,
    policy: MissPolicy,
    served: AtomicU64,
    refused: AtomicU64,
}

impl Predictor {
    pub fn new(
        validator: Validator,
        encoder: FeatureEncoder,
        engine: InferenceEngine,
        policy: MissPolicy,
    ) -> Self {
        info!(
            "Predictor ready: {} model, {} columns, miss policy {:?}",
            engine.model_kind(),
            encoder.dimension(),
            policy
        );
        Self {
            validator,
            encoder,
            engine,
            policy,
            served: AtomicU64::new(0),
            refused: AtomicU64::new(0),
        }
    }

    /// Validate, encode and run one submission
    pub fn predict(&self, submission: &Submission) -> Result<PredictionOutcome, ApiError> {
        let outcome = self.run(submission);

        match &outcome {
            Ok(_) => {
                self.served.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("predictions_total", "outcome" => "served").increment(1);
            }
            Err(e) => {
                self.refused.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("predictions_total", "outcome" => "refused").increment(1);
                debug!("Prediction refused: {}", e);
            }
        }
        outcome
    }

    fn run(&self, submission: &Submission) -> Result<PredictionOutcome, ApiError> {
        let validation = self.validator.validate_submission(submission);
        if !validation.valid {
            return Err(ApiError::InvalidInput(validation.message()));
        }

        let (vector, report) = self.encoder.encode(submission)?;
        let missed = report.missed_fields();

        let ignored = match self.policy {
            _ if missed.is_empty() => Vec::new(),
            MissPolicy::Ignore => {
                debug!("Ignoring unmatched fields: {:?}", missed);
                Vec::new()
            }
            MissPolicy::Warn => {
                warn!("Predicting with unmatched fields left at zero: {:?}", missed);
                missed
            }
            MissPolicy::Reject => return Err(ApiError::IncompleteSubmission(missed)),
        };

        let result = self.engine.predict(&vector)?;
        metrics::histogram!("prediction_latency_seconds").record(result.latency_us as f64 / 1_000_000.0);
        debug!(
            "Predicted {:.2} in {}us ({} of {} fields used)",
            result.prediction.value,
            result.latency_us,
            report.found_count(),
            report.outcomes.len()
        );

        Ok(PredictionOutcome {
            value: result.prediction.value,
            ignored,
        })
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    pub fn policy(&self) -> MissPolicy {
        self.policy
    }

    /// Predictions served since startup
    pub fn served_count(&self) -> u64 {
        self.served.load(Ordering::Relaxed)
    }

    /// Submissions refused since startup
    pub fn refused_count(&self) -> u64 {
        self.refused.load(Ordering::Relaxed)
    }
}
