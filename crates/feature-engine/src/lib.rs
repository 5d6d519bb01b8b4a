//! Feature Encoding Engine
//!
//! Maps loosely-typed form submissions onto the fixed column layout a
//! pre-trained regression model expects.

mod features;
mod index_map;
mod submission;

pub use features::{parse_finite, BuildReport, FeatureEncoder, FeatureVector, FieldOutcome, Miss};
pub use index_map::FeatureIndexMap;
pub use submission::{Field, FieldKind, Submission};

use thiserror::Error;

/// Errors raised while loading the index map or encoding a submission
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Failed to read feature index map {path}: {reason}")]
    IndexMapRead { path: String, reason: String },
    #[error("Invalid feature index map: {0}")]
    InvalidIndexMap(String),
    #[error("Field '{field}' is not a valid number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("Field '{0}' must be a scalar value")]
    NonScalarValue(String),
}
