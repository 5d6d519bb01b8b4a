//! Validation Error Types

use thiserror::Error;

/// Errors during submission validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Value is not a finite number
    #[error("{field} must be a number, got '{value}'")]
    NotANumber { field: &'static str, value: String },

    /// Value has a fractional part where a count is expected
    #[error("{field} must be a whole number, got {value}")]
    NotWhole { field: &'static str, value: f64 },
}

impl ValidationError {
    /// Name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::OutOfRange { field, .. }
            | ValidationError::NotANumber { field, .. }
            | ValidationError::NotWhole { field, .. } => *field,
        }
    }
}
