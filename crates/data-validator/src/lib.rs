//! Submission Validation
//!
//! Explicit parsing and range checking for the numeric fields of a
//! submission, run before feature encoding.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{Validator, ValidationConfig, ValidationResult};
