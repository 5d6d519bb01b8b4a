//! Submission Validator for Range Checking

use crate::error::ValidationError;
use feature_engine::{parse_finite, Field, Submission};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Age valid range (years)
    pub age_range: (f64, f64),
    /// BMI valid range (kg/m²)
    pub bmi_range: (f64, f64),
    /// Number of dependents valid range
    pub children_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            age_range: (0.0, 120.0),
            bmi_range: (10.0, 100.0),
            children_range: (0.0, 20.0),
        }
    }
}

/// Result of validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether all values are valid
    pub valid: bool,
    /// List of validation errors
    pub errors: Vec<ValidationError>,
    /// Number of fields validated
    pub fields_checked: usize,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid(fields_checked: usize) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            fields_checked,
        }
    }

    /// Create an invalid result with errors
    pub fn invalid(errors: Vec<ValidationError>, fields_checked: usize) -> Self {
        Self {
            valid: false,
            errors,
            fields_checked,
        }
    }

    /// Human-readable summary of all errors, joined with `; `
    pub fn message(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validator for the numeric fields of a submission
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Parse a raw value as a finite number
    pub fn parse(&self, field: &'static str, raw: &str) -> Result<f64, ValidationError> {
        parse_finite(raw).ok_or_else(|| ValidationError::NotANumber {
            field,
            value: raw.to_string(),
        })
    }

    /// Validate age
    pub fn validate_age(&self, age: f64) -> Result<(), ValidationError> {
        self.validate_range("age", age, self.config.age_range)
    }

    /// Validate BMI
    pub fn validate_bmi(&self, bmi: f64) -> Result<(), ValidationError> {
        self.validate_range("bmi", bmi, self.config.bmi_range)
    }

    /// Validate number of children
    pub fn validate_children(&self, children: f64) -> Result<(), ValidationError> {
        if children.fract() != 0.0 {
            return Err(ValidationError::NotWhole {
                field: "children",
                value: children,
            });
        }
        self.validate_range("children", children, self.config.children_range)
    }

    /// Validate every numeric field present in a submission.
    ///
    /// Absent fields are skipped; categorical fields are left to the encoder.
    pub fn validate_submission(&self, submission: &Submission) -> ValidationResult {
        let mut errors = Vec::new();
        let mut checked = 0;

        for field in [Field::Age, Field::Bmi, Field::Children] {
            let Some(raw) = submission.get(field) else {
                continue;
            };
            checked += 1;

            let outcome = self.parse(field.as_str(), raw).and_then(|value| match field {
                Field::Age => self.validate_age(value),
                Field::Bmi => self.validate_bmi(value),
                _ => self.validate_children(value),
            });

            if let Err(e) = outcome {
                debug!("Validation failed: {}", e);
                errors.push(e);
            }
        }

        if errors.is_empty() {
            ValidationResult::valid(checked)
        } else {
            ValidationResult::invalid(errors, checked)
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_age() {
        let validator = Validator::default();
        assert!(validator.validate_age(0.0).is_ok());
        assert!(validator.validate_age(45.0).is_ok());
        assert!(validator.validate_age(120.0).is_ok());
    }

    #[test]
    fn test_invalid_age() {
        let validator = Validator::default();
        assert!(validator.validate_age(-1.0).is_err());
        assert!(validator.validate_age(150.0).is_err());
    }

    #[test]
    fn test_children_must_be_whole() {
        let validator = Validator::default();
        assert!(validator.validate_children(2.0).is_ok());
        assert_eq!(
            validator.validate_children(1.5),
            Err(ValidationError::NotWhole { field: "children", value: 1.5 })
        );
        assert!(validator.validate_children(21.0).is_err());
    }

    #[test]
    fn test_parse_rejects_non_numbers() {
        let validator = Validator::default();
        assert_eq!(validator.parse("bmi", " 27.9 "), Ok(27.9));
        assert!(validator.parse("bmi", "twenty").is_err());
        assert!(validator.parse("bmi", "NaN").is_err());
    }

    #[test]
    fn test_parse_agrees_with_encoder() {
        let validator = Validator::default();
        let encoder = feature_engine::FeatureEncoder::new(["bmi"].into_iter().collect());

        for raw in [" 27.9 ", "1e1", "-0", "twenty", "NaN", "inf", "27,9", "0x10"] {
            let submission = Submission::new().with("bmi", raw);
            assert_eq!(
                validator.parse("bmi", raw).is_ok(),
                encoder.encode(&submission).is_ok(),
                "validator and encoder disagree on {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_submission_valid() {
        let validator = Validator::default();
        let submission = Submission::new()
            .with("age", "30")
            .with("bmi", "25.0")
            .with("children", "0")
            .with("sex", "male");

        let result = validator.validate_submission(&submission);
        assert!(result.valid);
        assert_eq!(result.fields_checked, 3);
    }

    #[test]
    fn test_submission_collects_all_errors() {
        let validator = Validator::default();
        let submission = Submission::new()
            .with("age", "abc")
            .with("bmi", "500")
            .with("children", "2");

        let result = validator.validate_submission(&submission);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].field(), "age");
        assert_eq!(result.errors[1].field(), "bmi");
        assert!(result.message().contains("; "));
    }

    #[test]
    fn test_absent_fields_skipped() {
        let validator = Validator::default();
        let result = validator.validate_submission(&Submission::new().with("region", "southeast"));
        assert!(result.valid);
        assert_eq!(result.fields_checked, 0);
    }

    #[test]
    fn test_custom_ranges() {
        let validator = Validator::new(ValidationConfig {
            age_range: (18.0, 64.0),
            ..Default::default()
        });
        assert!(validator.validate_age(17.0).is_err());
        assert!(validator.validate_age(64.0).is_ok());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn in_range_ages_pass(age in 0u32..=120) {
                let validator = Validator::default();
                let submission = Submission::new().with("age", age.to_string());
                prop_assert!(validator.validate_submission(&submission).valid);
            }

            #[test]
            fn out_of_range_bmi_fails(bmi in 100.01f64..1.0e6) {
                let validator = Validator::default();
                let submission = Submission::new().with("bmi", bmi.to_string());
                prop_assert!(!validator.validate_submission(&submission).valid);
            }
        }
    }
}
