//! Feature Vector Assembly

use crate::index_map::FeatureIndexMap;
use crate::submission::{Field, FieldKind, Submission};
use crate::FeatureError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Feature vector for single-row model inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Column values, one per entry of the index map
    pub values: Vec<f64>,
}

impl FeatureVector {
    /// All-zero vector with `len` columns
    pub fn zeros(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// Why a field did not reach the vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "key", rename_all = "snake_case")]
pub enum Miss {
    /// Submission has no value for the field
    FieldAbsent,
    /// The column key built from the field is not in the index map
    UnknownKey(String),
}

/// Outcome of encoding one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FieldOutcome {
    Found { key: String, index: usize },
    NotFound { miss: Miss },
}

impl FieldOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, FieldOutcome::Found { .. })
    }
}

/// Per-field outcomes of one encoding, in encoding order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub outcomes: Vec<(Field, FieldOutcome)>,
}

impl BuildReport {
    /// Number of vector positions that were assigned
    pub fn found_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_found()).count()
    }

    /// True when every field reached the vector
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|(_, o)| o.is_found())
    }

    /// Fields that were left at zero
    pub fn missed(&self) -> impl Iterator<Item = (Field, &Miss)> {
        self.outcomes.iter().filter_map(|(field, outcome)| match outcome {
            FieldOutcome::NotFound { miss } => Some((*field, miss)),
            FieldOutcome::Found { .. } => None,
        })
    }

    /// Names of the fields that were left at zero
    pub fn missed_fields(&self) -> Vec<&'static str> {
        self.missed().map(|(field, _)| field.as_str()).collect()
    }
}

/// Encodes submissions against a fixed feature index map
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    index: FeatureIndexMap,
}

impl FeatureEncoder {
    pub fn new(index: FeatureIndexMap) -> Self {
        Self { index }
    }

    /// The column layout this encoder writes into
    pub fn index(&self) -> &FeatureIndexMap {
        &self.index
    }

    /// Number of columns in every produced vector
    pub fn dimension(&self) -> usize {
        self.index.len()
    }

    /// Encode a submission.
    ///
    /// Numeric values that do not parse as finite numbers fail the whole
    /// encoding. Lookup misses leave their position at zero and are
    /// reported, never raised.
    pub fn encode(&self, submission: &Submission) -> Result<(FeatureVector, BuildReport), FeatureError> {
        let mut vector = FeatureVector::zeros(self.index.len());
        let mut report = BuildReport::default();

        for field in Field::ALL {
            let outcome = self.encode_field(field, submission, &mut vector.values)?;
            if let FieldOutcome::NotFound { miss } = &outcome {
                debug!("Field {} not encoded: {:?}", field.as_str(), miss);
            }
            report.outcomes.push((field, outcome));
        }

        debug!(
            "Encoded submission: {}/{} fields found, {} columns",
            report.found_count(),
            Field::ALL.len(),
            vector.len()
        );

        Ok((vector, report))
    }

    fn encode_field(
        &self,
        field: Field,
        submission: &Submission,
        values: &mut [f64],
    ) -> Result<FieldOutcome, FeatureError> {
        let Some(raw) = submission.get(field) else {
            return Ok(FieldOutcome::NotFound { miss: Miss::FieldAbsent });
        };

        let value = match field.kind() {
            FieldKind::Numeric => parse_number(field, raw)?,
            FieldKind::Categorical => 1.0,
        };

        let key = field.column_key(raw);
        match self.index.get(&key) {
            Some(index) => {
                values[index] = value;
                Ok(FieldOutcome::Found { key, index })
            }
            None => Ok(FieldOutcome::NotFound { miss: Miss::UnknownKey(key) }),
        }
    }
}

/// Parse a raw field value as a finite number, ignoring surrounding whitespace
pub fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_number(field: Field, raw: &str) -> Result<f64, FeatureError> {
    parse_finite(raw).ok_or_else(|| FeatureError::InvalidNumber {
        field: field.as_str(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insurance_map() -> FeatureIndexMap {
        [
            "age",
            "bmi",
            "children",
            "sex_female",
            "sex_male",
            "smoker_no",
            "smoker_yes",
            "region_northeast",
            "region_northwest",
            "region_southeast",
            "region_southwest",
        ]
        .into_iter()
        .collect()
    }

    fn full_submission() -> Submission {
        Submission::new()
            .with("age", "30")
            .with("sex", "male")
            .with("bmi", "25.0")
            .with("children", "0")
            .with("smoker", "no")
            .with("region", "southeast")
    }

    #[test]
    fn test_reference_submission() {
        let map = insurance_map();
        let encoder = FeatureEncoder::new(map.clone());

        let (vector, report) = encoder.encode(&full_submission()).unwrap();

        assert_eq!(vector.len(), map.len());
        let at = |name: &str| vector.values[map.get(name).unwrap()];
        assert_eq!(at("age"), 30.0);
        assert_eq!(at("sex_male"), 1.0);
        assert_eq!(at("bmi"), 25.0);
        assert_eq!(at("children"), 0.0);
        assert_eq!(at("smoker_no"), 1.0);
        assert_eq!(at("region_southeast"), 1.0);

        let nonzero = vector.values.iter().filter(|v| **v != 0.0).count();
        assert_eq!(nonzero, 5);
        assert!(report.is_complete());
        assert_eq!(report.found_count(), 6);
    }

    #[test]
    fn test_unseen_category_is_reported() {
        let encoder = FeatureEncoder::new(insurance_map());
        let submission = full_submission().with("sex", "unknown");

        let (vector, report) = encoder.encode(&submission).unwrap();

        assert_eq!(vector.len(), 11);
        assert_eq!(vector.values[3], 0.0);
        assert_eq!(vector.values[4], 0.0);
        assert_eq!(report.missed_fields(), vec!["sex"]);
        let (_, miss) = report.missed().next().unwrap();
        assert_eq!(miss, &Miss::UnknownKey("sex_unknown".to_string()));
    }

    #[test]
    fn test_empty_submission_is_all_zero() {
        let encoder = FeatureEncoder::new(insurance_map());
        let (vector, report) = encoder.encode(&Submission::new()).unwrap();

        assert!(vector.values.iter().all(|v| *v == 0.0));
        assert_eq!(report.found_count(), 0);
        assert!(report.missed().all(|(_, miss)| *miss == Miss::FieldAbsent));
    }

    #[test]
    fn test_numeric_column_missing_from_map() {
        let map: FeatureIndexMap = ["bmi", "sex_male"].into_iter().collect();
        let encoder = FeatureEncoder::new(map);

        let (vector, report) = encoder.encode(&full_submission()).unwrap();
        assert_eq!(vector.values, vec![25.0, 1.0]);
        assert_eq!(report.found_count(), 2);
        assert_eq!(report.missed_fields(), vec!["age", "children", "smoker", "region"]);
    }

    #[test]
    fn test_invalid_number_fails() {
        let encoder = FeatureEncoder::new(insurance_map());
        let submission = full_submission().with("bmi", "heavy");

        let err = encoder.encode(&submission).unwrap_err();
        assert!(matches!(err, FeatureError::InvalidNumber { field: "bmi", .. }));
    }

    #[test]
    fn test_non_finite_number_fails() {
        let encoder = FeatureEncoder::new(insurance_map());
        for raw in ["NaN", "inf", "-infinity"] {
            let submission = Submission::new().with("age", raw);
            assert!(encoder.encode(&submission).is_err(), "{} should be rejected", raw);
        }
    }

    #[test]
    fn test_encoding_twice_gives_equal_vectors() {
        let encoder = FeatureEncoder::new(insurance_map());
        let submission = Submission::new().with("age", "30").with("sex", "male");

        let (first, first_report) = encoder.encode(&submission).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let (second, second_report) = encoder.encode(&submission).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_report, second_report);
    }

    #[test]
    fn test_parse_finite() {
        assert_eq!(parse_finite(" 27.9 "), Some(27.9));
        assert_eq!(parse_finite("1e2"), Some(100.0));
        assert_eq!(parse_finite("NaN"), None);
        assert_eq!(parse_finite("inf"), None);
        assert_eq!(parse_finite(""), None);
        assert_eq!(parse_finite("12 kg"), None);
    }

    #[test]
    fn test_whitespace_around_numbers() {
        let encoder = FeatureEncoder::new(insurance_map());
        let (vector, _) = encoder.encode(&Submission::new().with("age", " 42 ")).unwrap();
        assert_eq!(vector.values[0], 42.0);
    }
}
