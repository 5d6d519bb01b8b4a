//! Form Submissions

use crate::FeatureError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a field reaches the feature vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Value is written as a number at the column named after the field
    Numeric,
    /// Value selects a one-hot column named `<field>_<value>`
    Categorical,
}

/// Input fields understood by the encoder, in encoding order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Age,
    Sex,
    Bmi,
    Children,
    Smoker,
    Region,
}

impl Field {
    /// All fields in the order they are encoded
    pub const ALL: [Field; 6] = [
        Field::Age,
        Field::Sex,
        Field::Bmi,
        Field::Children,
        Field::Smoker,
        Field::Region,
    ];

    /// Form field name
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Age => "age",
            Field::Sex => "sex",
            Field::Bmi => "bmi",
            Field::Children => "children",
            Field::Smoker => "smoker",
            Field::Region => "region",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Age | Field::Bmi | Field::Children => FieldKind::Numeric,
            Field::Sex | Field::Smoker | Field::Region => FieldKind::Categorical,
        }
    }

    /// Column name this field maps to for the given raw value
    pub fn column_key(&self, value: &str) -> String {
        match self.kind() {
            FieldKind::Numeric => self.as_str().to_string(),
            FieldKind::Categorical => format!("{}_{}", self.as_str(), value),
        }
    }
}

/// One user submission: form field name to raw string value.
///
/// Empty values are dropped on insert, so a blank form input behaves
/// like a missing field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>")]
pub struct Submission {
    fields: BTreeMap<String, String>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, ignoring empty values
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.fields.insert(name.into(), value);
        }
    }

    /// Builder-style [`Submission::insert`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Raw value of a field
    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(field.as_str()).map(String::as_str)
    }

    /// Number of non-empty fields the encoder will consider
    pub fn supplied(&self) -> usize {
        Field::ALL.iter().filter(|f| self.get(**f).is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a submission from a JSON object.
    ///
    /// Strings are taken as-is, numbers and booleans by their textual form,
    /// `null` is treated as absent. Arrays and objects are rejected.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, FeatureError> {
        let object = value
            .as_object()
            .ok_or_else(|| FeatureError::NonScalarValue("<body>".to_string()))?;

        let mut submission = Self::new();
        for (name, value) in object {
            match value {
                serde_json::Value::Null => {}
                serde_json::Value::String(s) => submission.insert(name.as_str(), s.as_str()),
                serde_json::Value::Number(n) => submission.insert(name.as_str(), n.to_string()),
                serde_json::Value::Bool(b) => submission.insert(name.as_str(), b.to_string()),
                _ => return Err(FeatureError::NonScalarValue(name.clone())),
            }
        }
        Ok(submission)
    }
}

impl From<BTreeMap<String, String>> for Submission {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Submission {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut submission = Self::new();
        for (name, value) in iter {
            submission.insert(name, value);
        }
        submission
    }
}
