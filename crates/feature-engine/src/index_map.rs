//! Feature Index Map

use crate::FeatureError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Column layout of the model input: feature name to zero-based position.
///
/// Indices always form a permutation of `0..len`, so a vector of `len`
/// zeros has exactly one slot per feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HashMap<String, usize>", into = "HashMap<String, usize>")]
pub struct FeatureIndexMap {
    columns: HashMap<String, usize>,
}

impl FeatureIndexMap {
    /// Build a map, checking that the indices cover `0..len` exactly once
    pub fn new(columns: HashMap<String, usize>) -> Result<Self, FeatureError> {
        let len = columns.len();
        let mut seen = vec![false; len];

        for (name, &index) in &columns {
            if index >= len {
                return Err(FeatureError::InvalidIndexMap(format!(
                    "column '{}' has index {} but the map only has {} entries",
                    name, index, len
                )));
            }
            if seen[index] {
                return Err(FeatureError::InvalidIndexMap(format!(
                    "index {} is assigned to more than one column",
                    index
                )));
            }
            seen[index] = true;
        }

        Ok(Self { columns })
    }

    /// Load a map from a JSON object file (`{"age": 0, "bmi": 1, ...}`)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FeatureError> {
        let path = path.as_ref();
        let read_err = |reason: String| FeatureError::IndexMapRead {
            path: path.display().to_string(),
            reason,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| read_err(e.to_string()))?;
        let columns: HashMap<String, usize> =
            serde_json::from_str(&raw).map_err(|e| read_err(e.to_string()))?;
        let map = Self::new(columns)?;

        info!("Loaded feature index map from {} ({} columns)", path.display(), map.len());
        Ok(map)
    }

    /// Position of a column, if the model knows it
    pub fn get(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in index order
    pub fn names(&self) -> Vec<&str> {
        let mut ordered: Vec<(&str, usize)> = self
            .columns
            .iter()
            .map(|(name, &index)| (name.as_str(), index))
            .collect();
        ordered.sort_by_key(|&(_, index)| index);
        ordered.into_iter().map(|(name, _)| name).collect()
    }
}

impl TryFrom<HashMap<String, usize>> for FeatureIndexMap {
    type Error = FeatureError;

    fn try_from(columns: HashMap<String, usize>) -> Result<Self, Self::Error> {
        Self::new(columns)
    }
}

impl From<FeatureIndexMap> for HashMap<String, usize> {
    fn from(map: FeatureIndexMap) -> Self {
        map.columns
    }
}

impl<'a> FromIterator<&'a str> for FeatureIndexMap {
    /// Assigns positions in iteration order. Repeated names keep their first position.
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut columns = HashMap::new();
        for name in iter {
            let next = columns.len();
            columns.entry(name.to_string()).or_insert(next);
        }
        Self { columns }
    }
}
