//! Tree Ensemble Regressor

use crate::model::Regressor;
use crate::InferenceError;
use serde::{Deserialize, Serialize};

/// One node of a regression tree in flat array form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go to `left` when `row[feature] <= threshold`, otherwise `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { value: f64 },
}

/// A regression tree; node 0 is the root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Check structure: non-empty, children point forward and in bounds,
    /// split features in range, all numbers finite.
    ///
    /// Forward-only children make every walk terminate.
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split { feature, threshold, left, right } => {
                    if feature >= n_features {
                        return Err(format!(
                            "node {} splits on feature {} but the model has {} features",
                            idx, feature, n_features
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has a non-finite threshold", idx));
                    }
                    for child in [left, right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {} has invalid child {}", idx, child));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {} has a non-finite value", idx));
                    }
                }
            }
        }
        Ok(())
    }

    fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                TreeNode::Split { feature, threshold, left, right } => {
                    idx = if row[feature] <= threshold { left } else { right };
                }
                TreeNode::Leaf { value } => return value,
            }
        }
    }
}

/// Random-forest style regressor: the mean of its trees' outputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestRegressor {
    pub n_features: usize,
    pub trees: Vec<RegressionTree>,
}

impl ForestRegressor {
    pub fn new(n_features: usize, trees: Vec<RegressionTree>) -> Result<Self, InferenceError> {
        let model = Self { n_features, trees };
        model.validate()?;
        Ok(model)
    }

    pub(crate) fn validate(&self) -> Result<(), InferenceError> {
        if self.n_features == 0 {
            return Err(InferenceError::InvalidArtifact("forest has zero features".into()));
        }
        if self.trees.is_empty() {
            return Err(InferenceError::InvalidArtifact("forest has no trees".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|e| InferenceError::InvalidArtifact(format!("tree {}: {}", i, e)))?;
        }
        Ok(())
    }
}

impl Regressor for ForestRegressor {
    fn kind(&self) -> &'static str {
        "forest"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64, InferenceError> {
        let total: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        Ok(total / self.trees.len() as f64)
    }
}
