//! Pretrained GBDT classifier: tree storage, validation, and inference
//!
//! Trees are stored in index-array form (node 0 is the root). Traversal
//! follows the fitted convention: `feature <= threshold` goes left. Each node
//! carries its training-sample cover so the attributor can reconstruct the
//! background distribution exactly.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Model artifact errors
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A decision tree node (internal or leaf)
///
/// For internal nodes:
/// - `feature >= 0`: index into the feature vector
/// - `left` and `right` point to child node indices
///
/// For leaf nodes:
/// - `feature == -1`
/// - `value` holds the leaf's raw-score contribution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Left child index (-1 for leaf nodes)
    pub left: i32,

    /// Right child index (-1 for leaf nodes)
    pub right: i32,

    /// Feature index to split on (-1 for leaf nodes)
    pub feature: i32,

    /// Threshold value for the split (unused for leaves)
    pub threshold: f64,

    /// Leaf value in raw log-odds space (unused for internal nodes)
    pub value: f64,

    /// Number of training samples that passed through this node
    pub cover: f64,
}

impl Node {
    /// Create a new internal (split) node
    pub fn internal(feature: i32, threshold: f64, left: i32, right: i32, cover: f64) -> Self {
        Self {
            left,
            right,
            feature,
            threshold,
            value: 0.0,
            cover,
        }
    }

    /// Create a new leaf node
    pub fn leaf(value: f64, cover: f64) -> Self {
        Self {
            left: -1,
            right: -1,
            feature: -1,
            threshold: 0.0,
            value,
            cover,
        }
    }

    /// Check if this node is a leaf
    pub fn is_leaf(&self) -> bool {
        self.feature < 0
    }
}

/// A single decision tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    /// Tree nodes (node 0 is the root)
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Evaluate this tree on a feature vector, returning the leaf value
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                return node.value;
            }
            let feature_value = features[node.feature as usize];
            // Fitted convention: equal goes left
            idx = if feature_value <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
        }
    }

    /// Cover-weighted expected leaf value of this tree
    ///
    /// This is the tree's mean output over the training distribution and
    /// forms the attribution baseline.
    pub fn expected_value(&self) -> f64 {
        let root_cover = self.nodes[0].cover;
        if root_cover <= 0.0 {
            return 0.0;
        }
        self.nodes
            .iter()
            .filter(|n| n.is_leaf())
            .map(|n| n.value * n.cover / root_cover)
            .sum()
    }

    /// Validate tree structure
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if node.cover <= 0.0 {
                return Err(format!("Node {} has non-positive cover: {}", i, node.cover));
            }
            if node.is_leaf() {
                continue;
            }
            if node.left < 0 || node.left as usize >= self.nodes.len() {
                return Err(format!("Node {} has invalid left child: {}", i, node.left));
            }
            if node.right < 0 || node.right as usize >= self.nodes.len() {
                return Err(format!("Node {} has invalid right child: {}", i, node.right));
            }
        }

        Ok(())
    }
}

/// GBDT binary classifier with a fixed, ordered feature contract
///
/// `predict_raw` sums leaf values over all trees plus `base_score`;
/// `predict_proba` maps the raw score through the logistic sigmoid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GbdtModel {
    /// Model format version (always 1 for now)
    pub version: i32,

    /// Training objective; only binary logistic is supported
    pub objective: String,

    /// Raw-score offset added to the tree sum
    pub base_score: f64,

    /// Feature names in the exact order the trees index them
    pub feature_names: Vec<String>,

    /// Decision trees in the ensemble
    pub trees: Vec<Tree>,
}

impl GbdtModel {
    pub fn new(feature_names: Vec<String>, trees: Vec<Tree>, base_score: f64) -> Self {
        Self {
            version: 1,
            objective: "binary_logistic".to_string(),
            base_score,
            feature_names,
            trees,
        }
    }

    /// Number of input features the trees expect
    pub fn num_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Number of trees in the ensemble
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Validate model structure
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.version != 1 {
            return Err(ModelError::ValidationFailed(format!(
                "Unsupported model version: {}",
                self.version
            )));
        }

        if self.objective != "binary_logistic" {
            return Err(ModelError::ValidationFailed(format!(
                "Unsupported objective: {}",
                self.objective
            )));
        }

        if self.feature_names.is_empty() {
            return Err(ModelError::ValidationFailed(
                "Model has no feature names".to_string(),
            ));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| {
                ModelError::ValidationFailed(format!("Tree {} validation failed: {}", i, e))
            })?;

            // Split feature indices must stay inside the feature contract
            for node in &tree.nodes {
                if !node.is_leaf() && node.feature as usize >= self.feature_names.len() {
                    return Err(ModelError::ValidationFailed(format!(
                        "Tree {} splits on feature index {} but the model has {} features",
                        i,
                        node.feature,
                        self.feature_names.len()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Raw log-odds score for one feature vector
    pub fn predict_raw(&self, features: &[f64]) -> f64 {
        let tree_sum: f64 = self.trees.iter().map(|t| t.evaluate(features)).sum();
        self.base_score + tree_sum
    }

    /// Churn probability for one feature vector, always in [0, 1]
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        sigmoid(self.predict_raw(features))
    }

    /// Cover-weighted expected raw score over the training distribution
    pub fn expected_raw(&self) -> f64 {
        let tree_sum: f64 = self.trees.iter().map(|t| t.expected_value()).sum();
        self.base_score + tree_sum
    }

    /// Load and validate a model from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let json = fs::read_to_string(path)?;
        let model: GbdtModel = serde_json::from_str(&json)?;
        model.validate()?;
        Ok(model)
    }

    /// Save the model to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Logistic sigmoid
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_model() -> GbdtModel {
        // Tree 1: split on feature 0 at 0.5
        let tree1 = Tree::new(vec![
            Node::internal(0, 0.5, 1, 2, 10.0),
            Node::leaf(-1.0, 6.0),
            Node::leaf(2.0, 4.0),
        ]);

        // Tree 2: split on feature 1 at 0.0
        let tree2 = Tree::new(vec![
            Node::internal(1, 0.0, 1, 2, 10.0),
            Node::leaf(0.5, 5.0),
            Node::leaf(-0.5, 5.0),
        ]);

        GbdtModel::new(vec!["f0".to_string(), "f1".to_string()], vec![tree1, tree2], 0.1)
    }

    #[test]
    fn test_tree_evaluation() {
        let model = create_test_model();

        // feature 0 = 0.2 (left, -1.0), feature 1 = 1.0 (right, -0.5)
        let raw = model.predict_raw(&[0.2, 1.0]);
        assert!((raw - (0.1 - 1.0 - 0.5)).abs() < 1e-12);

        // Equal goes left
        let raw = model.predict_raw(&[0.5, 0.0]);
        assert!((raw - (0.1 - 1.0 + 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_probability_in_unit_interval() {
        let model = create_test_model();
        for x in [-100.0, -1.0, 0.0, 1.0, 100.0] {
            let p = model.predict_proba(&[x, x]);
            assert!((0.0..=1.0).contains(&p), "probability {} out of range", p);
        }
    }

    #[test]
    fn test_deterministic_inference() {
        let model = create_test_model();
        let features = vec![0.3, -0.7];

        let p1 = model.predict_proba(&features);
        let p2 = model.predict_proba(&features);
        assert_eq!(p1.to_bits(), p2.to_bits());
    }

    #[test]
    fn test_expected_value_is_cover_weighted_leaf_mean() {
        let model = create_test_model();

        // Tree 1: (-1.0 * 6 + 2.0 * 4) / 10 = 0.2
        assert!((model.trees[0].expected_value() - 0.2).abs() < 1e-12);
        // Tree 2: (0.5 * 5 - 0.5 * 5) / 10 = 0.0
        assert!((model.trees[1].expected_value() - 0.0).abs() < 1e-12);
        // Model: 0.1 + 0.2 + 0.0
        assert!((model.expected_raw() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_model_validation() {
        let valid = create_test_model();
        assert!(valid.validate().is_ok());

        // Child index out of bounds
        let invalid = GbdtModel::new(
            vec!["f0".to_string()],
            vec![Tree::new(vec![
                Node::internal(0, 0.5, 5, 2, 10.0),
                Node::leaf(1.0, 5.0),
                Node::leaf(2.0, 5.0),
            ])],
            0.0,
        );
        assert!(invalid.validate().is_err());

        // Split feature outside the feature contract
        let invalid = GbdtModel::new(
            vec!["f0".to_string()],
            vec![Tree::new(vec![
                Node::internal(3, 0.5, 1, 2, 10.0),
                Node::leaf(1.0, 5.0),
                Node::leaf(2.0, 5.0),
            ])],
            0.0,
        );
        assert!(invalid.validate().is_err());

        // Unsupported objective
        let mut invalid = create_test_model();
        invalid.objective = "regression".to_string();
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_save_load_json() {
        use tempfile::NamedTempFile;

        let model = create_test_model();
        let temp_file = NamedTempFile::new().unwrap();

        model.save_json(temp_file.path()).unwrap();
        let loaded = GbdtModel::load_json(temp_file.path()).unwrap();

        assert_eq!(model, loaded);
    }
}
