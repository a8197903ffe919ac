//! Tree classifiers: decision trees, random forests and one-split stumps
//!
//! Trees use flat parallel arrays indexed by node id. A node whose left
//! child is [`LEAF`] is a leaf; its `value` row holds per-class weights.

use super::{argmax, check_width, ensure, Capabilities, Classifier, Label};
use crate::error::PredictionError;
use serde::{Deserialize, Serialize};

/// Child index marking a leaf
pub const LEAF: i64 = -1;

/// Node arrays of one fitted tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeStructure {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<usize>,
    pub threshold: Vec<f64>,
    /// `[n_nodes][n_classes]` class weights
    pub value: Vec<Vec<f64>>,
}

impl TreeStructure {
    fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn is_leaf(&self, node: usize) -> bool {
        self.children_left[node] == LEAF
    }

    pub fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        let nodes = self.node_count();
        ensure(nodes > 0, || "tree has no nodes".to_string())?;
        ensure(
            self.children_right.len() == nodes
                && self.feature.len() == nodes
                && self.threshold.len() == nodes
                && self.value.len() == nodes,
            || format!("node arrays disagree on length (expected {})", nodes),
        )?;

        for node in 0..nodes {
            let left = self.children_left[node];
            let right = self.children_right[node];

            if left == LEAF {
                ensure(right == LEAF, || format!("node {} has only one child", node))?;
                let row = &self.value[node];
                ensure(row.len() == n_classes, || {
                    format!("leaf {} has {} class weights, expected {}", node, row.len(), n_classes)
                })?;
                ensure(row.iter().all(|w| w.is_finite() && *w >= 0.0), || {
                    format!("leaf {} has an invalid class weight", node)
                })?;
                ensure(row.iter().sum::<f64>() > 0.0, || {
                    format!("leaf {} has no class weight", node)
                })?;
                continue;
            }

            // Children always follow their parent, so traversal terminates
            for child in [left, right] {
                ensure(child > node as i64 && (child as usize) < nodes, || {
                    format!("node {} has invalid child {}", node, child)
                })?;
            }
            ensure(self.feature[node] < n_features, || {
                format!(
                    "node {} splits on feature {} of {}",
                    node, self.feature[node], n_features
                )
            })?;
            ensure(!self.threshold[node].is_nan(), || {
                format!("node {} has a NaN threshold", node)
            })?;
        }

        Ok(())
    }

    /// Normalized class distribution at the leaf reached by `features`
    fn leaf_distribution(&self, features: &[f64]) -> Vec<f64> {
        let mut node = 0usize;
        while !self.is_leaf(node) {
            node = if features[self.feature[node]] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }

        let row = &self.value[node];
        let total: f64 = row.iter().sum();
        row.iter().map(|w| w / total).collect()
    }
}

/// Single decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub classes: Vec<Label>,
    pub n_features: usize,
    #[serde(flatten)]
    pub tree: TreeStructure,
}

impl DecisionTree {
    pub fn validate(&self) -> Result<(), String> {
        ensure(self.classes.len() >= 2, || {
            format!("expected at least 2 classes, found {}", self.classes.len())
        })?;
        self.tree.validate(self.n_features, self.classes.len())
    }
}

impl Classifier for DecisionTree {
    fn kind(&self) -> &'static str {
        "decision_tree"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL
    }

    fn predict(&self, features: &[f64]) -> Result<Label, PredictionError> {
        let proba = self.predict_probabilities(features)?;
        Ok(self.classes[argmax(&proba)].clone())
    }

    fn predict_probabilities(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        check_width(self.n_features, features)?;
        Ok(self.tree.leaf_distribution(features))
    }

    fn class_labels(&self) -> Option<&[Label]> {
        Some(&self.classes)
    }
}

/// Forest of trees averaging their leaf distributions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub classes: Vec<Label>,
    pub n_features: usize,
    pub trees: Vec<TreeStructure>,
}

impl RandomForest {
    pub fn validate(&self) -> Result<(), String> {
        ensure(self.classes.len() >= 2, || {
            format!("expected at least 2 classes, found {}", self.classes.len())
        })?;
        ensure(!self.trees.is_empty(), || "forest has no trees".to_string())?;
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.classes.len())
                .map_err(|e| format!("tree {}: {}", idx, e))?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn kind(&self) -> &'static str {
        "random_forest"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL
    }

    fn predict(&self, features: &[f64]) -> Result<Label, PredictionError> {
        let proba = self.predict_probabilities(features)?;
        Ok(self.classes[argmax(&proba)].clone())
    }

    fn predict_probabilities(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        check_width(self.n_features, features)?;

        let mut totals = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (total, p) in totals.iter_mut().zip(tree.leaf_distribution(features)) {
                *total += p;
            }
        }

        let n_trees = self.trees.len() as f64;
        Ok(totals.into_iter().map(|t| t / n_trees).collect())
    }

    fn class_labels(&self) -> Option<&[Label]> {
        Some(&self.classes)
    }
}

/// One threshold on one feature; predicts a label only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionStump {
    pub n_features: usize,
    pub feature: usize,
    pub threshold: f64,
    /// Label when the feature is below the threshold
    pub below: Label,
    pub at_or_above: Label,
}

impl DecisionStump {
    pub fn validate(&self) -> Result<(), String> {
        ensure(self.feature < self.n_features, || {
            format!("split feature {} out of {}", self.feature, self.n_features)
        })?;
        ensure(self.threshold.is_finite(), || "threshold is not finite".to_string())
    }
}

impl Classifier for DecisionStump {
    fn kind(&self) -> &'static str {
        "decision_stump"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PREDICT_ONLY
    }

    fn predict(&self, features: &[f64]) -> Result<Label, PredictionError> {
        check_width(self.n_features, features)?;
        if features[self.feature] < self.threshold {
            Ok(self.below.clone())
        } else {
            Ok(self.at_or_above.clone())
        }
    }
}
