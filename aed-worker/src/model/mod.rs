//! Classifier zoo, feature scalers and the Model Provider
//!
//! Artifacts are JSON documents tagged by `kind`. Each classifier declares a
//! [`Capabilities`] set up front: `predict` is mandatory, probability output
//! and class enumeration are optional.

pub mod artifact;
pub mod linear;
pub mod neighbors;
pub mod provider;
pub mod scaler;
pub mod tree;

pub use artifact::ClassifierSpec;
pub use linear::{LinearModel, LinearSvm, LogisticRegression};
pub use neighbors::KNearestNeighbors;
pub use provider::{DirectoryModelProvider, LoadedModel, ModelProvider};
pub use scaler::Scaler;
pub use tree::{DecisionStump, DecisionTree, RandomForest};

use crate::error::PredictionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Class label: integer or string, as stored in the artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Int(i64),
    Text(String),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Int(value) => write!(f, "{}", value),
            Label::Text(value) => write!(f, "{}", value),
        }
    }
}

impl From<i64> for Label {
    fn from(value: i64) -> Self {
        Label::Int(value)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::Text(value.to_string())
    }
}

/// Optional operations a classifier supports beyond `predict`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub probabilities: bool,
    pub class_labels: bool,
}

impl Capabilities {
    pub const PREDICT_ONLY: Self = Self {
        probabilities: false,
        class_labels: false,
    };

    pub const WITH_CLASSES: Self = Self {
        probabilities: false,
        class_labels: true,
    };

    pub const FULL: Self = Self {
        probabilities: true,
        class_labels: true,
    };
}

/// A trained classifier scoring one feature row at a time
pub trait Classifier: fmt::Debug + Send + Sync {
    /// Artifact `kind` tag
    fn kind(&self) -> &'static str;

    /// Number of input features the classifier was trained on
    fn n_features(&self) -> usize;

    fn capabilities(&self) -> Capabilities;

    fn predict(&self, features: &[f64]) -> Result<Label, PredictionError>;

    /// Class distribution, ordered like [`Classifier::class_labels`]
    fn predict_probabilities(&self, _features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        Err(PredictionError::Unsupported("probability output"))
    }

    fn class_labels(&self) -> Option<&[Label]> {
        None
    }
}

/// Reject rows whose width differs from the training width
pub(crate) fn check_width(expected: usize, features: &[f64]) -> Result<(), PredictionError> {
    if features.len() != expected {
        return Err(PredictionError::FeatureCountMismatch {
            expected,
            actual: features.len(),
        });
    }
    Ok(())
}

/// Index of the largest score; the first one wins ties
pub(crate) fn argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for (idx, &score) in scores.iter().enumerate() {
        if score > scores[best] {
            best = idx;
        }
    }
    best
}

/// Validation helper shared by artifact types
pub(crate) fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<(), String> {
    if condition {
        Ok(())
    } else {
        Err(message())
    }
}
