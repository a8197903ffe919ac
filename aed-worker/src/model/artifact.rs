//! Artifact documents
//!
//! A model file holds either a bare classifier object or a wrapper:
//!
//! ```json
//! {"model": {"kind": "logistic_regression", ...},
//!  "scaler": {"kind": "standard", ...},
//!  "model_name": "siren-v3"}
//! ```

use super::{
    Classifier, DecisionStump, DecisionTree, KNearestNeighbors, LinearSvm, LogisticRegression,
    RandomForest, Scaler,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Serialized classifier, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierSpec {
    LogisticRegression(LogisticRegression),
    LinearSvm(LinearSvm),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
    KNearestNeighbors(KNearestNeighbors),
    DecisionStump(DecisionStump),
}

impl ClassifierSpec {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ClassifierSpec::LogisticRegression(clf) => clf.model.validate(),
            ClassifierSpec::LinearSvm(clf) => clf.model.validate(),
            ClassifierSpec::DecisionTree(clf) => clf.validate(),
            ClassifierSpec::RandomForest(clf) => clf.validate(),
            ClassifierSpec::KNearestNeighbors(clf) => clf.validate(),
            ClassifierSpec::DecisionStump(clf) => clf.validate(),
        }
    }

    /// Validate, then erase into a shareable classifier
    pub fn build(self) -> Result<Arc<dyn Classifier>, String> {
        self.validate()?;
        let classifier: Arc<dyn Classifier> = match self {
            ClassifierSpec::LogisticRegression(clf) => Arc::new(clf),
            ClassifierSpec::LinearSvm(clf) => Arc::new(clf),
            ClassifierSpec::DecisionTree(clf) => Arc::new(clf),
            ClassifierSpec::RandomForest(clf) => Arc::new(clf),
            ClassifierSpec::KNearestNeighbors(clf) => Arc::new(clf),
            ClassifierSpec::DecisionStump(clf) => Arc::new(clf),
        };
        Ok(classifier)
    }
}

/// Wrapper form bundling classifier, scaler and a display name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrappedArtifact {
    pub model: ClassifierSpec,
    #[serde(default)]
    pub scaler: Option<Scaler>,
    #[serde(default)]
    pub model_name: Option<String>,
}

/// Either artifact shape
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactDocument {
    Wrapped(WrappedArtifact),
    Bare(ClassifierSpec),
}

impl ArtifactDocument {
    /// Parse a document; an object with a `model` key is a wrapper
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        if value.get("model").is_some() {
            Ok(ArtifactDocument::Wrapped(serde_json::from_value(value)?))
        } else {
            Ok(ArtifactDocument::Bare(serde_json::from_value(value)?))
        }
    }
}
