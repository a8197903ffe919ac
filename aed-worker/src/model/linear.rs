//! Linear classifiers: logistic regression and linear SVM
//!
//! Both share one parameter layout. A single coefficient row encodes a binary
//! problem (positive score selects `classes[1]`); otherwise there is one row
//! per class and the highest score wins.

use super::{argmax, check_width, ensure, Capabilities, Classifier, Label};
use crate::error::PredictionError;
use serde::{Deserialize, Serialize};

/// Shared linear decision function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub classes: Vec<Label>,
    /// `[n_rows][n_features]`, `n_rows` is 1 (binary) or `classes.len()`
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl LinearModel {
    pub fn validate(&self) -> Result<(), String> {
        let n_classes = self.classes.len();
        let n_rows = self.coefficients.len();

        ensure(n_classes >= 2, || {
            format!("expected at least 2 classes, found {}", n_classes)
        })?;
        ensure(n_rows == n_classes || (n_classes == 2 && n_rows == 1), || {
            format!(
                "{} coefficient rows do not fit {} classes",
                n_rows, n_classes
            )
        })?;
        ensure(self.intercepts.len() == n_rows, || {
            format!(
                "{} intercepts for {} coefficient rows",
                self.intercepts.len(),
                n_rows
            )
        })?;

        let width = self.n_features();
        ensure(width > 0, || "coefficient rows are empty".to_string())?;
        for (row_idx, row) in self.coefficients.iter().enumerate() {
            ensure(row.len() == width, || {
                format!("coefficient row {} has {} values, expected {}", row_idx, row.len(), width)
            })?;
            ensure(row.iter().all(|c| c.is_finite()), || {
                format!("coefficient row {} contains a non-finite value", row_idx)
            })?;
        }
        ensure(self.intercepts.iter().all(|b| b.is_finite()), || {
            "intercepts contain a non-finite value".to_string()
        })?;

        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.first().map_or(0, Vec::len)
    }

    fn is_binary(&self) -> bool {
        self.coefficients.len() == 1
    }

    /// Raw scores, one per coefficient row
    pub fn decision_function(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        check_width(self.n_features(), features)?;

        let scores: Vec<f64> = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, intercept)| {
                row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + intercept
            })
            .collect();

        if scores.iter().any(|s| !s.is_finite()) {
            return Err(PredictionError::NonFiniteScore);
        }
        Ok(scores)
    }

    fn predict_index(&self, features: &[f64]) -> Result<usize, PredictionError> {
        let scores = self.decision_function(features)?;
        if self.is_binary() {
            Ok(usize::from(scores[0] > 0.0))
        } else {
            Ok(argmax(&scores))
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let peak = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - peak).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Logistic regression: sigmoid for binary problems, softmax otherwise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogisticRegression {
    pub model: LinearModel,
}

impl Classifier for LogisticRegression {
    fn kind(&self) -> &'static str {
        "logistic_regression"
    }

    fn n_features(&self) -> usize {
        self.model.n_features()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL
    }

    fn predict(&self, features: &[f64]) -> Result<Label, PredictionError> {
        let idx = self.model.predict_index(features)?;
        Ok(self.model.classes[idx].clone())
    }

    fn predict_probabilities(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        let scores = self.model.decision_function(features)?;
        if self.model.is_binary() {
            let positive = sigmoid(scores[0]);
            Ok(vec![1.0 - positive, positive])
        } else {
            Ok(softmax(&scores))
        }
    }

    fn class_labels(&self) -> Option<&[Label]> {
        Some(&self.model.classes)
    }
}

/// Linear support vector machine: labels and classes, no probabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinearSvm {
    pub model: LinearModel,
}

impl Classifier for LinearSvm {
    fn kind(&self) -> &'static str {
        "linear_svm"
    }

    fn n_features(&self) -> usize {
        self.model.n_features()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::WITH_CLASSES
    }

    fn predict(&self, features: &[f64]) -> Result<Label, PredictionError> {
        let idx = self.model.predict_index(features)?;
        Ok(self.model.classes[idx].clone())
    }

    fn class_labels(&self) -> Option<&[Label]> {
        Some(&self.model.classes)
    }
}
