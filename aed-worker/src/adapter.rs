//! Classifier adapter
//!
//! Uniform scoring surface over any [`Classifier`]: applies the optional
//! scaler, then collects label, probabilities and class labels according to
//! the capability set resolved at construction.

use crate::error::PredictionError;
use crate::features::FeatureVector;
use crate::model::{Capabilities, Classifier, Label, Scaler};
use std::sync::Arc;

/// Decimal places kept for probabilities
pub const PROBABILITY_DECIMALS: i32 = 6;
/// Decimal places kept for confidence
pub const CONFIDENCE_DECIMALS: i32 = 4;

/// Raw classifier output for one feature vector
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierResult {
    pub label: Label,
    /// Highest class probability; absent without probability support
    pub confidence: Option<f64>,
    pub probabilities: Option<Vec<f64>>,
    pub classes: Option<Vec<Label>>,
}

#[derive(Debug, Clone)]
pub struct ClassifierAdapter {
    classifier: Arc<dyn Classifier>,
    scaler: Option<Scaler>,
    capabilities: Capabilities,
}

impl ClassifierAdapter {
    pub fn new(classifier: Arc<dyn Classifier>, scaler: Option<Scaler>) -> Self {
        let capabilities = classifier.capabilities();
        Self {
            classifier,
            scaler,
            capabilities,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn has_scaler(&self) -> bool {
        self.scaler.is_some()
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<ClassifierResult, PredictionError> {
        let raw = features.to_f64();
        let row = match &self.scaler {
            Some(scaler) => scaler.transform(&raw)?,
            None => raw,
        };

        let label = self.classifier.predict(&row)?;

        let (confidence, probabilities) = if self.capabilities.probabilities {
            let proba = self.classifier.predict_probabilities(&row)?;
            if proba.is_empty() || proba.iter().any(|p| !p.is_finite()) {
                return Err(PredictionError::NonFiniteScore);
            }
            let peak = proba.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (
                Some(round_to(peak, CONFIDENCE_DECIMALS)),
                Some(
                    proba
                        .iter()
                        .map(|&p| round_to(p, PROBABILITY_DECIMALS))
                        .collect(),
                ),
            )
        } else {
            (None, None)
        };

        let classes = if self.capabilities.class_labels {
            self.classifier.class_labels().map(<[Label]>::to_vec)
        } else {
            None
        };

        Ok(ClassifierResult {
            label,
            confidence,
            probabilities,
            classes,
        })
    }
}

/// Round half away from zero to `digits` decimal places
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}
