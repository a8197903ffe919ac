//! Decision engine
//!
//! Combines the classifier output with the loudness gate. The classifier
//! always runs first; a quiet clip then has its label forced to class 0.

use crate::adapter::{round_to, ClassifierResult};
use crate::loudness::LoudnessMetrics;
use crate::model::Label;
use serde::Serialize;

/// Decimal places kept for the loudness metrics
pub const LOUDNESS_DECIMALS: i32 = 6;

/// Final per-request verdict, serialized into the response message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionResult {
    #[serde(rename = "prediction")]
    pub label: Label,
    pub confidence: Option<f64>,
    pub probabilities: Option<Vec<f64>>,
    pub classes: Option<Vec<Label>>,
    pub num_features: usize,
    pub rms_energy: f64,
    pub max_amplitude: f64,
    #[serde(rename = "was_overridden")]
    pub overridden: bool,
    /// Label the classifier chose before a loudness override
    pub original_prediction: Option<Label>,
}

impl DecisionResult {
    /// Compact JSON text carried in the response record's `message`
    pub fn to_message(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Apply the loudness override to a classifier result
pub fn decide(
    result: ClassifierResult,
    loudness: &LoudnessMetrics,
    override_flag: bool,
    num_features: usize,
) -> DecisionResult {
    let rms_energy = round_to(loudness.rms_energy, LOUDNESS_DECIMALS);
    let max_amplitude = round_to(loudness.max_amplitude, LOUDNESS_DECIMALS);

    if !override_flag {
        return DecisionResult {
            label: result.label,
            confidence: result.confidence,
            probabilities: result.probabilities,
            classes: result.classes,
            num_features,
            rms_energy,
            max_amplitude,
            overridden: false,
            original_prediction: None,
        };
    }

    // Forced distribution exists only for two-class output
    let probabilities = match result.probabilities {
        Some(p) if p.len() == 2 => Some(vec![1.0, 0.0]),
        _ => None,
    };

    DecisionResult {
        label: Label::Int(0),
        confidence: Some(1.0),
        probabilities,
        classes: result.classes,
        num_features,
        rms_energy,
        max_amplitude,
        overridden: true,
        original_prediction: Some(result.label),
    }
}
