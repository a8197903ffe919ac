//! Per-request inference pipeline
//!
//! decode → loudness gate → feature extraction → classifier → decision

use crate::adapter::ClassifierAdapter;
use crate::audio::{AudioSource, SymphoniaSource};
use crate::decision::{decide, DecisionResult};
use crate::error::{PredictionError, Result, WorkerError};
use crate::features::FeatureExtractor;
use crate::loudness::LoudnessGate;
use crate::model::LoadedModel;
use aed_common::config::DEFAULT_SAMPLE_RATE;
use std::path::Path;
use tracing::{info, warn};

/// Outcome of a request that got as far as scoring
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Decision(DecisionResult),
    /// Classifier or scaler rejected the features
    PredictionFailed(PredictionError),
}

impl Verdict {
    /// Text carried in the response record's `message`
    pub fn message(&self) -> Result<String> {
        match self {
            Verdict::Decision(decision) => decision
                .to_message()
                .map_err(|e| WorkerError::Common(e.into())),
            Verdict::PredictionFailed(err) => Ok(WorkerError::Prediction(err.clone()).to_string()),
        }
    }
}

pub struct InferencePipeline {
    source: Box<dyn AudioSource>,
    extractor: FeatureExtractor,
    gate: LoudnessGate,
    adapter: ClassifierAdapter,
    sample_rate: u32,
}

impl std::fmt::Debug for InferencePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferencePipeline")
            .field("gate", &self.gate)
            .field("adapter", &self.adapter)
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}

impl InferencePipeline {
    pub fn new(
        source: Box<dyn AudioSource>,
        gate: LoudnessGate,
        adapter: ClassifierAdapter,
        sample_rate: u32,
    ) -> Self {
        Self {
            source,
            extractor: FeatureExtractor::new(),
            gate,
            adapter,
            sample_rate,
        }
    }

    /// Symphonia decoding at the default analysis rate
    pub fn from_model(model: LoadedModel, gate: LoudnessGate) -> Self {
        Self::new(
            Box::new(SymphoniaSource),
            gate,
            ClassifierAdapter::new(model.classifier, model.scaler),
            DEFAULT_SAMPLE_RATE,
        )
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Run one audio file through the pipeline
    ///
    /// Decode and extraction failures are errors; a classifier rejection is
    /// still a verdict so it can be reported inside a response record.
    pub fn handle(&self, path: &Path) -> Result<Verdict> {
        let waveform = self.source.decode(path, self.sample_rate)?;
        if waveform.is_empty() {
            return Err(WorkerError::EmptyAudio);
        }

        let assessment = self.gate.assess(&waveform.samples);
        let metrics = assessment.metrics;

        let features = self
            .extractor
            .extract(&waveform.samples, waveform.sample_rate)?;

        let result = match self.adapter.predict(&features) {
            Ok(result) => result,
            Err(e) => {
                warn!(path = %path.display(), "Prediction failed: {}", e);
                return Ok(Verdict::PredictionFailed(e));
            }
        };

        let decision = decide(result, &metrics, assessment.override_flag, features.len());

        if decision.overridden {
            warn!(
                rms_energy = metrics.rms_energy,
                max_amplitude = metrics.max_amplitude,
                "Low volume detected, forcing prediction to 0"
            );
        }

        info!(
            prediction = %decision.label,
            rms_energy = metrics.rms_energy,
            max_amplitude = metrics.max_amplitude,
            probabilities = ?decision.probabilities,
            classes = ?decision.classes,
            num_features = decision.num_features,
            "Model raw output"
        );

        Ok(Verdict::Decision(decision))
    }
}
