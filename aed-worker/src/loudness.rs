//! Loudness gate
//!
//! Classifiers trained on audio events are unreliable on near-silent input.
//! The gate flags a clip as quiet when either its RMS energy or its peak
//! amplitude falls strictly below a threshold; the decision engine then
//! forces the "no-event" class.

use serde::Serialize;

pub use aed_common::config::{LOW_AMPLITUDE_THRESHOLD, LOW_RMS_THRESHOLD};

/// Loudness proxies derived directly from the waveform
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoudnessMetrics {
    pub rms_energy: f64,
    pub max_amplitude: f64,
}

impl LoudnessMetrics {
    /// Compute both proxies; an empty waveform measures as silence
    pub fn measure(samples: &[f32]) -> Self {
        if samples.is_empty() {
            return Self {
                rms_energy: 0.0,
                max_amplitude: 0.0,
            };
        }

        let sum_squares: f64 = samples.iter().map(|&s| (s as f64).powi(2)).sum();
        let max_amplitude = samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()));

        Self {
            rms_energy: (sum_squares / samples.len() as f64).sqrt(),
            max_amplitude: max_amplitude as f64,
        }
    }
}

/// Gate outcome for one waveform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessAssessment {
    pub metrics: LoudnessMetrics,
    pub override_flag: bool,
}

/// Threshold pair deciding when a clip is too quiet to classify
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessGate {
    rms_threshold: f64,
    amplitude_threshold: f64,
}

impl Default for LoudnessGate {
    fn default() -> Self {
        Self::new(LOW_RMS_THRESHOLD, LOW_AMPLITUDE_THRESHOLD)
    }
}

impl LoudnessGate {
    pub fn new(rms_threshold: f64, amplitude_threshold: f64) -> Self {
        Self {
            rms_threshold,
            amplitude_threshold,
        }
    }

    pub fn from_settings(settings: &aed_common::config::GateSettings) -> Self {
        Self::new(settings.rms_threshold, settings.amplitude_threshold)
    }

    pub fn rms_threshold(&self) -> f64 {
        self.rms_threshold
    }

    pub fn amplitude_threshold(&self) -> f64 {
        self.amplitude_threshold
    }

    /// True when either proxy is strictly below its threshold
    pub fn is_quiet(&self, metrics: &LoudnessMetrics) -> bool {
        metrics.rms_energy < self.rms_threshold || metrics.max_amplitude < self.amplitude_threshold
    }

    pub fn assess(&self, samples: &[f32]) -> LoudnessAssessment {
        let metrics = LoudnessMetrics::measure(samples);
        LoudnessAssessment {
            metrics,
            override_flag: self.is_quiet(&metrics),
        }
    }
}
