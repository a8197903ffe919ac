//! Feature extraction: waveform to a fixed-length feature vector
//!
//! **Layout (114 values, f32):**
//! - 13 MFCC series × 8 statistics (mean, std, min, max, median, p25, p75,
//!   variance), series-major → 104 values
//! - mean/std of spectral centroid, mean/std of spectral roll-off, mean/std
//!   of zero-crossing rate, mean/std/max/min of |waveform| → 10 values
//!
//! Every value is aggregated over time, so the length never depends on the
//! clip duration.

pub mod mfcc;
pub mod spectral;
pub mod spectrogram;
pub mod stats;

use crate::error::FeatureExtractionError;
use mfcc::Mfcc;
use spectrogram::Stft;

/// Number of cepstral coefficient series
pub const N_MFCC: usize = 13;
/// Mel bands feeding the cepstrum
pub const N_MELS: usize = 128;
pub const N_FFT: usize = 2048;
pub const HOP_LENGTH: usize = 512;
/// Dynamic range kept by the dB conversion
pub const TOP_DB: f64 = 80.0;

pub const MFCC_FEATURE_COUNT: usize = N_MFCC * stats::SUMMARY_LEN;
pub const SPECTRAL_FEATURE_COUNT: usize = 10;
/// Total feature vector length
pub const FEATURE_COUNT: usize = MFCC_FEATURE_COUNT + SPECTRAL_FEATURE_COUNT;

/// Immutable feature vector of length [`FEATURE_COUNT`]
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Widen to f64 for scoring
    pub fn to_f64(&self) -> Vec<f64> {
        self.0.iter().map(|&v| v as f64).collect()
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Stateless extractor holding a pre-planned FFT
#[derive(Debug)]
pub struct FeatureExtractor {
    stft: Stft,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self {
            stft: Stft::new(N_FFT, HOP_LENGTH),
        }
    }

    /// Compute the feature vector of `samples` recorded at `sample_rate`
    ///
    /// # Errors
    /// * `EmptyAudio` for an empty buffer
    /// * `NonFiniteSample` when any sample is NaN or infinite
    /// * `InvalidSampleRate` for a zero rate
    pub fn extract(
        &self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<FeatureVector, FeatureExtractionError> {
        if samples.is_empty() {
            return Err(FeatureExtractionError::EmptyAudio);
        }
        if sample_rate == 0 {
            return Err(FeatureExtractionError::InvalidSampleRate(sample_rate));
        }
        if let Some((index, &value)) = samples.iter().enumerate().find(|(_, s)| !s.is_finite()) {
            return Err(FeatureExtractionError::NonFiniteSample { index, value });
        }

        let magnitude = self.stft.magnitude(samples);

        let mut features = Vec::with_capacity(FEATURE_COUNT);

        // MFCC aggregates
        let mfcc = Mfcc::new(sample_rate, N_FFT, N_MELS, N_MFCC, TOP_DB);
        for series in mfcc.compute(&magnitude.power()) {
            features.extend(stats::summarize(&series));
        }

        // Spectral shape, zero crossings, amplitude envelope
        let centroid = spectral::spectral_centroid(&magnitude, sample_rate);
        let rolloff = spectral::spectral_rolloff(&magnitude, sample_rate, spectral::ROLL_PERCENT);
        let zcr = spectral::zero_crossing_rate(samples, N_FFT, HOP_LENGTH);
        let abs_samples: Vec<f64> = samples.iter().map(|s| s.abs() as f64).collect();

        features.extend([
            stats::mean(&centroid),
            stats::std_dev(&centroid),
            stats::mean(&rolloff),
            stats::std_dev(&rolloff),
            stats::mean(&zcr),
            stats::std_dev(&zcr),
            stats::mean(&abs_samples),
            stats::std_dev(&abs_samples),
            stats::max(&abs_samples),
            stats::min(&abs_samples),
        ]);

        debug_assert_eq!(features.len(), FEATURE_COUNT);

        tracing::trace!(
            frames = magnitude.num_frames(),
            features = features.len(),
            "Extracted feature vector"
        );

        Ok(FeatureVector(features.into_iter().map(|v| v as f32).collect()))
    }
}
