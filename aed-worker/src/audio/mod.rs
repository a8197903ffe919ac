//! Audio Source: file path in, mono waveform at the analysis rate out

pub mod decoder;
pub mod resampler;

pub use decoder::{decode_audio_file, DecodedAudio};
pub use resampler::Resampler;

use crate::error::AudioDecodeError;
use std::path::Path;

/// Single-channel samples at a fixed rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Decodes and resamples the audio a request points at
pub trait AudioSource: Send + Sync {
    fn decode(&self, path: &Path, target_rate: u32) -> Result<Waveform, AudioDecodeError>;
}

/// Default source: symphonia decoding followed by rubato resampling
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaSource;

impl AudioSource for SymphoniaSource {
    fn decode(&self, path: &Path, target_rate: u32) -> Result<Waveform, AudioDecodeError> {
        let decoded = decode_audio_file(path)?;

        if decoded.channels > 1 {
            tracing::debug!(
                path = %path.display(),
                channels = decoded.channels,
                "Mixed multi-channel audio down to mono"
            );
        }

        let samples = Resampler::resample(&decoded.samples, decoded.sample_rate, target_rate)?;
        Ok(Waveform::new(samples, target_rate))
    }
}
