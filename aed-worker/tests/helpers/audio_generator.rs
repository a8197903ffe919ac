//! Audio Test Fixture Generator
//!
//! Utilities for generating WAV clips with known loudness

use std::path::{Path, PathBuf};

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Peak amplitude of the tone, 0.0 for digital silence
    pub amplitude: f32,
    pub frequency: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 1.0,
            sample_rate: 22050,
            channels: 1,
            amplitude: 0.5,
            frequency: 440.0,
        }
    }
}

impl AudioConfig {
    pub fn silent() -> Self {
        Self {
            amplitude: 0.0,
            ..Default::default()
        }
    }
}

/// Generate a 16-bit PCM sine WAV with the given configuration
pub fn generate_test_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total_samples = (config.duration_seconds * config.sample_rate as f64) as usize;

    for i in 0..total_samples {
        let t = i as f32 / config.sample_rate as f32;
        let value = config.amplitude * (2.0 * std::f32::consts::PI * config.frequency * t).sin();
        let sample = (value * i16::MAX as f32) as i16;

        // Same signal on every channel
        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_simple_wav() {
        let temp_dir = TempDir::new().unwrap();
        let wav_path = temp_dir.path().join("test.wav");

        let result = generate_test_wav(&wav_path, &AudioConfig::default());
        assert!(result.is_ok());

        let reader = hound::WavReader::open(&wav_path).unwrap();
        assert_eq!(reader.spec().sample_rate, 22050);
        assert_eq!(reader.len(), 22050);
    }
}
