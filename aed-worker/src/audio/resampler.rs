//! Mono resampling using rubato
//!
//! Brings every decoded clip to the analysis rate (22050 Hz by default) so
//! spectral features are computed on a consistent frequency grid.

use crate::error::AudioDecodeError;
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Input frames handed to rubato per call
const CHUNK_SIZE: usize = 1024;

/// Mono resampler using rubato for sample rate conversion.
pub struct Resampler;

impl Resampler {
    /// Resample mono audio from `input_rate` to `output_rate`.
    ///
    /// # Notes
    /// If the rates already match (or the input is empty), returns a copy
    /// without resampling. Otherwise the output is aligned with the input
    /// (the interpolator delay is removed) and holds exactly
    /// `ceil(len * output_rate / input_rate)` frames.
    pub fn resample(
        input: &[f32],
        input_rate: u32,
        output_rate: u32,
    ) -> Result<Vec<f32>, AudioDecodeError> {
        if input_rate == output_rate || input.is_empty() {
            debug!("Sample rate already at {}Hz, skipping resample", output_rate);
            return Ok(input.to_vec());
        }

        if input_rate == 0 || output_rate == 0 {
            return Err(AudioDecodeError::Resample(format!(
                "invalid rate conversion {}Hz -> {}Hz",
                input_rate, output_rate
            )));
        }

        debug!("Resampling from {}Hz to {}Hz", input_rate, output_rate);

        let ratio = output_rate as f64 / input_rate as f64;
        let mut resampler = FastFixedIn::<f32>::new(
            ratio,
            1.0, // max_relative_ratio (no runtime changes)
            PolynomialDegree::Septic,
            CHUNK_SIZE,
            1,
        )
        .map_err(|e| AudioDecodeError::Resample(format!("Failed to create resampler: {}", e)))?;

        let delay = leading_frames(ratio);
        let expected = (input.len() as f64 * ratio).ceil() as usize;
        let mut output = Vec::with_capacity(expected + delay + CHUNK_SIZE);

        let mut chunks = input.chunks_exact(CHUNK_SIZE);
        for chunk in chunks.by_ref() {
            let mut planar = resampler
                .process(&[chunk][..], None)
                .map_err(|e| AudioDecodeError::Resample(e.to_string()))?;
            output.append(&mut planar[0]);
        }

        let tail = chunks.remainder();
        if !tail.is_empty() {
            let mut planar = resampler
                .process_partial(Some(&[tail][..]), None)
                .map_err(|e| AudioDecodeError::Resample(e.to_string()))?;
            output.append(&mut planar[0]);
        }

        // Flush the frames still held back by the interpolator
        while output.len() < expected + delay {
            let mut planar = resampler
                .process_partial(None::<&[&[f32]]>, None)
                .map_err(|e| AudioDecodeError::Resample(e.to_string()))?;
            if planar[0].is_empty() {
                break;
            }
            output.append(&mut planar[0]);
        }

        output.drain(..delay.min(output.len()));
        output.resize(expected, 0.0);

        debug!(
            "Resampled {} input frames to {} output frames",
            input.len(),
            output.len()
        );

        Ok(output)
    }
}

/// Output frames rubato's septic interpolator emits before input frame 0
///
/// Output frame `k` lands on input position `(k + 1) / ratio - 4`, which
/// puts the first frame at or past the start at `ceil(4 * ratio) - 1`.
/// `Resampler::output_delay` reports `floor(4 * ratio)`, one frame too many
/// whenever `4 * ratio` is a whole number.
fn leading_frames(ratio: f64) -> usize {
    ((4.0 * ratio).ceil() as usize).saturating_sub(1)
}
