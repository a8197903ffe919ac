//! Short-time Fourier transform
//!
//! Centred frames: the signal is zero padded by `n_fft / 2` on both sides so
//! frame `t` is centred on sample `t * hop`, giving `1 + len / hop` frames.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

/// Magnitude spectrogram, one row of `n_fft / 2 + 1` bins per frame
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    pub frames: Vec<Vec<f64>>,
    pub n_fft: usize,
}

impl Spectrogram {
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn num_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Squared magnitudes
    pub fn power(&self) -> Vec<Vec<f64>> {
        self.frames
            .iter()
            .map(|frame| frame.iter().map(|m| m * m).collect())
            .collect()
    }

    /// Centre frequency of every bin in Hz
    pub fn bin_frequencies(&self, sample_rate: u32) -> Vec<f64> {
        (0..self.num_bins())
            .map(|k| k as f64 * sample_rate as f64 / self.n_fft as f64)
            .collect()
    }
}

/// STFT computer with a pre-planned FFT and periodic Hann window
pub struct Stft {
    n_fft: usize,
    hop_length: usize,
    window: Vec<f64>,
    fft: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for Stft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stft")
            .field("n_fft", &self.n_fft)
            .field("hop_length", &self.hop_length)
            .finish()
    }
}

impl Stft {
    pub fn new(n_fft: usize, hop_length: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(n_fft);
        Self {
            n_fft,
            hop_length,
            window: hann_window(n_fft),
            fft,
        }
    }

    /// Number of centred frames for a signal of `len` samples
    pub fn frame_count(&self, len: usize) -> usize {
        1 + len / self.hop_length
    }

    /// Magnitude spectrogram of `samples`
    pub fn magnitude(&self, samples: &[f32]) -> Spectrogram {
        let pad = self.n_fft / 2;
        let num_frames = self.frame_count(samples.len());
        let num_bins = self.n_fft / 2 + 1;

        let mut buffer = vec![Complex::new(0.0f64, 0.0); self.n_fft];
        let mut frames = Vec::with_capacity(num_frames);

        for t in 0..num_frames {
            // Frame start in padded coordinates; shift back into the signal
            let start = (t * self.hop_length) as isize - pad as isize;
            for (j, slot) in buffer.iter_mut().enumerate() {
                let idx = start + j as isize;
                let sample = if idx >= 0 && (idx as usize) < samples.len() {
                    samples[idx as usize] as f64
                } else {
                    0.0
                };
                *slot = Complex::new(sample * self.window[j], 0.0);
            }

            self.fft.process(&mut buffer);
            frames.push(buffer[..num_bins].iter().map(|c| c.norm()).collect());
        }

        Spectrogram {
            frames,
            n_fft: self.n_fft,
        }
    }
}

/// Periodic Hann window (the FFT-bin variant)
pub fn hann_window(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / size as f64).cos())
        .collect()
}
