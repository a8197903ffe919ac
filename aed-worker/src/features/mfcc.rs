//! Mel-frequency cepstral coefficients
//!
//! **Algorithm:**
//! 1. Power spectrogram (from [`super::spectrogram`])
//! 2. Slaney-scale mel filterbank with area normalization
//! 3. Power to decibels, clipped to `top_db` below the peak
//! 4. Orthonormal DCT-II, keeping the first `n_mfcc` coefficients

use std::f64::consts::PI;

/// Floor applied before taking the logarithm
const AMIN: f64 = 1e-10;

// Slaney mel scale: linear below 1 kHz, logarithmic above
const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// Triangular mel filters, `n_mels` rows of `n_fft / 2 + 1` weights
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    weights: Vec<Vec<f64>>,
}

impl MelFilterbank {
    /// Filters spanning `[0, sample_rate / 2]`
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize) -> Self {
        let n_bins = n_fft / 2 + 1;
        let fmax = sample_rate as f64 / 2.0;

        let fft_freqs: Vec<f64> = (0..n_bins)
            .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
            .collect();

        // n_mels + 2 band edges, evenly spaced on the mel scale
        let mel_max = hz_to_mel(fmax);
        let edges: Vec<f64> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_max * i as f64 / (n_mels + 1) as f64))
            .collect();

        let weights = (0..n_mels)
            .map(|m| {
                let (left, center, right) = (edges[m], edges[m + 1], edges[m + 2]);
                let enorm = 2.0 / (right - left);
                fft_freqs
                    .iter()
                    .map(|&f| {
                        let lower = (f - left) / (center - left);
                        let upper = (right - f) / (right - center);
                        lower.min(upper).max(0.0) * enorm
                    })
                    .collect()
            })
            .collect();

        Self { weights }
    }

    pub fn n_mels(&self) -> usize {
        self.weights.len()
    }

    /// Apply to one power spectrum frame
    pub fn apply(&self, power_frame: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .map(|filter| filter.iter().zip(power_frame).map(|(w, p)| w * p).sum())
            .collect()
    }
}

/// Convert a mel power spectrogram (frames × bands) to decibels in place
///
/// Reference power is 1.0; values are clipped to `top_db` below the global
/// maximum.
pub fn power_to_db(spec: &mut [Vec<f64>], top_db: f64) {
    let mut peak = f64::NEG_INFINITY;
    for value in spec.iter_mut().flatten() {
        *value = 10.0 * value.max(AMIN).log10();
        peak = peak.max(*value);
    }

    let floor = peak - top_db;
    for value in spec.iter_mut().flatten() {
        *value = value.max(floor);
    }
}

/// Orthonormal DCT-II basis, `n_out` rows of `n_in` weights
fn dct_basis(n_in: usize, n_out: usize) -> Vec<Vec<f64>> {
    (0..n_out)
        .map(|k| {
            let scale = if k == 0 {
                (1.0 / n_in as f64).sqrt()
            } else {
                (2.0 / n_in as f64).sqrt()
            };
            (0..n_in)
                .map(|n| scale * (PI * k as f64 * (2 * n + 1) as f64 / (2 * n_in) as f64).cos())
                .collect()
        })
        .collect()
}

/// MFCC computer for a fixed sample rate and frame geometry
#[derive(Debug, Clone)]
pub struct Mfcc {
    filterbank: MelFilterbank,
    dct: Vec<Vec<f64>>,
    top_db: f64,
}

impl Mfcc {
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize, n_mfcc: usize, top_db: f64) -> Self {
        Self {
            filterbank: MelFilterbank::new(sample_rate, n_fft, n_mels),
            dct: dct_basis(n_mels, n_mfcc),
            top_db,
        }
    }

    /// Coefficient series: `n_mfcc` rows, one value per frame
    pub fn compute(&self, power_frames: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let mut mel_db: Vec<Vec<f64>> = power_frames
            .iter()
            .map(|frame| self.filterbank.apply(frame))
            .collect();
        power_to_db(&mut mel_db, self.top_db);

        self.dct
            .iter()
            .map(|basis| {
                mel_db
                    .iter()
                    .map(|bands| basis.iter().zip(bands).map(|(b, v)| b * v).sum())
                    .collect()
            })
            .collect()
    }
}
