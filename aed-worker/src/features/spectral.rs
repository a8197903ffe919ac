//! Frame-level spectral shape and zero-crossing features

use super::spectrogram::Spectrogram;

/// Fraction of spectral energy below the roll-off frequency
pub const ROLL_PERCENT: f64 = 0.85;

/// Magnitudes at or below this are treated as exact zeros when counting
/// sign changes
const ZERO_CROSSING_THRESHOLD: f32 = 1e-10;

/// Magnitude-weighted mean frequency per frame
///
/// Frames with no energy have a centroid of 0 Hz.
pub fn spectral_centroid(spec: &Spectrogram, sample_rate: u32) -> Vec<f64> {
    let freqs = spec.bin_frequencies(sample_rate);
    spec.frames
        .iter()
        .map(|frame| {
            let total: f64 = frame.iter().sum();
            if total <= f64::MIN_POSITIVE {
                return 0.0;
            }
            frame.iter().zip(&freqs).map(|(m, f)| m * f).sum::<f64>() / total
        })
        .collect()
}

/// Lowest frequency below which `roll_percent` of each frame's magnitude lies
pub fn spectral_rolloff(spec: &Spectrogram, sample_rate: u32, roll_percent: f64) -> Vec<f64> {
    let freqs = spec.bin_frequencies(sample_rate);
    spec.frames
        .iter()
        .map(|frame| {
            let total: f64 = frame.iter().sum();
            let threshold = roll_percent * total;

            let mut cumulative = 0.0;
            for (magnitude, &freq) in frame.iter().zip(&freqs) {
                cumulative += magnitude;
                if cumulative >= threshold {
                    return freq;
                }
            }
            freqs.last().copied().unwrap_or(0.0)
        })
        .collect()
}

/// Zero-crossing rate per centred frame
///
/// The signal is edge padded by `frame_length / 2`; zero counts as positive.
/// Each rate is the number of sign changes divided by `frame_length`.
pub fn zero_crossing_rate(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }

    let pad = frame_length / 2;
    let first = samples[0];
    let last = samples[samples.len() - 1];
    let at = |idx: isize| -> f32 {
        if idx < 0 {
            first
        } else if idx as usize >= samples.len() {
            last
        } else {
            samples[idx as usize]
        }
    };
    let negative = |x: f32| x.abs() > ZERO_CROSSING_THRESHOLD && x < 0.0;

    let num_frames = 1 + samples.len() / hop_length;
    (0..num_frames)
        .map(|t| {
            let start = (t * hop_length) as isize - pad as isize;
            let mut previous = negative(at(start));
            let mut crossings = 0usize;
            for j in 1..frame_length as isize {
                let current = negative(at(start + j));
                if current != previous {
                    crossings += 1;
                }
                previous = current;
            }
            crossings as f64 / frame_length as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::spectrogram::Stft;

    fn sine(freq: f64, len: usize, sample_rate: u32) -> Vec<f32> {
        (0..len)
            .map(|i| {
                (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate as f64).sin() as f32
                    * 0.5
            })
            .collect()
    }

    #[test]
    fn test_centroid_tracks_tone_frequency() {
        let sample_rate = 22050;
        let spec = Stft::new(2048, 512).magnitude(&sine(2000.0, 22050, sample_rate));
        let centroid = spectral_centroid(&spec, sample_rate);

        let middle = centroid[centroid.len() / 2];
        assert!((middle - 2000.0).abs() < 100.0, "centroid was {}", middle);
    }

    #[test]
    fn test_silent_frames_are_zero() {
        let sample_rate = 22050;
        let spec = Stft::new(2048, 512).magnitude(&vec![0.0; 2048]);
        assert!(spectral_centroid(&spec, sample_rate).iter().all(|&c| c == 0.0));
        assert!(spectral_rolloff(&spec, sample_rate, ROLL_PERCENT)
            .iter()
            .all(|&r| r == 0.0));
    }

    #[test]
    fn test_rolloff_above_tone() {
        let sample_rate = 22050;
        let spec = Stft::new(2048, 512).magnitude(&sine(1000.0, 22050, sample_rate));
        let rolloff = spectral_rolloff(&spec, sample_rate, ROLL_PERCENT);

        let middle = rolloff[rolloff.len() / 2];
        assert!(middle >= 1000.0 - 11.0 && middle < 1500.0, "rolloff was {}", middle);
    }

    #[test]
    fn test_zcr_of_alternating_signal() {
        let samples: Vec<f32> = (0..4096).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        let zcr = zero_crossing_rate(&samples, 2048, 512);

        assert_eq!(zcr.len(), 9);
        // Interior frames change sign on every step
        assert!((zcr[4] - 2047.0 / 2048.0).abs() < 1e-12);
    }

    #[test]
    fn test_zcr_ignores_tiny_values() {
        let samples = vec![1e-12f32, -1e-12, 1e-12, -1e-12];
        let zcr = zero_crossing_rate(&samples, 2048, 512);
        assert!(zcr.iter().all(|&z| z == 0.0));
    }

    #[test]
    fn test_zcr_of_constant_signal() {
        let zcr = zero_crossing_rate(&vec![0.3; 1000], 2048, 512);
        assert_eq!(zcr.len(), 2);
        assert!(zcr.iter().all(|&z| z == 0.0));
    }
}
