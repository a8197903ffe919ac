//! Summary statistics over frame-level series
//!
//! Population moments (ddof = 0) and linearly interpolated percentiles.
//! Callers guarantee non-empty, finite input.

/// Number of statistics produced by [`summarize`]
pub const SUMMARY_LEN: usize = 8;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|&v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Percentile `q` in [0, 100] of already sorted values
fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = q / 100.0 * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let weight = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}

pub fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, q)
}

pub fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

/// Mean, std, min, max, median, 25th percentile, 75th percentile, variance
pub fn summarize(values: &[f64]) -> [f64; SUMMARY_LEN] {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let var = variance(values);
    [
        mean(values),
        var.sqrt(),
        sorted.first().copied().unwrap_or(0.0),
        sorted.last().copied().unwrap_or(0.0),
        percentile_sorted(&sorted, 50.0),
        percentile_sorted(&sorted, 25.0),
        percentile_sorted(&sorted, 75.0),
        var,
    ]
}
