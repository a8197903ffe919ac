//! Feature scalers applied before classification

use super::ensure;
use crate::error::PredictionError;
use serde::{Deserialize, Serialize};

/// Per-feature affine transform fitted alongside the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// `(x - mean) / scale`; a zero scale leaves the centred value unscaled
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// `x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

impl Scaler {
    pub fn n_features(&self) -> usize {
        match self {
            Scaler::Standard { mean, .. } => mean.len(),
            Scaler::MinMax { min, .. } => min.len(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let (offset, scale) = self.parts();
        ensure(!offset.is_empty(), || "scaler has no features".to_string())?;
        ensure(offset.len() == scale.len(), || {
            format!(
                "scaler offset has {} values but scale has {}",
                offset.len(),
                scale.len()
            )
        })?;
        ensure(
            offset.iter().chain(scale.iter()).all(|v| v.is_finite()),
            || "scaler contains a non-finite value".to_string(),
        )
    }

    fn parts(&self) -> (&[f64], &[f64]) {
        match self {
            Scaler::Standard { mean, scale } => (mean, scale),
            Scaler::MinMax { min, scale } => (min, scale),
        }
    }

    pub fn transform(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        if features.len() != self.n_features() {
            return Err(PredictionError::ScalerMismatch {
                expected: self.n_features(),
                actual: features.len(),
            });
        }

        let scaled = match self {
            Scaler::Standard { mean, scale } => features
                .iter()
                .zip(mean.iter().zip(scale))
                .map(|(x, (m, s))| {
                    let s = if *s == 0.0 { 1.0 } else { *s };
                    (x - m) / s
                })
                .collect(),
            Scaler::MinMax { min, scale } => features
                .iter()
                .zip(min.iter().zip(scale))
                .map(|(x, (lo, s))| x * s + lo)
                .collect(),
        };
        Ok(scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_scaler() {
        let scaler = Scaler::Standard {
            mean: vec![1.0, 2.0],
            scale: vec![2.0, 0.0],
        };
        assert!(scaler.validate().is_ok());
        assert_eq!(scaler.transform(&[3.0, 5.0]).unwrap(), vec![1.0, 3.0]);
    }

    #[test]
    fn test_min_max_scaler() {
        let scaler = Scaler::MinMax {
            min: vec![-1.0, 0.0],
            scale: vec![0.5, 0.1],
        };
        assert_eq!(scaler.transform(&[1.0, 5.0]).unwrap(), vec![-0.5, 0.5]);
    }

    #[test]
    fn test_width_mismatch() {
        let scaler = Scaler::Standard {
            mean: vec![0.0; 3],
            scale: vec![1.0; 3],
        };
        assert_eq!(
            scaler.transform(&[0.0; 2]),
            Err(PredictionError::ScalerMismatch {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_tagged_json() {
        let scaler: Scaler =
            serde_json::from_str(r#"{"kind": "standard", "mean": [0.5], "scale": [2.0]}"#).unwrap();
        assert_eq!(scaler.n_features(), 1);

        let scaler: Scaler =
            serde_json::from_str(r#"{"kind": "min_max", "min": [0.0], "scale": [1.0]}"#).unwrap();
        assert!(matches!(scaler, Scaler::MinMax { .. }));
    }

    #[test]
    fn test_validation() {
        let scaler = Scaler::Standard {
            mean: vec![0.0, 1.0],
            scale: vec![1.0],
        };
        assert!(scaler.validate().is_err());

        let scaler = Scaler::MinMax {
            min: vec![f64::NAN],
            scale: vec![1.0],
        };
        assert!(scaler.validate().is_err());
    }
}
