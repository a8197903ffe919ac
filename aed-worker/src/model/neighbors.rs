//! k-nearest-neighbour classifier

use super::{check_width, ensure, Capabilities, Classifier, Label};
use crate::error::PredictionError;
use serde::{Deserialize, Serialize};

/// Stored training points voting with uniform weight
///
/// Distance ties keep training order. Probabilities are the vote share of
/// each class among the `k` nearest points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KNearestNeighbors {
    pub k: usize,
    pub classes: Vec<Label>,
    pub points: Vec<Vec<f64>>,
    pub labels: Vec<Label>,
}

impl KNearestNeighbors {
    pub fn validate(&self) -> Result<(), String> {
        ensure(self.classes.len() >= 2, || {
            format!("expected at least 2 classes, found {}", self.classes.len())
        })?;
        ensure(!self.points.is_empty(), || "no training points".to_string())?;
        ensure(self.k >= 1 && self.k <= self.points.len(), || {
            format!("k = {} with {} training points", self.k, self.points.len())
        })?;
        ensure(self.labels.len() == self.points.len(), || {
            format!(
                "{} labels for {} training points",
                self.labels.len(),
                self.points.len()
            )
        })?;

        let width = self.n_features();
        ensure(width > 0, || "training points are empty".to_string())?;
        for (idx, point) in self.points.iter().enumerate() {
            ensure(point.len() == width, || {
                format!("point {} has {} values, expected {}", idx, point.len(), width)
            })?;
            ensure(point.iter().all(|v| v.is_finite()), || {
                format!("point {} contains a non-finite value", idx)
            })?;
        }
        for label in &self.labels {
            ensure(self.classes.contains(label), || {
                format!("label {} is not a known class", label)
            })?;
        }

        Ok(())
    }

    fn votes(&self, features: &[f64]) -> Result<Vec<usize>, PredictionError> {
        check_width(self.n_features(), features)?;

        let mut distances: Vec<(f64, usize)> = self
            .points
            .iter()
            .enumerate()
            .map(|(idx, point)| {
                let d: f64 = point
                    .iter()
                    .zip(features)
                    .map(|(p, x)| (p - x).powi(2))
                    .sum();
                (d, idx)
            })
            .collect();

        if distances.iter().any(|(d, _)| !d.is_finite()) {
            return Err(PredictionError::NonFiniteScore);
        }
        distances.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut votes = vec![0usize; self.classes.len()];
        for &(_, idx) in distances.iter().take(self.k) {
            if let Some(class_idx) = self.classes.iter().position(|c| c == &self.labels[idx]) {
                votes[class_idx] += 1;
            }
        }
        Ok(votes)
    }
}

impl Classifier for KNearestNeighbors {
    fn kind(&self) -> &'static str {
        "k_nearest_neighbors"
    }

    fn n_features(&self) -> usize {
        self.points.first().map_or(0, Vec::len)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL
    }

    fn predict(&self, features: &[f64]) -> Result<Label, PredictionError> {
        let votes = self.votes(features)?;
        // First class wins a tied vote
        let mut best = 0;
        for (idx, &count) in votes.iter().enumerate() {
            if count > votes[best] {
                best = idx;
            }
        }
        Ok(self.classes[best].clone())
    }

    fn predict_probabilities(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        let votes = self.votes(features)?;
        Ok(votes
            .into_iter()
            .map(|count| count as f64 / self.k as f64)
            .collect())
    }

    fn class_labels(&self) -> Option<&[Label]> {
        Some(&self.classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(k: usize) -> KNearestNeighbors {
        KNearestNeighbors {
            k,
            classes: vec!["background".into(), "dog_bark".into()],
            points: vec![
                vec![0.0, 0.0],
                vec![0.1, 0.1],
                vec![5.0, 5.0],
                vec![5.1, 5.0],
                vec![4.9, 5.2],
            ],
            labels: vec![
                "background".into(),
                "background".into(),
                "dog_bark".into(),
                "dog_bark".into(),
                "dog_bark".into(),
            ],
        }
    }

    #[test]
    fn test_nearest_cluster_wins() {
        let knn = model(3);
        assert!(knn.validate().is_ok());
        assert_eq!(knn.predict(&[4.8, 5.1]).unwrap(), Label::from("dog_bark"));
        assert_eq!(knn.predict_probabilities(&[4.8, 5.1]).unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_vote_shares() {
        let knn = model(3);
        // Two background points are nearest, then a dog_bark point
        let proba = knn.predict_probabilities(&[0.5, 0.5]).unwrap();
        assert!((proba[0] - 2.0 / 3.0).abs() < 1e-12);
        assert!((proba[1] - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(knn.predict(&[0.5, 0.5]).unwrap(), Label::from("background"));
    }

    #[test]
    fn test_validation() {
        assert!(model(0).validate().is_err());
        assert!(model(6).validate().is_err());

        let mut knn = model(1);
        knn.labels[0] = "cat".into();
        assert!(knn.validate().is_err());

        let mut knn = model(1);
        knn.points[2].push(1.0);
        assert!(knn.validate().is_err());

        let mut knn = model(1);
        knn.labels.pop();
        assert!(knn.validate().is_err());
    }

    #[test]
    fn test_width_mismatch() {
        assert!(matches!(
            model(1).predict(&[1.0]),
            Err(PredictionError::FeatureCountMismatch { expected: 2, actual: 1 })
        ));
    }
}
