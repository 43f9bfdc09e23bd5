//! Class rebalancing with SMOTE
//!
//! Synthetic minority oversampling: every minority class is grown to the
//! majority count by interpolating between a sample and one of its nearest
//! same-class neighbours.

use crate::error::PredictionError;
use crate::types::RiskLevel;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Default neighbour count
pub const DEFAULT_K_NEIGHBORS: usize = 5;

/// Seeded SMOTE oversampler
#[derive(Debug, Clone, Copy)]
pub struct Smote {
    pub k_neighbors: usize,
    pub seed: u64,
}

impl Default for Smote {
    fn default() -> Self {
        Self {
            k_neighbors: DEFAULT_K_NEIGHBORS,
            seed: 42,
        }
    }
}

impl Smote {
    pub fn new(k_neighbors: usize, seed: u64) -> Self {
        Self { k_neighbors, seed }
    }

    /// Return the input samples followed by synthetic minority samples
    pub fn resample(
        &self,
        rows: &[Vec<f64>],
        labels: &[RiskLevel],
    ) -> Result<(Vec<Vec<f64>>, Vec<RiskLevel>), PredictionError> {
        if rows.len() != labels.len() {
            return Err(PredictionError::TrainingError(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        if self.k_neighbors == 0 {
            return Err(PredictionError::TrainingError(
                "SMOTE needs at least one neighbour".to_string(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut out_rows = rows.to_vec();
        let mut out_labels = labels.to_vec();

        let members: Vec<Vec<usize>> = RiskLevel::ALL
            .iter()
            .map(|class| {
                labels
                    .iter()
                    .enumerate()
                    .filter(|(_, l)| *l == class)
                    .map(|(i, _)| i)
                    .collect()
            })
            .collect();
        let majority = members.iter().map(Vec::len).max().unwrap_or(0);

        for (class, indices) in RiskLevel::ALL.iter().zip(&members) {
            let deficit = majority - indices.len();
            if indices.is_empty() || deficit == 0 {
                continue;
            }

            let neighbours = nearest_neighbours(rows, indices, self.k_neighbors);
            debug!(
                class = class.as_str(),
                have = indices.len(),
                synthesize = deficit,
                "oversampling minority class"
            );

            for _ in 0..deficit {
                let pick = rng.gen_range(0..indices.len());
                let base = &rows[indices[pick]];

                let synthetic = if neighbours[pick].is_empty() {
                    base.clone()
                } else {
                    let other = &rows[neighbours[pick][rng.gen_range(0..neighbours[pick].len())]];
                    let gap: f64 = rng.gen();
                    base.iter()
                        .zip(other)
                        .map(|(b, o)| b + gap * (o - b))
                        .collect()
                };

                out_rows.push(synthetic);
                out_labels.push(*class);
            }
        }

        Ok((out_rows, out_labels))
    }
}

/// For each class member, the row indices of its `k` closest same-class rows
fn nearest_neighbours(rows: &[Vec<f64>], members: &[usize], k: usize) -> Vec<Vec<usize>> {
    let k = k.min(members.len().saturating_sub(1));

    members
        .iter()
        .map(|&i| {
            let mut distances: Vec<(f64, usize)> = members
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| (squared_distance(&rows[i], &rows[j]), j))
                .collect();
            distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            distances.into_iter().take(k).map(|(_, j)| j).collect()
        })
        .collect()
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced() -> (Vec<Vec<f64>>, Vec<RiskLevel>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..8 {
            rows.push(vec![i as f64, 10.0]);
            labels.push(RiskLevel::High);
        }
        for i in 0..3 {
            rows.push(vec![100.0 + i as f64, -5.0 * i as f64]);
            labels.push(RiskLevel::Low);
        }
        (rows, labels)
    }

    #[test]
    fn test_minority_grows_to_majority() {
        let (rows, labels) = imbalanced();
        let (out_rows, out_labels) = Smote::default().resample(&rows, &labels).unwrap();

        let high = out_labels.iter().filter(|l| **l == RiskLevel::High).count();
        let low = out_labels.iter().filter(|l| **l == RiskLevel::Low).count();
        assert_eq!(high, 8);
        assert_eq!(low, 8);
        assert_eq!(out_rows.len(), 16);
        // inputs are kept in front
        assert_eq!(&out_rows[..rows.len()], &rows[..]);
    }

    #[test]
    fn test_synthetic_points_stay_inside_minority_hull() {
        let (rows, labels) = imbalanced();
        let (out_rows, _) = Smote::default().resample(&rows, &labels).unwrap();

        for row in &out_rows[rows.len()..] {
            assert!(row[0] >= 100.0 && row[0] <= 102.0, "x out of range: {row:?}");
            assert!(row[1] >= -10.0 && row[1] <= 0.0, "y out of range: {row:?}");
        }
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let (rows, labels) = imbalanced();
        let a = Smote::new(5, 7).resample(&rows, &labels).unwrap();
        let b = Smote::new(5, 7).resample(&rows, &labels).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_sample_class_is_duplicated() {
        let rows = vec![vec![0.0], vec![1.0], vec![2.0], vec![9.0]];
        let labels = vec![
            RiskLevel::Low,
            RiskLevel::Low,
            RiskLevel::Low,
            RiskLevel::High,
        ];
        let (out_rows, out_labels) = Smote::default().resample(&rows, &labels).unwrap();

        assert_eq!(out_labels.len(), 6);
        assert_eq!(&out_rows[4..], &[vec![9.0], vec![9.0]]);
    }

    #[test]
    fn test_balanced_input_is_unchanged() {
        let rows = vec![vec![0.0], vec![1.0]];
        let labels = vec![RiskLevel::Low, RiskLevel::High];
        let (out_rows, out_labels) = Smote::default().resample(&rows, &labels).unwrap();
        assert_eq!(out_rows, rows);
        assert_eq!(out_labels, labels);
    }
}
