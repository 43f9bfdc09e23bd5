//! Classification metrics
//!
//! Accuracy, per-class precision/recall/F1 and the support-weighted F1 used to
//! report held-out performance, read off a `linfa` confusion matrix. Undefined
//! ratios (no predictions or no support for a class) count as zero.

use crate::error::PredictionError;
use crate::types::RiskLevel;
use linfa::prelude::*;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub class: RiskLevel,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Held-out evaluation summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub weighted_f1: f64,
    pub per_class: Vec<ClassMetrics>,
    /// `confusion[truth][predicted]`, indexed by [`RiskLevel::index`]
    pub confusion: [[usize; 2]; 2],
    pub samples: usize,
}

impl EvaluationReport {
    /// Compare predictions against ground truth
    pub fn compute(
        truth: &[RiskLevel],
        predicted: &[RiskLevel],
    ) -> Result<Self, PredictionError> {
        if truth.len() != predicted.len() {
            return Err(PredictionError::TrainingError(format!(
                "{} labels but {} predictions",
                truth.len(),
                predicted.len()
            )));
        }
        let samples = truth.len();
        if samples == 0 {
            return Err(PredictionError::InsufficientData(
                "cannot evaluate zero predictions".to_string(),
            ));
        }

        let mut confusion = [[0usize; 2]; 2];
        for (t, p) in truth.iter().zip(predicted) {
            confusion[t.index()][p.index()] += 1;
        }

        let truth_idx: Array1<usize> = truth.iter().map(RiskLevel::index).collect();
        let predicted_idx: Array1<usize> = predicted.iter().map(RiskLevel::index).collect();
        let matrix = predicted_idx
            .confusion_matrix(truth_idx.view())
            .map_err(|e| PredictionError::TrainingError(e.to_string()))?;

        // one-vs-all matrices follow the ascending order of the labels present
        let mut present: Vec<usize> = truth_idx.iter().chain(predicted_idx.iter()).copied().collect();
        present.sort_unstable();
        present.dedup();
        let one_vs_all = matrix.split_one_vs_all();

        let per_class: Vec<ClassMetrics> = RiskLevel::ALL
            .iter()
            .map(|&class| {
                let c = class.index();
                let support = confusion[c][0] + confusion[c][1];
                let binary = present
                    .iter()
                    .position(|&label| label == c)
                    .and_then(|slot| one_vs_all.get(slot));

                let (precision, recall, f1) = match binary {
                    Some(m) => (
                        finite_or_zero(m.precision()),
                        finite_or_zero(m.recall()),
                        finite_or_zero(m.f1_score()),
                    ),
                    None => (0.0, 0.0, 0.0),
                };

                ClassMetrics {
                    class,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let weighted_f1 = per_class
            .iter()
            .map(|m| m.f1 * m.support as f64)
            .sum::<f64>()
            / samples as f64;

        Ok(Self {
            accuracy: finite_or_zero(matrix.accuracy()),
            weighted_f1,
            per_class,
            confusion,
            samples,
        })
    }

    /// Plain-text report in the usual precision/recall/f1/support layout
    pub fn to_table(&self) -> String {
        let mut out = format!(
            "{:>10} {:>10} {:>10} {:>10} {:>10}\n",
            "", "precision", "recall", "f1-score", "support"
        );
        for m in &self.per_class {
            out.push_str(&format!(
                "{:>10} {:>10.2} {:>10.2} {:>10.2} {:>10}\n",
                m.class.as_str(),
                m.precision,
                m.recall,
                m.f1,
                m.support
            ));
        }
        out.push_str(&format!(
            "\n{:>10} {:>32.2} {:>10}\n",
            "accuracy", self.accuracy, self.samples
        ));
        out.push_str(&format!(
            "{:>10} {:>32.2} {:>10}\n",
            "weighted", self.weighted_f1, self.samples
        ));
        out
    }
}

/// linfa reports 0/0 as NaN
fn finite_or_zero(value: f32) -> f64 {
    if value.is_finite() {
        f64::from(value)
    } else {
        0.0
    }
}
