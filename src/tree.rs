//! Decision tree classifier
//!
//! Thin wrapper over a `linfa-trees` CART model trained with Gini impurity.
//! The wrapper owns the growth parameters and the expected feature width, and
//! checks a deserialized model before it is used so that a corrupt artifact
//! surfaces as an error instead of an out-of-bounds index.

use crate::error::PredictionError;
use crate::types::RiskLevel;
use linfa::prelude::*;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Default depth limit used by training
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Default minimum number of samples required to split a node
pub const DEFAULT_MIN_SAMPLES_SPLIT: usize = 2;

/// Tree growth parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth (`None` grows until leaves are pure)
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: Some(DEFAULT_MAX_DEPTH),
            min_samples_split: DEFAULT_MIN_SAMPLES_SPLIT,
        }
    }
}

/// Fitted tree; labels are [`RiskLevel::index`] values
#[derive(Debug, Serialize, Deserialize)]
pub struct RiskTree {
    pub params: TreeParams,
    pub n_features: usize,
    pub model: DecisionTree<f64, usize>,
}

impl RiskTree {
    /// Grow a tree on `rows` labelled by `labels`
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[RiskLevel],
        params: TreeParams,
    ) -> Result<Self, PredictionError> {
        if rows.is_empty() {
            return Err(PredictionError::InsufficientData(
                "cannot fit a tree on zero samples".to_string(),
            ));
        }
        if rows.len() != labels.len() {
            return Err(PredictionError::TrainingError(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }

        let n_features = rows[0].len();
        let records = to_matrix(rows, n_features)?;
        let targets: Array1<usize> = labels.iter().map(RiskLevel::index).collect();
        let dataset = Dataset::new(records, targets);

        let model = DecisionTree::params()
            .split_quality(SplitQuality::Gini)
            .max_depth(params.max_depth)
            .min_weight_split(params.min_samples_split.max(2) as f32)
            .min_weight_leaf(1.0)
            .fit(&dataset)
            .map_err(|e| PredictionError::TrainingError(e.to_string()))?;

        Ok(Self {
            params,
            n_features,
            model,
        })
    }

    /// Check that every split reads a column inside the feature width and
    /// every leaf carries a known label
    pub fn validate(&self) -> Result<(), PredictionError> {
        for node in self.model.iter_nodes() {
            if node.is_leaf() {
                match node.prediction() {
                    Some(label) if label < RiskLevel::ALL.len() => continue,
                    other => {
                        return Err(PredictionError::SchemaMismatch(format!(
                            "leaf predicts unknown label {other:?}"
                        )))
                    }
                }
            }

            let (feature, threshold, _) = node.split();
            if feature >= self.n_features {
                return Err(PredictionError::SchemaMismatch(format!(
                    "split on feature {} but the model has {} features",
                    feature, self.n_features
                )));
            }
            if !threshold.is_finite() {
                return Err(PredictionError::SchemaMismatch(format!(
                    "split on feature {feature} has a non-finite threshold"
                )));
            }
            if node.children().iter().any(|child| child.is_none()) {
                return Err(PredictionError::SchemaMismatch(format!(
                    "split on feature {feature} is missing a branch"
                )));
            }
        }
        Ok(())
    }

    /// Predict the class of one encoded row
    pub fn predict(&self, row: &[f64]) -> Result<RiskLevel, PredictionError> {
        if row.len() != self.n_features {
            return Err(PredictionError::SchemaMismatch(format!(
                "expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }

        self.predict_all(&[row.to_vec()])?
            .into_iter()
            .next()
            .ok_or_else(|| PredictionError::SchemaMismatch("empty prediction".to_string()))
    }

    /// Predict a batch of encoded rows
    pub fn predict_all(&self, rows: &[Vec<f64>]) -> Result<Vec<RiskLevel>, PredictionError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let records = to_matrix(rows, self.n_features)?;
        let predicted: Array1<usize> = self.model.predict(&records);
        Ok(predicted.iter().map(|&i| RiskLevel::from_index(i)).collect())
    }

    pub fn depth(&self) -> usize {
        self.model.max_depth()
    }

    pub fn leaf_count(&self) -> usize {
        self.model.num_leaves()
    }
}

/// Pack rows into a dense matrix, rejecting ragged input
fn to_matrix(rows: &[Vec<f64>], n_features: usize) -> Result<Array2<f64>, PredictionError> {
    if let Some(bad) = rows.iter().position(|r| r.len() != n_features) {
        return Err(PredictionError::SchemaMismatch(format!(
            "row {} has {} features, expected {}",
            bad,
            rows[bad].len(),
            n_features
        )));
    }

    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), n_features), flat)
        .map_err(|e| PredictionError::SchemaMismatch(format!("invalid feature dimensions: {e}")))
}
