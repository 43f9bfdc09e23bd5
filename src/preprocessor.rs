//! Feature preprocessing
//!
//! Turns a [`UserFeatures`] record into the dense vector the classifier sees:
//! - Numeric columns are standard-scaled with statistics fitted on training data
//! - Categorical columns are one-hot encoded with the first category dropped
//! - Categories are compared after trimming and lower-casing

use crate::error::PredictionError;
use crate::types::{CategoricalColumn, NumericColumn, UserFeatures};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// How to encode a category that was not seen during fitting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategory {
    /// Encode as all zeros (same as the dropped reference category)
    #[default]
    Ignore,
    /// Fail the transform
    Error,
}

/// Fitted standard scaler for one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledColumn {
    pub column: NumericColumn,
    pub mean: f64,
    /// Population standard deviation, or 1.0 for a constant column
    pub scale: f64,
}

impl ScaledColumn {
    fn fit(column: NumericColumn, records: &[UserFeatures]) -> Self {
        let n = records.len() as f64;
        let mean = records.iter().map(|r| column.value(r)).sum::<f64>() / n;
        let variance = records
            .iter()
            .map(|r| {
                let d = column.value(r) - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        let std = variance.sqrt();
        let scale = if std > f64::EPSILON { std } else { 1.0 };

        Self {
            column,
            mean,
            scale,
        }
    }

    fn transform(&self, features: &UserFeatures) -> f64 {
        (self.column.value(features) - self.mean) / self.scale
    }
}

/// Fitted one-hot encoder for one categorical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedColumn {
    pub column: CategoricalColumn,
    /// Sorted categories seen during fitting; the first one is the dropped reference
    pub categories: Vec<String>,
}

impl EncodedColumn {
    fn fit(column: CategoricalColumn, records: &[UserFeatures]) -> Self {
        let categories: BTreeSet<String> = records
            .iter()
            .map(|r| normalize_category(column.value(r)))
            .collect();

        Self {
            column,
            categories: categories.into_iter().collect(),
        }
    }

    /// Number of output columns
    fn width(&self) -> usize {
        self.categories.len().saturating_sub(1)
    }

    fn transform(
        &self,
        features: &UserFeatures,
        policy: UnknownCategory,
        out: &mut Vec<f64>,
    ) -> Result<(), PredictionError> {
        let value = normalize_category(self.column.value(features));
        let start = out.len();
        out.resize(start + self.width(), 0.0);

        match self.categories.binary_search(&value) {
            Ok(0) => {}
            Ok(position) => out[start + position - 1] = 1.0,
            Err(_) => match policy {
                UnknownCategory::Ignore => {
                    warn!(
                        column = self.column.name(),
                        value = value.as_str(),
                        "unseen category encoded as zeros"
                    );
                }
                UnknownCategory::Error => {
                    out.truncate(start);
                    return Err(PredictionError::UnknownCategory {
                        column: self.column.name().to_string(),
                        value,
                    });
                }
            },
        }

        Ok(())
    }
}

/// Fitted column transformer: scaled numerics followed by one-hot categoricals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub scalers: Vec<ScaledColumn>,
    pub encoders: Vec<EncodedColumn>,
    #[serde(default)]
    pub unknown_category: UnknownCategory,
}

impl Preprocessor {
    /// Fit scaling statistics and category vocabularies on training records
    pub fn fit(records: &[UserFeatures]) -> Result<Self, PredictionError> {
        if records.is_empty() {
            return Err(PredictionError::InsufficientData(
                "cannot fit preprocessor on zero records".to_string(),
            ));
        }

        let scalers = NumericColumn::ALL
            .iter()
            .map(|&column| ScaledColumn::fit(column, records))
            .collect();
        let encoders = CategoricalColumn::ALL
            .iter()
            .map(|&column| EncodedColumn::fit(column, records))
            .collect();

        Ok(Self {
            scalers,
            encoders,
            unknown_category: UnknownCategory::default(),
        })
    }

    /// Return a copy with a different unknown-category policy
    pub fn with_unknown_category(mut self, policy: UnknownCategory) -> Self {
        self.unknown_category = policy;
        self
    }

    /// Check a loaded preprocessor: columns in encoding order, usable scaling
    /// statistics, and category lists sorted without duplicates
    pub fn validate(&self) -> Result<(), PredictionError> {
        let numeric: Vec<NumericColumn> = self.scalers.iter().map(|s| s.column).collect();
        if numeric != NumericColumn::ALL {
            return Err(PredictionError::SchemaMismatch(format!(
                "numeric columns {numeric:?} are not in encoding order"
            )));
        }
        let categorical: Vec<CategoricalColumn> = self.encoders.iter().map(|e| e.column).collect();
        if categorical != CategoricalColumn::ALL {
            return Err(PredictionError::SchemaMismatch(format!(
                "categorical columns {categorical:?} are not in encoding order"
            )));
        }

        for scaler in &self.scalers {
            if !scaler.mean.is_finite() || !scaler.scale.is_finite() || scaler.scale <= 0.0 {
                return Err(PredictionError::SchemaMismatch(format!(
                    "invalid scaling for {}: mean {}, scale {}",
                    scaler.column.name(),
                    scaler.mean,
                    scaler.scale
                )));
            }
        }

        for encoder in &self.encoders {
            let name = encoder.column.name();
            if encoder.categories.is_empty() {
                return Err(PredictionError::SchemaMismatch(format!(
                    "{name} has no categories"
                )));
            }
            if let Some(pair) = encoder.categories.windows(2).find(|w| w[0] >= w[1]) {
                return Err(PredictionError::SchemaMismatch(format!(
                    "{name} categories out of order at '{}' / '{}'",
                    pair[0], pair[1]
                )));
            }
            if let Some(raw) = encoder
                .categories
                .iter()
                .find(|c| normalize_category(c) != **c)
            {
                return Err(PredictionError::SchemaMismatch(format!(
                    "{name} category '{raw}' is not normalized"
                )));
            }
        }

        Ok(())
    }

    /// Width of the encoded feature vector
    pub fn width(&self) -> usize {
        self.scalers.len() + self.encoders.iter().map(EncodedColumn::width).sum::<usize>()
    }

    /// Names of the encoded columns, in output order
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .scalers
            .iter()
            .map(|s| s.column.name().to_string())
            .collect();

        for encoder in &self.encoders {
            for category in encoder.categories.iter().skip(1) {
                names.push(format!("{}_{}", encoder.column.name(), category));
            }
        }

        names
    }

    /// Encode one record
    pub fn transform(&self, features: &UserFeatures) -> Result<Vec<f64>, PredictionError> {
        let mut row = Vec::with_capacity(self.width());

        for scaler in &self.scalers {
            let value = scaler.transform(features);
            if !value.is_finite() {
                return Err(PredictionError::InvalidFeatures(format!(
                    "{} is not a finite number",
                    scaler.column.name()
                )));
            }
            row.push(value);
        }

        for encoder in &self.encoders {
            encoder.transform(features, self.unknown_category, &mut row)?;
        }

        Ok(row)
    }

    /// Encode a batch of records
    pub fn transform_all(
        &self,
        records: &[UserFeatures],
    ) -> Result<Vec<Vec<f64>>, PredictionError> {
        records.iter().map(|r| self.transform(r)).collect()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Canonical spelling of a categorical answer
pub fn normalize_category(value: &str) -> String {
    value.trim().to_lowercase()
}
