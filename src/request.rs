//! Prediction request parsing
//!
//! The endpoint accepts `{"input_data": {...}, "favorite_activities": [...]}`.
//! `input_data` is kept as raw JSON until it is decoded so that a malformed
//! feature record and a malformed envelope report different messages.

use crate::error::PredictionError;
use crate::types::UserFeatures;
use serde::{Deserialize, Serialize};

/// Envelope read from the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(default)]
    pub input_data: Option<serde_json::Value>,
    #[serde(default)]
    pub favorite_activities: Option<Vec<String>>,
}

impl PredictionRequest {
    pub fn parse(raw_json: &str) -> Result<Self, PredictionError> {
        Ok(serde_json::from_str(raw_json)?)
    }

    /// Decode `input_data` into survey features
    pub fn features(&self) -> Result<UserFeatures, PredictionError> {
        let value = self
            .input_data
            .as_ref()
            .filter(|v| !v.is_null())
            .ok_or_else(|| PredictionError::MissingField("input_data".to_string()))?;

        if !value.is_object() {
            return Err(PredictionError::InvalidFeatures(
                "input_data must be a JSON object".to_string(),
            ));
        }

        UserFeatures::deserialize(value)
            .map_err(|e| PredictionError::InvalidFeatures(e.to_string()))
    }

    pub fn activities(&self) -> Option<&[String]> {
        self.favorite_activities.as_deref()
    }
}
