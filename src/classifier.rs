//! Risk classification
//!
//! [`RiskClassifier`] is the seam between prediction and whatever model sits
//! behind it. [`RiskModel`] is the trained implementation: a fitted
//! [`Preprocessor`] feeding a [`RiskTree`](crate::tree::RiskTree).

use crate::artifacts::ModelArtifact;
use crate::error::PredictionError;
use crate::preprocessor::Preprocessor;
use crate::types::{RiskLevel, UserFeatures};

/// Anything that can map survey features to a risk level
pub trait RiskClassifier {
    fn classify(&self, features: &UserFeatures) -> Result<RiskLevel, PredictionError>;
}

/// Trained classifier loaded from artifacts
#[derive(Debug)]
pub struct RiskModel {
    preprocessor: Preprocessor,
    artifact: ModelArtifact,
}

impl RiskModel {
    /// Pair a preprocessor with a model, checking that each is well formed and
    /// that the two agree on the encoded columns
    pub fn new(preprocessor: Preprocessor, artifact: ModelArtifact) -> Result<Self, PredictionError> {
        preprocessor.validate()?;
        artifact.tree.validate()?;

        let width = preprocessor.width();
        if artifact.tree.n_features != width {
            return Err(PredictionError::SchemaMismatch(format!(
                "model expects {} features but preprocessor produces {}",
                artifact.tree.n_features, width
            )));
        }

        let names = preprocessor.feature_names();
        if !artifact.feature_names.is_empty() && artifact.feature_names != names {
            return Err(PredictionError::SchemaMismatch(
                "model feature names differ from preprocessor output".to_string(),
            ));
        }

        Ok(Self {
            preprocessor,
            artifact,
        })
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }
}

impl RiskClassifier for RiskModel {
    fn classify(&self, features: &UserFeatures) -> Result<RiskLevel, PredictionError> {
        let row = self.preprocessor.transform(features)?;
        self.artifact.tree.predict(&row)
    }
}
