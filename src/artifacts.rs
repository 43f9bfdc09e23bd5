//! Model artifact persistence
//!
//! Training writes two JSON files into a model directory and every prediction
//! reads them back:
//! - `mental_health_model.json` holds the [`ModelArtifact`]
//! - `preprocessor.json` holds the fitted [`Preprocessor`]

use crate::classifier::RiskModel;
use crate::error::PredictionError;
use crate::preprocessor::Preprocessor;
use crate::tree::{RiskTree, TreeParams};
use crate::MHS_VERSION;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Model directory used when none is configured
pub const DEFAULT_MODEL_DIR: &str = "model";

/// File name of the serialized classifier
pub const MODEL_FILE: &str = "mental_health_model.json";

/// File name of the serialized preprocessor
pub const PREPROCESSOR_FILE: &str = "preprocessor.json";

/// Trained tree plus provenance
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model_id: String,
    pub trained_at: DateTime<Utc>,
    pub producer_version: String,
    pub params: TreeParams,
    /// Encoded column names the tree was trained on
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub tree: RiskTree,
}

impl ModelArtifact {
    /// Wrap a freshly trained tree with a new id and timestamp
    pub fn new(tree: RiskTree, feature_names: Vec<String>) -> Self {
        Self {
            model_id: Uuid::new_v4().to_string(),
            trained_at: Utc::now(),
            producer_version: MHS_VERSION.to_string(),
            params: tree.params,
            feature_names,
            tree,
        }
    }
}

/// Locations of the two artifacts inside a model directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    dir: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_DIR)
    }
}

impl ArtifactPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    pub fn preprocessor(&self) -> PathBuf {
        self.dir.join(PREPROCESSOR_FILE)
    }

    /// Read both artifacts and assemble a classifier
    pub fn load(&self) -> Result<RiskModel, PredictionError> {
        let model_path = self.model();
        let preprocessor_path = self.preprocessor();
        debug!(model = %model_path.display(), preprocessor = %preprocessor_path.display(), "loading artifacts");

        let artifact: ModelArtifact = serde_json::from_str(&read_artifact(&model_path)?)?;
        let preprocessor = Preprocessor::from_json(&read_artifact(&preprocessor_path)?)?;

        RiskModel::new(preprocessor, artifact)
    }

    /// Write both artifacts, creating the directory if needed
    pub fn save(
        &self,
        preprocessor: &Preprocessor,
        artifact: &ModelArtifact,
    ) -> Result<(), PredictionError> {
        fs::create_dir_all(&self.dir).map_err(|source| PredictionError::Io {
            path: self.dir.display().to_string(),
            source,
        })?;

        write_artifact(&self.model(), &serde_json::to_string_pretty(artifact)?)?;
        write_artifact(&self.preprocessor(), &preprocessor.to_json()?)?;
        Ok(())
    }
}

fn read_artifact(path: &Path) -> Result<String, PredictionError> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            PredictionError::ArtifactNotFound(path.display().to_string())
        } else {
            PredictionError::Io {
                path: path.display().to_string(),
                source,
            }
        }
    })
}

fn write_artifact(path: &Path, contents: &str) -> Result<(), PredictionError> {
    fs::write(path, contents).map_err(|source| PredictionError::Io {
        path: path.display().to_string(),
        source,
    })
}
