//! Error types for mental-health-score

use thiserror::Error;

/// Errors that can occur while predicting, loading artifacts, or training
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid features: {0}")]
    InvalidFeatures(String),

    #[error("Unknown category '{value}' for column {column}")]
    UnknownCategory { column: String, value: String },

    #[error("Model artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Training error: {0}")]
    TrainingError(String),
}
