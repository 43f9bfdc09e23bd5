//! mental-health-score - Student mental health risk prediction with wellbeing recommendations
//!
//! A survey record flows through a deterministic pipeline: request parsing →
//! feature preprocessing → decision tree classification → rule-based
//! recommendation selection. Any failure along the way is reported as a
//! uniform failure record instead of an error.
//!
//! ## Modules
//!
//! - **Prediction**: `request`, `classifier`, `recommender`, `pipeline`
//! - **Model**: `preprocessor`, `tree`, `artifacts`
//! - **Training**: `training`, `smote`, `metrics`

pub mod artifacts;
pub mod classifier;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod preprocessor;
pub mod recommender;
pub mod request;
pub mod smote;
pub mod training;
pub mod tree;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use artifacts::{ArtifactPaths, ModelArtifact, DEFAULT_MODEL_DIR};
pub use classifier::{RiskClassifier, RiskModel};
pub use error::PredictionError;
pub use pipeline::{predict, respond, respond_with};
pub use recommender::recommend;
pub use request::PredictionRequest;
pub use training::{train, TrainingConfig, TrainingOutcome};
pub use types::{FailureResponse, PredictionResponse, Recommendation, RiskLevel, UserFeatures};

/// Crate version recorded in trained artifacts
pub const MHS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for artifacts and reports
pub const PRODUCER_NAME: &str = "mental-health-score";
