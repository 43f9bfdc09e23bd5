//! Pipeline orchestration
//!
//! This module provides the public prediction API. It runs a request through
//! every stage and turns any failure into the uniform failure record:
//! 1. PredictionRequest - Parse the caller's JSON envelope
//! 2. ArtifactPaths - Load the classifier fresh for this call
//! 3. RiskClassifier - Predict the risk level from survey features
//! 4. recommend - Select the recommendation bundle

use crate::artifacts::ArtifactPaths;
use crate::classifier::RiskClassifier;
use crate::error::PredictionError;
use crate::recommender::recommend;
use crate::request::PredictionRequest;
use crate::types::{FailureResponse, PredictionResponse, Recommendation};
use tracing::{debug, warn};

/// Predict and recommend for a parsed request.
///
/// # Example
/// ```ignore
/// let model = ArtifactPaths::default().load()?;
/// let recommendation = predict(&request, &model)?;
/// ```
pub fn predict(
    request: &PredictionRequest,
    classifier: &dyn RiskClassifier,
) -> Result<Recommendation, PredictionError> {
    let features = request.features()?;
    let risk = classifier.classify(&features)?;
    debug!(risk = risk.as_str(), "classified request");

    Ok(recommend(
        risk,
        features.anxiety_score,
        features.stress_level,
        features.depression_score,
        request.activities(),
    ))
}

/// Handle a raw JSON request end to end, loading artifacts from `artifacts`.
///
/// Never fails: errors come back as [`PredictionResponse::Failure`].
pub fn respond(raw_json: &str, artifacts: &ArtifactPaths) -> PredictionResponse {
    let result = PredictionRequest::parse(raw_json).and_then(|request| {
        let model = artifacts.load()?;
        predict(&request, &model)
    });
    into_response(result)
}

/// Handle a raw JSON request end to end with an injected classifier
pub fn respond_with(raw_json: &str, classifier: &dyn RiskClassifier) -> PredictionResponse {
    let result =
        PredictionRequest::parse(raw_json).and_then(|request| predict(&request, classifier));
    into_response(result)
}

fn into_response(result: Result<Recommendation, PredictionError>) -> PredictionResponse {
    match result {
        Ok(recommendation) => PredictionResponse::Success(recommendation),
        Err(e) => {
            warn!(error = %e, "prediction failed, returning failure record");
            PredictionResponse::Failure(FailureResponse::new(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::ModelArtifact;
    use crate::preprocessor::tests::student;
    use crate::preprocessor::Preprocessor;
    use crate::recommender::{PSYCHIATRIST_REFERRAL, PSYCHOLOGIST_REFERRAL};
    use crate::tree::tests::corrupt_split_features;
    use crate::tree::{RiskTree, TreeParams};
    use crate::types::{RiskLevel, UserFeatures, FAILURE_HELP_MESSAGE};

    /// Classifier that always answers the same way
    struct FixedRisk(RiskLevel);

    impl RiskClassifier for FixedRisk {
        fn classify(&self, _features: &UserFeatures) -> Result<RiskLevel, PredictionError> {
            Ok(self.0)
        }
    }

    /// Classifier that always fails
    struct Broken;

    impl RiskClassifier for Broken {
        fn classify(&self, _features: &UserFeatures) -> Result<RiskLevel, PredictionError> {
            Err(PredictionError::SchemaMismatch("broken model".to_string()))
        }
    }

    fn sample_request() -> &'static str {
        r#"{
            "input_data": {
                "Counseling_Service_Use": "never",
                "Stress_Level": 4,
                "Substance_Use": "never",
                "Age": 22,
                "Course": "computer science",
                "Financial_Stress": 3,
                "Physical_Activity": "low",
                "Extracurricular_Involvement": "low",
                "Semester_Credit_Load": 18,
                "Family_History": "no",
                "Chronic_Illness": "no",
                "Anxiety_Score": 3,
                "Depression_Score": 2
            },
            "favorite_activities": [
                "Jogging", "Natation", "Méditation", "Jeux vidéo",
                "Cuisine", "Photographie", "Randonnée", "Cinéma"
            ]
        }"#
    }

    fn assert_failure(response: &PredictionResponse) -> &FailureResponse {
        match response {
            PredictionResponse::Failure(failure) => {
                assert_eq!(failure.risk_level, "Unknown");
                assert_eq!(failure.mental_health_score, 0);
                assert_eq!(failure.professional_help, FAILURE_HELP_MESSAGE);
                assert!(failure.activities.is_empty());
                assert!(failure.daily_practices.is_empty());
                failure
            }
            PredictionResponse::Success(rec) => panic!("expected failure, got {rec:?}"),
        }
    }

    #[test]
    fn test_high_risk_request_end_to_end() {
        let response = respond_with(sample_request(), &FixedRisk(RiskLevel::High));

        let json = response.to_json();
        assert!(json.contains(r#""mental_health_score":9,"#));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["risk_level"], "High");
        assert_eq!(value["professional_help"], PSYCHOLOGIST_REFERRAL);
        assert_eq!(
            value["activities"],
            serde_json::json!(["Jogging", "Natation", "Méditation", "Jeux vidéo", "Cuisine"])
        );
        assert_eq!(value["daily_practices"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_score_uses_stress_level_feature() {
        let raw = sample_request().replace(r#""Stress_Level": 4"#, r#""Stress_Level": 5"#);
        let raw = raw.replace(r#""Depression_Score": 2"#, r#""Depression_Score": 2.5"#);
        let response = respond_with(&raw, &FixedRisk(RiskLevel::High));

        match response {
            PredictionResponse::Success(rec) => {
                assert_eq!(rec.mental_health_score, 10.5);
                assert_eq!(rec.professional_help.as_deref(), Some(PSYCHIATRIST_REFERRAL));
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_json_yields_failure() {
        let response = respond_with("{ not json", &FixedRisk(RiskLevel::Low));
        let failure = assert_failure(&response);
        assert!(failure.error.starts_with("Invalid JSON"));
    }

    #[test]
    fn test_classifier_error_yields_failure() {
        let response = respond_with(sample_request(), &Broken);
        let failure = assert_failure(&response);
        assert!(failure.error.contains("broken model"));
    }

    #[test]
    fn test_missing_artifacts_yield_failure() {
        let dir = tempfile::tempdir().unwrap();
        let response = respond(sample_request(), &ArtifactPaths::new(dir.path()));
        let failure = assert_failure(&response);
        assert!(failure.error.contains("Model artifact not found"));
    }

    #[test]
    fn test_inconsistent_artifact_yields_failure() {
        let records: Vec<UserFeatures> = (0..6)
            .map(|i| student("law", i as f64, 20.0, "low"))
            .collect();
        let labels: Vec<RiskLevel> = (0..6)
            .map(|i| if i < 3 { RiskLevel::Low } else { RiskLevel::High })
            .collect();
        let pre = Preprocessor::fit(&records).unwrap();
        let rows = pre.transform_all(&records).unwrap();
        let tree = RiskTree::fit(&rows, &labels, TreeParams::default()).unwrap();
        let artifact = ModelArtifact::new(tree, pre.feature_names());

        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path());
        paths.save(&pre, &artifact).unwrap();
        let mut value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(paths.model()).unwrap()).unwrap();
        corrupt_split_features(&mut value);
        std::fs::write(paths.model(), value.to_string()).unwrap();

        let response = respond(sample_request(), &paths);
        let failure = assert_failure(&response);
        assert!(failure.error.starts_with("Schema mismatch"));
    }

    #[test]
    fn test_malformed_json_wins_over_missing_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let response = respond("[", &ArtifactPaths::new(dir.path()));
        let failure = assert_failure(&response);
        assert!(failure.error.starts_with("Invalid JSON"));
    }
}
