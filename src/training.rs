//! Offline training
//!
//! Fits the artifacts that prediction loads. The pipeline follows a fixed
//! order: label derivation → stratified split → preprocessor fit → SMOTE
//! rebalancing → tree fit → held-out evaluation.

use crate::artifacts::ModelArtifact;
use crate::error::PredictionError;
use crate::metrics::EvaluationReport;
use crate::preprocessor::Preprocessor;
use crate::smote::{Smote, DEFAULT_K_NEIGHBORS};
use crate::tree::{RiskTree, TreeParams};
use crate::types::{RiskLevel, UserFeatures};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Sub-score at or above which a survey row is labelled high risk
pub const RISK_LABEL_THRESHOLD: f64 = 3.0;

/// Training knobs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fraction of each class held out for evaluation
    pub test_size: f64,
    pub seed: u64,
    pub tree: TreeParams,
    pub smote_neighbors: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            tree: TreeParams::default(),
            smote_neighbors: DEFAULT_K_NEIGHBORS,
        }
    }
}

/// Everything produced by one training run
#[derive(Debug)]
pub struct TrainingOutcome {
    pub preprocessor: Preprocessor,
    pub artifact: ModelArtifact,
    pub report: EvaluationReport,
    pub summary: TrainingSummary,
}

/// Sample counts recorded during training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub records: usize,
    pub train_samples: usize,
    pub test_samples: usize,
    /// Training samples after rebalancing
    pub resampled_samples: usize,
    /// Label counts over all records, indexed by [`RiskLevel::index`]
    pub class_counts: [usize; 2],
    pub tree_depth: usize,
    pub tree_leaves: usize,
}

/// Label a survey row: high risk when any sub-score reaches the threshold
pub fn derive_risk(features: &UserFeatures) -> RiskLevel {
    if features.stress_level >= RISK_LABEL_THRESHOLD
        || features.depression_score >= RISK_LABEL_THRESHOLD
        || features.anxiety_score >= RISK_LABEL_THRESHOLD
    {
        RiskLevel::High
    } else {
        RiskLevel::Low
    }
}

/// Split indices into (train, test), holding out `test_size` of each class
pub fn stratified_split(
    labels: &[RiskLevel],
    test_size: f64,
    seed: u64,
) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in RiskLevel::ALL {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == class)
            .map(|(i, _)| i)
            .collect();
        members.shuffle(&mut rng);

        let held_out = ((members.len() as f64) * test_size).round() as usize;
        let held_out = held_out.min(members.len().saturating_sub(1));
        test.extend_from_slice(&members[..held_out]);
        train.extend_from_slice(&members[held_out..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

/// Run the full training pipeline
pub fn train(
    records: &[UserFeatures],
    config: &TrainingConfig,
) -> Result<TrainingOutcome, PredictionError> {
    if !(config.test_size > 0.0 && config.test_size < 1.0) {
        return Err(PredictionError::TrainingError(format!(
            "test_size must be between 0 and 1, got {}",
            config.test_size
        )));
    }
    if records.is_empty() {
        return Err(PredictionError::InsufficientData(
            "no training records".to_string(),
        ));
    }

    let labels: Vec<RiskLevel> = records.iter().map(derive_risk).collect();
    let mut class_counts = [0usize; 2];
    for label in &labels {
        class_counts[label.index()] += 1;
    }
    info!(
        records = records.len(),
        high = class_counts[0],
        low = class_counts[1],
        "derived risk labels"
    );

    let (train_idx, test_idx) = stratified_split(&labels, config.test_size, config.seed);
    if train_idx.is_empty() || test_idx.is_empty() {
        return Err(PredictionError::InsufficientData(format!(
            "split left {} training and {} test samples",
            train_idx.len(),
            test_idx.len()
        )));
    }

    let train_records: Vec<UserFeatures> = train_idx.iter().map(|&i| records[i].clone()).collect();
    let train_labels: Vec<RiskLevel> = train_idx.iter().map(|&i| labels[i]).collect();
    let test_records: Vec<UserFeatures> = test_idx.iter().map(|&i| records[i].clone()).collect();
    let test_labels: Vec<RiskLevel> = test_idx.iter().map(|&i| labels[i]).collect();

    let preprocessor = Preprocessor::fit(&train_records)?;
    let train_rows = preprocessor.transform_all(&train_records)?;

    let smote = Smote::new(config.smote_neighbors, config.seed);
    let (resampled_rows, resampled_labels) = smote.resample(&train_rows, &train_labels)?;
    info!(
        before = train_rows.len(),
        after = resampled_rows.len(),
        "rebalanced training split"
    );

    let tree = RiskTree::fit(&resampled_rows, &resampled_labels, config.tree)?;
    info!(
        depth = tree.depth(),
        leaves = tree.leaf_count(),
        "fitted decision tree"
    );

    let test_rows = preprocessor.transform_all(&test_records)?;
    let predicted = tree.predict_all(&test_rows)?;
    let report = EvaluationReport::compute(&test_labels, &predicted)?;
    info!(
        accuracy = report.accuracy,
        weighted_f1 = report.weighted_f1,
        "evaluated on held-out split"
    );

    let summary = TrainingSummary {
        records: records.len(),
        train_samples: train_rows.len(),
        test_samples: test_rows.len(),
        resampled_samples: resampled_rows.len(),
        class_counts,
        tree_depth: tree.depth(),
        tree_leaves: tree.leaf_count(),
    };
    let artifact = ModelArtifact::new(tree, preprocessor.feature_names());

    Ok(TrainingOutcome {
        preprocessor,
        artifact,
        report,
        summary,
    })
}

/// Parse a JSON array of survey records
pub fn parse_records(json: &str) -> Result<Vec<UserFeatures>, PredictionError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::ArtifactPaths;
    use crate::classifier::RiskClassifier;
    use crate::pipeline::respond;
    use crate::preprocessor::tests::student;
    use crate::recommender::recommend;
    use crate::types::PredictionResponse;

    /// 40 records; stress drives the label, with a few anxiety-driven highs
    fn survey() -> Vec<UserFeatures> {
        let courses = ["law", "medicine", "engineering", "business"];
        let activities = ["low", "moderate", "high"];
        (0..40)
            .map(|i| {
                let stress = (i % 6) as f64;
                let mut record = student(
                    courses[i % courses.len()],
                    stress,
                    18.0 + (i % 7) as f64,
                    activities[i % activities.len()],
                );
                record.anxiety_score = if i % 10 == 0 { 4.0 } else { 1.0 };
                record.depression_score = 1.0;
                record
            })
            .collect()
    }

    #[test]
    fn test_derive_risk_rule() {
        let mut record = student("law", 2.0, 20.0, "low");
        record.anxiety_score = 2.9;
        record.depression_score = 0.0;
        assert_eq!(derive_risk(&record), RiskLevel::Low);

        record.depression_score = 3.0;
        assert_eq!(derive_risk(&record), RiskLevel::High);

        record.depression_score = 0.0;
        record.stress_level = 3.0;
        assert_eq!(derive_risk(&record), RiskLevel::High);
    }

    #[test]
    fn test_stratified_split_keeps_class_shares() {
        let labels: Vec<RiskLevel> = (0..50)
            .map(|i| if i < 30 { RiskLevel::High } else { RiskLevel::Low })
            .collect();
        let (train, test) = stratified_split(&labels, 0.2, 42);

        assert_eq!(train.len() + test.len(), 50);
        assert_eq!(test.len(), 10);
        let test_high = test.iter().filter(|&&i| labels[i] == RiskLevel::High).count();
        assert_eq!(test_high, 6);
        assert!(train.iter().all(|i| !test.contains(i)));
    }

    #[test]
    fn test_stratified_split_is_seeded() {
        let labels: Vec<RiskLevel> = (0..20)
            .map(|i| if i % 3 == 0 { RiskLevel::Low } else { RiskLevel::High })
            .collect();
        assert_eq!(
            stratified_split(&labels, 0.25, 9),
            stratified_split(&labels, 0.25, 9)
        );
    }

    #[test]
    fn test_train_produces_consistent_artifacts() {
        let records = survey();
        let outcome = train(&records, &TrainingConfig::default()).unwrap();

        assert_eq!(outcome.summary.records, 40);
        assert_eq!(
            outcome.summary.train_samples + outcome.summary.test_samples,
            40
        );
        assert!(outcome.summary.resampled_samples >= outcome.summary.train_samples);
        assert_eq!(outcome.artifact.tree.n_features, outcome.preprocessor.width());
        assert_eq!(outcome.artifact.feature_names, outcome.preprocessor.feature_names());
        assert!(outcome.summary.tree_depth <= 5);
        assert!(outcome.report.accuracy >= 0.0 && outcome.report.accuracy <= 1.0);
        assert_eq!(outcome.report.samples, outcome.summary.test_samples);
    }

    #[test]
    fn test_train_save_load_predict() {
        let records = survey();
        let outcome = train(&records, &TrainingConfig::default()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path());
        paths.save(&outcome.preprocessor, &outcome.artifact).unwrap();
        let model = paths.load().unwrap();

        for record in &records {
            let in_memory = outcome
                .artifact
                .tree
                .predict(&outcome.preprocessor.transform(record).unwrap())
                .unwrap();
            assert_eq!(model.classify(record).unwrap(), in_memory);
        }
    }

    #[test]
    fn test_trained_artifacts_answer_stdin_requests() {
        let records = survey();
        let outcome = train(&records, &TrainingConfig::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path());
        paths.save(&outcome.preprocessor, &outcome.artifact).unwrap();
        let model = paths.load().unwrap();

        let favorites: Vec<String> = (1..=8).map(|i| format!("Activité {i}")).collect();
        for record in records.iter().take(12) {
            let raw = serde_json::json!({
                "input_data": record,
                "favorite_activities": favorites,
            })
            .to_string();

            let risk = model.classify(record).unwrap();
            let expected = recommend(
                risk,
                record.anxiety_score,
                record.stress_level,
                record.depression_score,
                Some(&favorites),
            );

            match respond(&raw, &paths) {
                PredictionResponse::Success(rec) => {
                    assert_eq!(rec, expected);
                    assert_eq!(
                        rec.mental_health_score,
                        record.anxiety_score + record.stress_level + record.depression_score
                    );
                }
                PredictionResponse::Failure(failure) => {
                    panic!("expected success, got {}", failure.error)
                }
            }
        }
    }

    #[test]
    fn test_stress_only_labels_are_learned() {
        let records: Vec<UserFeatures> = (0..30)
            .map(|i| {
                let mut r = student("law", (i % 6) as f64, 20.0, "low");
                r.anxiety_score = 0.0;
                r.depression_score = 0.0;
                r
            })
            .collect();
        let outcome = train(&records, &TrainingConfig::default()).unwrap();
        assert_eq!(outcome.report.accuracy, 1.0);
    }

    #[test]
    fn test_train_rejects_bad_config() {
        let config = TrainingConfig {
            test_size: 1.5,
            ..TrainingConfig::default()
        };
        assert!(matches!(
            train(&survey(), &config),
            Err(PredictionError::TrainingError(_))
        ));
    }

    #[test]
    fn test_train_rejects_tiny_dataset() {
        let records = vec![student("law", 1.0, 20.0, "low")];
        assert!(matches!(
            train(&records, &TrainingConfig::default()),
            Err(PredictionError::InsufficientData(_))
        ));
        assert!(matches!(
            train(&[], &TrainingConfig::default()),
            Err(PredictionError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_parse_records() {
        let json = serde_json::to_string(&survey()[..2]).unwrap();
        let records = parse_records(&json).unwrap();
        assert_eq!(records.len(), 2);
    }
}
