//! Recommendation selection
//!
//! Maps a risk level and the three sub-scores to a static recommendation
//! bundle. The score bands form a small decision table:
//!
//! | risk | score  | referral           | activities | practices |
//! |------|--------|--------------------|------------|-----------|
//! | High | >= 10  | psychiatrist       | first 3    | 4         |
//! | High | < 10   | psychologist       | first 5    | 3         |
//! | Low  | >= 6   | wellness counselor | first 7    | 2         |
//! | Low  | < 6    | none               | all        | 2         |

use crate::types::{Recommendation, RiskLevel};
use tracing::debug;

/// Score at or above which high-risk users are referred to a psychiatrist
pub const HIGH_RISK_SEVERE_THRESHOLD: f64 = 10.0;

/// Score at or above which low-risk users are pointed to a wellness counselor
pub const LOW_RISK_MODERATE_THRESHOLD: f64 = 6.0;

pub const PSYCHIATRIST_REFERRAL: &str = "Consulter un psychiatre dès que possible.";
pub const PSYCHOLOGIST_REFERRAL: &str = "Consulter un psychologue pour une évaluation.";
pub const WELLNESS_COUNSELOR_SUGGESTION: &str =
    "Envisager de consulter un conseiller en bien-être.";

/// Activity pool used when the caller supplies none
pub const DEFAULT_ACTIVITIES: [&str; 10] = [
    "Méditation et pleine conscience",
    "Exercice physique régulier",
    "Yoga ou étirements",
    "Lecture",
    "Écouter de la musique",
    "Passer du temps dans la nature",
    "Tenir un journal",
    "Peinture ou dessin",
    "Rejoindre un club social",
    "Faire du bénévolat",
];

const SEVERE_PRACTICES: [&str; 4] = [
    "Pratiquer des exercices de respiration profonde plusieurs fois par jour",
    "Maintenir une routine de sommeil régulière",
    "Limiter la consommation de caféine et d'alcool",
    "Prendre des pauses régulières pendant les périodes de travail intense",
];

const ELEVATED_PRACTICES: [&str; 3] = [
    "Pratiquer la pleine conscience pendant 10 minutes chaque jour",
    "Faire de l'exercice physique modéré 3 fois par semaine",
    "Maintenir des contacts sociaux réguliers",
];

const MODERATE_PRACTICES: [&str; 2] = [
    "Pratiquer une activité relaxante chaque jour",
    "Maintenir un équilibre entre travail et loisirs",
];

const BALANCED_PRACTICES: [&str; 2] = [
    "Continuer à maintenir un mode de vie équilibré",
    "Pratiquer des activités qui vous apportent de la joie régulièrement",
];

/// Row of the decision table, selected by risk level and score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CareBand {
    /// High risk, score >= 10
    Severe,
    /// High risk, score < 10
    Elevated,
    /// Low risk, score >= 6
    Moderate,
    /// Low risk, score < 6
    Balanced,
}

/// What a band prescribes
#[derive(Debug, Clone, Copy)]
pub struct CarePolicy {
    pub professional_help: Option<&'static str>,
    /// Prefix length taken from the activity pool (`None` keeps the whole pool)
    pub activity_limit: Option<usize>,
    pub daily_practices: &'static [&'static str],
}

impl CareBand {
    pub fn select(risk: RiskLevel, score: f64) -> Self {
        match risk {
            RiskLevel::High if score >= HIGH_RISK_SEVERE_THRESHOLD => CareBand::Severe,
            RiskLevel::High => CareBand::Elevated,
            RiskLevel::Low if score >= LOW_RISK_MODERATE_THRESHOLD => CareBand::Moderate,
            RiskLevel::Low => CareBand::Balanced,
        }
    }

    pub fn policy(&self) -> CarePolicy {
        match self {
            CareBand::Severe => CarePolicy {
                professional_help: Some(PSYCHIATRIST_REFERRAL),
                activity_limit: Some(3),
                daily_practices: &SEVERE_PRACTICES,
            },
            CareBand::Elevated => CarePolicy {
                professional_help: Some(PSYCHOLOGIST_REFERRAL),
                activity_limit: Some(5),
                daily_practices: &ELEVATED_PRACTICES,
            },
            CareBand::Moderate => CarePolicy {
                professional_help: Some(WELLNESS_COUNSELOR_SUGGESTION),
                activity_limit: Some(7),
                daily_practices: &MODERATE_PRACTICES,
            },
            CareBand::Balanced => CarePolicy {
                professional_help: None,
                activity_limit: None,
                daily_practices: &BALANCED_PRACTICES,
            },
        }
    }
}

/// Build the recommendation bundle for a risk level and its sub-scores.
///
/// `activities` is the caller's preferred pool; `None` or an empty slice
/// falls back to [`DEFAULT_ACTIVITIES`].
pub fn recommend(
    risk: RiskLevel,
    anxiety: f64,
    stress: f64,
    depression: f64,
    activities: Option<&[String]>,
) -> Recommendation {
    let score = anxiety + stress + depression;

    let pool: Vec<String> = match activities {
        Some(list) if !list.is_empty() => list.to_vec(),
        _ => DEFAULT_ACTIVITIES.iter().map(|a| a.to_string()).collect(),
    };

    let band = CareBand::select(risk, score);
    let policy = band.policy();
    debug!(?band, score, risk = risk.as_str(), "selected care band");

    let activities = match policy.activity_limit {
        Some(limit) => pool.into_iter().take(limit).collect(),
        None => pool,
    };

    Recommendation {
        risk_level: risk,
        mental_health_score: score,
        professional_help: policy.professional_help.map(str::to_string),
        activities,
        daily_practices: policy
            .daily_practices
            .iter()
            .map(|p| p.to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    fn favorites() -> Vec<String> {
        [
            "Jogging",
            "Natation",
            "Méditation",
            "Jeux vidéo",
            "Cuisine",
            "Photographie",
            "Randonnée",
            "Cinéma",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    /// Sub-score in the survey's 0-5 range, in half steps
    fn sub_score(raw: u8) -> f64 {
        (raw % 11) as f64 / 2.0
    }

    #[test]
    fn test_high_risk_moderate_score() {
        let activities = favorites();
        let rec = recommend(RiskLevel::High, 3.0, 4.0, 2.0, Some(&activities));

        assert_eq!(rec.mental_health_score, 9.0);
        assert_eq!(rec.professional_help.as_deref(), Some(PSYCHOLOGIST_REFERRAL));
        assert_eq!(rec.activities, activities[..5].to_vec());
        assert_eq!(rec.daily_practices.len(), 3);
    }

    #[test]
    fn test_high_risk_severe_score() {
        let rec = recommend(RiskLevel::High, 5.0, 4.0, 1.0, None);

        assert_eq!(rec.mental_health_score, 10.0);
        assert_eq!(rec.professional_help.as_deref(), Some(PSYCHIATRIST_REFERRAL));
        assert_eq!(
            rec.activities,
            vec![
                "Méditation et pleine conscience".to_string(),
                "Exercice physique régulier".to_string(),
                "Yoga ou étirements".to_string(),
            ]
        );
        assert_eq!(rec.daily_practices.len(), 4);
    }

    #[test]
    fn test_low_risk_moderate_score() {
        let rec = recommend(RiskLevel::Low, 2.0, 2.0, 2.0, None);

        assert_eq!(
            rec.professional_help.as_deref(),
            Some(WELLNESS_COUNSELOR_SUGGESTION)
        );
        assert_eq!(rec.activities.len(), 7);
        assert_eq!(rec.daily_practices.len(), 2);
    }

    #[test]
    fn test_low_risk_low_score_keeps_full_pool() {
        let activities = favorites();
        let rec = recommend(RiskLevel::Low, 1.0, 2.0, 1.0, Some(&activities));

        assert_eq!(rec.professional_help, None);
        assert_eq!(rec.activities, activities);
        assert_eq!(
            rec.daily_practices,
            vec![
                "Continuer à maintenir un mode de vie équilibré".to_string(),
                "Pratiquer des activités qui vous apportent de la joie régulièrement".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_activities_fall_back_to_defaults() {
        let rec = recommend(RiskLevel::Low, 0.0, 0.0, 0.0, Some(&[][..]));
        assert_eq!(rec.activities.len(), DEFAULT_ACTIVITIES.len());
        assert_eq!(rec.activities[0], DEFAULT_ACTIVITIES[0]);
    }

    #[test]
    fn test_short_pool_is_not_padded() {
        let activities = vec!["Jogging".to_string()];
        let rec = recommend(RiskLevel::High, 5.0, 5.0, 5.0, Some(&activities));
        assert_eq!(rec.activities, activities);
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(CareBand::select(RiskLevel::High, 10.0), CareBand::Severe);
        assert_eq!(CareBand::select(RiskLevel::High, 9.5), CareBand::Elevated);
        assert_eq!(CareBand::select(RiskLevel::Low, 6.0), CareBand::Moderate);
        assert_eq!(CareBand::select(RiskLevel::Low, 5.5), CareBand::Balanced);
    }

    #[quickcheck]
    fn prop_score_is_exact_sum(a: u8, s: u8, d: u8) -> bool {
        let (a, s, d) = (sub_score(a), sub_score(s), sub_score(d));
        let risk = if a > s { RiskLevel::High } else { RiskLevel::Low };
        recommend(risk, a, s, d, None).mental_health_score == a + s + d
    }

    #[quickcheck]
    fn prop_high_risk_bands(a: u8, s: u8, d: u8, pool: Vec<String>) -> bool {
        let (a, s, d) = (sub_score(a), sub_score(s), sub_score(d));
        let rec = recommend(RiskLevel::High, a, s, d, Some(&pool));
        if a + s + d >= 10.0 {
            rec.professional_help.as_deref() == Some(PSYCHIATRIST_REFERRAL)
                && rec.activities.len() <= 3
        } else {
            rec.professional_help.as_deref() == Some(PSYCHOLOGIST_REFERRAL)
                && rec.activities.len() <= 5
        }
    }

    #[quickcheck]
    fn prop_low_risk_bands(a: u8, s: u8, d: u8, pool: Vec<String>) -> bool {
        let (a, s, d) = (sub_score(a), sub_score(s), sub_score(d));
        let rec = recommend(RiskLevel::Low, a, s, d, Some(&pool));
        let expected_pool: Vec<String> = if pool.is_empty() {
            DEFAULT_ACTIVITIES.iter().map(|x| x.to_string()).collect()
        } else {
            pool.clone()
        };
        if a + s + d >= 6.0 {
            rec.professional_help.as_deref() == Some(WELLNESS_COUNSELOR_SUGGESTION)
                && rec.activities.len() <= 7
                && expected_pool.starts_with(&rec.activities)
        } else {
            rec.professional_help.is_none() && rec.activities == expected_pool
        }
    }
}
