//! Core types for mental-health-score
//!
//! This module defines the data structures that flow through prediction:
//! survey features in, a risk level from the classifier, and a recommendation
//! bundle (or a uniform failure record) out.

use serde::{Deserialize, Serialize, Serializer};

/// Message placed in `professional_help` when prediction fails
pub const FAILURE_HELP_MESSAGE: &str = "Error occurred during prediction. Please try again.";

/// Risk level reported when prediction fails
pub const UNKNOWN_RISK: &str = "Unknown";

/// Binary classifier output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Low,
}

impl RiskLevel {
    /// All labels in class order (ties resolve to the first)
    pub const ALL: [RiskLevel; 2] = [RiskLevel::High, RiskLevel::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "High",
            RiskLevel::Low => "Low",
        }
    }

    /// Position of this label in [`RiskLevel::ALL`]
    pub fn index(&self) -> usize {
        match self {
            RiskLevel::High => 0,
            RiskLevel::Low => 1,
        }
    }

    pub fn from_index(index: usize) -> Self {
        if index == 0 {
            RiskLevel::High
        } else {
            RiskLevel::Low
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One student's survey answers, keyed by the survey's column names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFeatures {
    #[serde(rename = "Counseling_Service_Use")]
    pub counseling_service_use: String,
    /// Stress level (0-5)
    #[serde(rename = "Stress_Level")]
    pub stress_level: f64,
    #[serde(rename = "Substance_Use")]
    pub substance_use: String,
    #[serde(rename = "Age")]
    pub age: f64,
    #[serde(rename = "Course")]
    pub course: String,
    #[serde(rename = "Financial_Stress")]
    pub financial_stress: f64,
    #[serde(rename = "Physical_Activity")]
    pub physical_activity: String,
    #[serde(rename = "Extracurricular_Involvement")]
    pub extracurricular_involvement: String,
    #[serde(rename = "Semester_Credit_Load")]
    pub semester_credit_load: f64,
    #[serde(rename = "Family_History")]
    pub family_history: String,
    #[serde(rename = "Chronic_Illness")]
    pub chronic_illness: String,
    /// Anxiety score (0-5), only used for recommendations and labelling
    #[serde(rename = "Anxiety_Score", default)]
    pub anxiety_score: f64,
    /// Depression score (0-5), only used for recommendations and labelling
    #[serde(rename = "Depression_Score", default)]
    pub depression_score: f64,
}

/// Numeric classifier inputs, in encoding order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumericColumn {
    #[serde(rename = "Stress_Level")]
    StressLevel,
    #[serde(rename = "Age")]
    Age,
    #[serde(rename = "Financial_Stress")]
    FinancialStress,
    #[serde(rename = "Semester_Credit_Load")]
    SemesterCreditLoad,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 4] = [
        NumericColumn::StressLevel,
        NumericColumn::Age,
        NumericColumn::FinancialStress,
        NumericColumn::SemesterCreditLoad,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NumericColumn::StressLevel => "Stress_Level",
            NumericColumn::Age => "Age",
            NumericColumn::FinancialStress => "Financial_Stress",
            NumericColumn::SemesterCreditLoad => "Semester_Credit_Load",
        }
    }

    pub fn value(&self, features: &UserFeatures) -> f64 {
        match self {
            NumericColumn::StressLevel => features.stress_level,
            NumericColumn::Age => features.age,
            NumericColumn::FinancialStress => features.financial_stress,
            NumericColumn::SemesterCreditLoad => features.semester_credit_load,
        }
    }
}

/// Categorical classifier inputs, in encoding order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoricalColumn {
    #[serde(rename = "Counseling_Service_Use")]
    CounselingServiceUse,
    #[serde(rename = "Substance_Use")]
    SubstanceUse,
    #[serde(rename = "Course")]
    Course,
    #[serde(rename = "Physical_Activity")]
    PhysicalActivity,
    #[serde(rename = "Extracurricular_Involvement")]
    ExtracurricularInvolvement,
    #[serde(rename = "Family_History")]
    FamilyHistory,
    #[serde(rename = "Chronic_Illness")]
    ChronicIllness,
}

impl CategoricalColumn {
    pub const ALL: [CategoricalColumn; 7] = [
        CategoricalColumn::CounselingServiceUse,
        CategoricalColumn::SubstanceUse,
        CategoricalColumn::Course,
        CategoricalColumn::PhysicalActivity,
        CategoricalColumn::ExtracurricularInvolvement,
        CategoricalColumn::FamilyHistory,
        CategoricalColumn::ChronicIllness,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CategoricalColumn::CounselingServiceUse => "Counseling_Service_Use",
            CategoricalColumn::SubstanceUse => "Substance_Use",
            CategoricalColumn::Course => "Course",
            CategoricalColumn::PhysicalActivity => "Physical_Activity",
            CategoricalColumn::ExtracurricularInvolvement => "Extracurricular_Involvement",
            CategoricalColumn::FamilyHistory => "Family_History",
            CategoricalColumn::ChronicIllness => "Chronic_Illness",
        }
    }

    pub fn value<'a>(&self, features: &'a UserFeatures) -> &'a str {
        match self {
            CategoricalColumn::CounselingServiceUse => &features.counseling_service_use,
            CategoricalColumn::SubstanceUse => &features.substance_use,
            CategoricalColumn::Course => &features.course,
            CategoricalColumn::PhysicalActivity => &features.physical_activity,
            CategoricalColumn::ExtracurricularInvolvement => &features.extracurricular_involvement,
            CategoricalColumn::FamilyHistory => &features.family_history,
            CategoricalColumn::ChronicIllness => &features.chronic_illness,
        }
    }
}

/// Recommendation bundle returned for a successful prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub risk_level: RiskLevel,
    /// Sum of anxiety, stress and depression (0-15)
    #[serde(serialize_with = "serialize_score")]
    pub mental_health_score: f64,
    /// Referral text, absent for low risk with a low score
    pub professional_help: Option<String>,
    pub activities: Vec<String>,
    pub daily_practices: Vec<String>,
}

/// Whole-number scores are written as JSON integers (`9`, not `9.0`)
fn serialize_score<S: Serializer>(score: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if score.fract() == 0.0 && score.abs() <= MAX_EXACT_INTEGER {
        serializer.serialize_i64(*score as i64)
    } else {
        serializer.serialize_f64(*score)
    }
}

/// Largest magnitude below which every integer is exact in an f64
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Uniform record returned when any stage of prediction fails
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureResponse {
    pub error: String,
    pub risk_level: String,
    pub mental_health_score: u32,
    pub professional_help: String,
    pub activities: Vec<String>,
    pub daily_practices: Vec<String>,
}

impl FailureResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            risk_level: UNKNOWN_RISK.to_string(),
            mental_health_score: 0,
            professional_help: FAILURE_HELP_MESSAGE.to_string(),
            activities: Vec::new(),
            daily_practices: Vec::new(),
        }
    }
}

/// What the prediction endpoint writes to its caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionResponse {
    Failure(FailureResponse),
    Success(Recommendation),
}

impl PredictionResponse {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"error":{},"risk_level":"Unknown","mental_health_score":0,"professional_help":"{}","activities":[],"daily_practices":[]}}"#,
                serde_json::Value::String(e.to_string()),
                FAILURE_HELP_MESSAGE
            )
        })
    }
}

impl From<Recommendation> for PredictionResponse {
    fn from(value: Recommendation) -> Self {
        PredictionResponse::Success(value)
    }
}

impl From<FailureResponse> for PredictionResponse {
    fn from(value: FailureResponse) -> Self {
        PredictionResponse::Failure(value)
    }
}
