//! mhscore CLI - Command-line interface for mental-health-score
//!
//! Commands:
//! - predict: Read one request from stdin, write one response to stdout
//! - recommend: Run the recommendation selector directly
//! - train: Fit and save model artifacts from survey records
//! - doctor: Diagnose model artifacts and environment
//! - schema: Print request/response schemas

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;

use mental_health_score::artifacts::{ArtifactPaths, DEFAULT_MODEL_DIR};
use mental_health_score::metrics::EvaluationReport;
use mental_health_score::recommender::recommend;
use mental_health_score::training::{parse_records, train, TrainingConfig, TrainingSummary};
use mental_health_score::tree::{TreeParams, DEFAULT_MAX_DEPTH, DEFAULT_MIN_SAMPLES_SPLIT};
use mental_health_score::types::{FailureResponse, PredictionResponse, RiskLevel};
use mental_health_score::{respond, MHS_VERSION, PRODUCER_NAME};

/// mhscore - Student mental health risk prediction and recommendations
#[derive(Parser)]
#[command(name = "mhscore")]
#[command(version = MHS_VERSION)]
#[command(about = "Predict mental health risk and recommend wellbeing activities", long_about = None)]
struct Cli {
    /// Directory holding the model artifacts
    #[arg(long, global = true, env = "MHS_MODEL_DIR", default_value = DEFAULT_MODEL_DIR)]
    model_dir: PathBuf,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a prediction request from stdin and write the response to stdout
    Predict {
        /// Pretty-print the response
        #[arg(long)]
        pretty: bool,
    },

    /// Select recommendations for a known risk level
    Recommend {
        /// Risk level
        #[arg(long, value_enum)]
        risk: RiskArg,

        /// Anxiety score (0-5)
        #[arg(long, default_value = "0")]
        anxiety: f64,

        /// Stress level (0-5)
        #[arg(long, default_value = "0")]
        stress: f64,

        /// Depression score (0-5)
        #[arg(long, default_value = "0")]
        depression: f64,

        /// Favorite activity (repeat to build the pool, in order)
        #[arg(long = "activity")]
        activities: Vec<String>,

        /// Pretty-print the response
        #[arg(long)]
        pretty: bool,
    },

    /// Train a classifier from a JSON array of survey records
    Train {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Maximum tree depth
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH, conflicts_with = "unbounded_depth")]
        max_depth: usize,

        /// Grow the tree until leaves are pure
        #[arg(long)]
        unbounded_depth: bool,

        /// Minimum samples required to split a node
        #[arg(long, default_value_t = DEFAULT_MIN_SAMPLES_SPLIT)]
        min_samples_split: usize,

        /// Fraction of records held out for evaluation
        #[arg(long, default_value = "0.2")]
        test_size: f64,

        /// Seed for the split and for SMOTE
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output the training report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose model artifacts and environment
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RiskArg {
    High,
    Low,
}

impl From<RiskArg> for RiskLevel {
    fn from(value: RiskArg) -> Self {
        match value {
            RiskArg::High => RiskLevel::High,
            RiskArg::Low => RiskLevel::Low,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Prediction request read from stdin
    Input,
    /// Prediction response written to stdout
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; stdout is reserved for responses
fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), MhsCliError> {
    let paths = ArtifactPaths::new(cli.model_dir);

    match cli.command {
        Commands::Predict { pretty } => cmd_predict(&paths, pretty),

        Commands::Recommend {
            risk,
            anxiety,
            stress,
            depression,
            activities,
            pretty,
        } => cmd_recommend(risk.into(), anxiety, stress, depression, &activities, pretty),

        Commands::Train {
            input,
            max_depth,
            unbounded_depth,
            min_samples_split,
            test_size,
            seed,
            json,
        } => {
            let config = TrainingConfig {
                test_size,
                seed,
                tree: TreeParams {
                    max_depth: if unbounded_depth { None } else { Some(max_depth) },
                    min_samples_split,
                },
                ..TrainingConfig::default()
            };
            cmd_train(&input, &paths, &config, json)
        }

        Commands::Doctor { json } => cmd_doctor(&paths, json),

        Commands::Schema { schema_type } => cmd_schema(schema_type),
    }
}

fn cmd_predict(paths: &ArtifactPaths, pretty: bool) -> Result<(), MhsCliError> {
    let mut buffer = String::new();
    let response = match io::stdin().read_to_string(&mut buffer) {
        Ok(_) => respond(&buffer, paths),
        Err(e) => PredictionResponse::Failure(FailureResponse::new(e.to_string())),
    };

    let output = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        response.to_json()
    };

    let mut stdout = io::stdout();
    writeln!(stdout, "{}", output)?;
    stdout.flush()?;
    Ok(())
}

fn cmd_recommend(
    risk: RiskLevel,
    anxiety: f64,
    stress: f64,
    depression: f64,
    activities: &[String],
    pretty: bool,
) -> Result<(), MhsCliError> {
    let recommendation = recommend(risk, anxiety, stress, depression, Some(activities));

    if pretty {
        println!("{}", serde_json::to_string_pretty(&recommendation)?);
    } else {
        println!("{}", serde_json::to_string(&recommendation)?);
    }
    Ok(())
}

fn cmd_train(
    input: &Path,
    paths: &ArtifactPaths,
    config: &TrainingConfig,
    json: bool,
) -> Result<(), MhsCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let records = parse_records(&input_data)?;
    if records.is_empty() {
        return Err(MhsCliError::NoRecords);
    }

    let outcome = train(&records, config)?;
    paths.save(&outcome.preprocessor, &outcome.artifact)?;

    let report = TrainingReport {
        model_id: outcome.artifact.model_id.clone(),
        model_dir: paths.dir().display().to_string(),
        params: outcome.artifact.params,
        summary: outcome.summary,
        evaluation: outcome.report,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Training Report");
        println!("===============");
        println!("Model ID:        {}", report.model_id);
        println!("Saved to:        {}", report.model_dir);
        println!(
            "Max depth:       {}",
            report
                .params
                .max_depth
                .map(|d| d.to_string())
                .unwrap_or_else(|| "unbounded".to_string())
        );
        println!("Min split:       {}", report.params.min_samples_split);
        println!("Records:         {}", report.summary.records);
        println!(
            "Class counts:    High {} / Low {}",
            report.summary.class_counts[0], report.summary.class_counts[1]
        );
        println!(
            "Train / test:    {} / {}",
            report.summary.train_samples, report.summary.test_samples
        );
        println!("After SMOTE:     {}", report.summary.resampled_samples);
        println!(
            "Tree:            depth {}, {} leaves",
            report.summary.tree_depth, report.summary.tree_leaves
        );
        println!("\nAccuracy:        {:.4}", report.evaluation.accuracy);
        println!("Weighted F1:     {:.4}", report.evaluation.weighted_f1);
        println!("\n{}", report.evaluation.to_table());
    }

    Ok(())
}

fn cmd_doctor(paths: &ArtifactPaths, json: bool) -> Result<(), MhsCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} {}", PRODUCER_NAME, MHS_VERSION),
    });

    checks.push(if paths.dir().is_dir() {
        DoctorCheck {
            name: "model_dir".to_string(),
            status: CheckStatus::Ok,
            message: format!("Model directory {}", paths.dir().display()),
        }
    } else {
        DoctorCheck {
            name: "model_dir".to_string(),
            status: CheckStatus::Error,
            message: format!("Model directory {} does not exist", paths.dir().display()),
        }
    });

    for (name, path) in [("model", paths.model()), ("preprocessor", paths.preprocessor())] {
        checks.push(if path.is_file() {
            DoctorCheck {
                name: name.to_string(),
                status: CheckStatus::Ok,
                message: format!("Found {}", path.display()),
            }
        } else {
            DoctorCheck {
                name: name.to_string(),
                status: CheckStatus::Error,
                message: format!("Missing {}", path.display()),
            }
        });
    }

    checks.push(match paths.load() {
        Ok(model) => {
            let artifact = model.artifact();
            DoctorCheck {
                name: "artifacts".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Model {} trained {} ({} encoded features from {} columns, depth {}, {} leaves)",
                    artifact.model_id,
                    artifact.trained_at.to_rfc3339(),
                    model.preprocessor().width(),
                    model.preprocessor().scalers.len() + model.preprocessor().encoders.len(),
                    artifact.tree.depth(),
                    artifact.tree.leaf_count()
                ),
            }
        }
        Err(e) => DoctorCheck {
            name: "artifacts".to_string(),
            status: CheckStatus::Error,
            message: format!("Cannot load artifacts: {}", e),
        },
    });

    // Check stdin is available (for predict)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Warning,
            message: "stdin is a TTY; predict expects a piped request".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (predict ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: MHS_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("mhscore Doctor Report");
        println!("=====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(MhsCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), MhsCliError> {
    let schema = match schema_type {
        SchemaType::Input => input_json_schema(),
        SchemaType::Output => output_json_schema(),
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn input_json_schema() -> serde_json::Value {
    let categorical = serde_json::json!({ "type": "string" });
    let numeric = serde_json::json!({ "type": "number" });

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "prediction_request",
        "type": "object",
        "required": ["input_data"],
        "properties": {
            "input_data": {
                "type": "object",
                "required": [
                    "Counseling_Service_Use", "Stress_Level", "Substance_Use", "Age", "Course",
                    "Financial_Stress", "Physical_Activity", "Extracurricular_Involvement",
                    "Semester_Credit_Load", "Family_History", "Chronic_Illness"
                ],
                "properties": {
                    "Counseling_Service_Use": categorical,
                    "Stress_Level": numeric,
                    "Substance_Use": categorical,
                    "Age": numeric,
                    "Course": categorical,
                    "Financial_Stress": numeric,
                    "Physical_Activity": categorical,
                    "Extracurricular_Involvement": categorical,
                    "Semester_Credit_Load": numeric,
                    "Family_History": categorical,
                    "Chronic_Illness": categorical,
                    "Anxiety_Score": numeric,
                    "Depression_Score": numeric
                }
            },
            "favorite_activities": {
                "type": ["array", "null"],
                "items": { "type": "string" }
            }
        }
    })
}

fn output_json_schema() -> serde_json::Value {
    let strings = serde_json::json!({ "type": "array", "items": { "type": "string" } });

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "prediction_response",
        "type": "object",
        "required": ["risk_level", "mental_health_score", "professional_help", "activities", "daily_practices"],
        "properties": {
            "error": { "type": "string" },
            "risk_level": { "type": "string", "enum": ["High", "Low", "Unknown"] },
            "mental_health_score": { "type": "number", "minimum": 0, "maximum": 15 },
            "professional_help": { "type": ["string", "null"] },
            "activities": strings,
            "daily_practices": strings
        }
    })
}

// Error types

#[derive(Debug)]
enum MhsCliError {
    Io(io::Error),
    Prediction(mental_health_score::PredictionError),
    Json(serde_json::Error),
    NoRecords,
    DoctorFailed,
}

impl From<io::Error> for MhsCliError {
    fn from(e: io::Error) -> Self {
        MhsCliError::Io(e)
    }
}

impl From<mental_health_score::PredictionError> for MhsCliError {
    fn from(e: mental_health_score::PredictionError) -> Self {
        MhsCliError::Prediction(e)
    }
}

impl From<serde_json::Error> for MhsCliError {
    fn from(e: serde_json::Error) -> Self {
        MhsCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<MhsCliError> for CliError {
    fn from(e: MhsCliError) -> Self {
        match e {
            MhsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            MhsCliError::Prediction(e) => CliError {
                code: "PREDICTION_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the model directory and input records".to_string()),
            },
            MhsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Input must be a JSON array of survey records".to_string()),
            },
            MhsCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No survey records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            MhsCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Run 'mhscore train' to create the model artifacts".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct TrainingReport {
    model_id: String,
    model_dir: String,
    params: TreeParams,
    summary: TrainingSummary,
    evaluation: EvaluationReport,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
