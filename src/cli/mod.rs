// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, built on clap.
// Business logic is delegated to Layer 2 (application).
//
// Output contract: exactly one JSON object on stdout.
//   success → the recommendation / estimate / training report
//   failure → {"error": "<message>", "kind": "<error kind>"}
// Logs go to stderr so stdout stays machine-readable.

pub mod commands;

use std::ffi::OsString;
use std::io::Write;

use anyhow::Result;
use clap::error::ErrorKind as ClapErrorKind;
use clap::Parser;
use serde::Serialize;
use serde_json::Value;

use crate::domain::error::{AdvisorError, ErrorKind};
use crate::domain::request::PredictionRequest;
use commands::{Commands, ModelRequestArgs, TrainArgs, YieldArgs};

#[derive(Parser, Debug)]
#[command(
    name = "agro-advisor",
    version,
    about = "Crop and fertilizer recommendations from trained classifiers, plus yield estimates."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Serialize)]
struct ErrorOutput {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind:  Option<ErrorKind>,
}

impl Cli {
    /// Parse `args`, run the command and write its JSON result to
    /// `out`. Returns the process exit status.
    ///
    /// Argument errors are answered like any other bad input; only
    /// `--help` and `--version` print clap's own text.
    pub fn run_args<I, T, W>(args: I, out: &mut W) -> u8
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
        W: Write,
    {
        match Self::try_parse_from(args) {
            Ok(cli) => cli.run(out),
            Err(err) if matches!(err.kind(), ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion) => {
                err.exit()
            }
            Err(err) => {
                let advisor = AdvisorError::InputFormat(clap_message(&err));
                emit(out, &ErrorOutput { error: advisor.to_string(), kind: Some(advisor.kind()) });
                advisor.exit_code()
            }
        }
    }

    /// Dispatch to the use case, write the JSON result and map the
    /// outcome to a process exit status.
    pub fn run<W: Write>(self, out: &mut W) -> u8 {
        let outcome = match self.command {
            Commands::Train(args)               => run_train(args),
            Commands::PredictCrop(args)         => run_predict_crop(args),
            Commands::RecommendFertilizer(args) => run_recommend_fertilizer(args),
            Commands::Recommend(args)           => run_recommend(args),
            Commands::EstimateYield(args)       => run_estimate_yield(args),
        };

        match outcome {
            Ok(json) => {
                emit(out, &json);
                0
            }
            Err(err) => {
                let advisor = err.chain().find_map(|e| e.downcast_ref::<AdvisorError>());
                let output = ErrorOutput {
                    error: advisor.map_or_else(|| format!("{err:#}"), ToString::to_string),
                    kind:  advisor.map(AdvisorError::kind),
                };
                tracing::debug!("Request failed: {:#}", err);
                emit(out, &output);
                advisor.map_or(1, AdvisorError::exit_code)
            }
        }
    }
}

// "error: the following required arguments were not provided:\n  <REQUEST>\n\nUsage: ..."
//   → "the following required arguments were not provided: <REQUEST>"
fn clap_message(err: &clap::Error) -> String {
    if err.kind() == ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand {
        return "a subcommand is required".to_string();
    }
    let rendered = err.to_string();
    rendered
        .lines()
        .take_while(|line| !line.starts_with("Usage:") && !line.starts_with("For more information"))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim_start_matches("error: ")
        .to_string()
}

fn emit<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) {
    let json = serde_json::to_value(value).unwrap_or(Value::Null);
    if let Err(e) = writeln!(out, "{json}") {
        tracing::warn!("Cannot write result: {}", e);
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn run_train(args: TrainArgs) -> Result<Value> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on records in: {}", args.data);
    let report = TrainUseCase::new(args.into()).execute()?;
    to_json(&report)
}

fn run_predict_crop(args: ModelRequestArgs) -> Result<Value> {
    use crate::application::recommend_use_case::InferenceService;
    use crate::ml::registry::ModelRegistry;

    let request  = PredictionRequest::from_json(&args.request)?;
    let registry = ModelRegistry::load(&args.artifacts_dir)?;
    to_json(&InferenceService::new(&registry).recommend_crop(&request)?)
}

fn run_recommend_fertilizer(args: ModelRequestArgs) -> Result<Value> {
    use crate::application::recommend_use_case::InferenceService;
    use crate::ml::registry::ModelRegistry;

    let request  = PredictionRequest::from_json(&args.request)?;
    let registry = ModelRegistry::load(&args.artifacts_dir)?;
    to_json(&InferenceService::new(&registry).recommend_fertilizer_request(&request)?)
}

fn run_recommend(args: ModelRequestArgs) -> Result<Value> {
    use crate::application::recommend_use_case::InferenceService;
    use crate::ml::registry::ModelRegistry;

    let request  = PredictionRequest::from_json(&args.request)?;
    let registry = ModelRegistry::load(&args.artifacts_dir)?;
    to_json(&InferenceService::new(&registry).recommend(&request)?)
}

fn run_estimate_yield(args: YieldArgs) -> Result<Value> {
    use crate::application::yield_use_case::YieldEstimator;
    use crate::data::lookup::LookupTable;

    let request = PredictionRequest::from_json(&args.request)?;
    let table   = LookupTable::from_path(&args.table)?;
    to_json(&YieldEstimator::new(&table).estimate_request(&request)?)
}
