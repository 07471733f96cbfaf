// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Defines the subcommands and their flags:
//
//   train                 fit encoders + models, write artifacts
//   predict-crop          crop for a soil/climate reading
//   recommend-fertilizer  fertilizer for a crop and N, P, K
//   recommend             both, chained
//   estimate-yield        yield lookup × land area
//
// Request commands take exactly one JSON object as their
// positional argument.

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::ModelKind;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train both recommenders on the historical records CSV
    Train(TrainArgs),

    /// Recommend a crop for a soil and climate reading
    PredictCrop(ModelRequestArgs),

    /// Recommend a fertilizer for a crop and its N, P, K readings
    RecommendFertilizer(ModelRequestArgs),

    /// Recommend a crop and the fertilizer for it
    Recommend(ModelRequestArgs),

    /// Estimate total yield for a crop, district and land area
    EstimateYield(YieldArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Historical field records CSV
    #[arg(long, default_value = "data/data_core.csv")]
    pub data: String,

    /// Directory the artifact set is written to
    #[arg(long, default_value = "artifacts")]
    pub artifacts_dir: String,

    /// Fraction of rows held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    /// Seed for the split, bootstrap draws and feature subsets
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Trees per random forest
    #[arg(long, default_value_t = 100)]
    pub n_trees: usize,

    /// Maximum tree depth (unlimited when omitted)
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Nodes with fewer samples than this are not split
    #[arg(long, default_value_t = 2)]
    pub min_samples_split: usize,

    /// Crop model algorithm: forest or tree
    #[arg(long, default_value = "forest")]
    pub crop_model: ModelKind,

    /// Fertilizer model algorithm: forest or tree
    #[arg(long, default_value = "forest")]
    pub fertilizer_model: ModelKind,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:         a.data,
            artifacts_dir:     a.artifacts_dir,
            test_fraction:     a.test_fraction,
            seed:              a.seed,
            n_trees:           a.n_trees,
            max_depth:         a.max_depth,
            min_samples_split: a.min_samples_split,
            crop_model:        a.crop_model,
            fertilizer_model:  a.fertilizer_model,
        }
    }
}

/// Arguments for the commands answered by the trained models.
#[derive(Args, Debug)]
pub struct ModelRequestArgs {
    /// Request as a JSON object
    pub request: String,

    /// Directory holding the artifact set of a training run
    #[arg(long, default_value = "artifacts")]
    pub artifacts_dir: String,
}

#[derive(Args, Debug)]
pub struct YieldArgs {
    /// Request as a JSON object: {"crop", "district", "land_area"}
    pub request: String,

    /// Yield lookup table CSV
    #[arg(long, default_value = "data/yield_table.csv")]
    pub table: String,
}
