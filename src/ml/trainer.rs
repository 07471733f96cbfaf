// ============================================================
// Layer 5 - Model Trainer
// ============================================================
// Fits one classifier on the training split of a target and
// scores it on the held-out split.
//
//   TargetDataset (train) ──fit_model──→ TrainedModel
//   TargetDataset (test)  ──accuracy───→ EvaluationMetrics
//
// All randomness (bootstrap draws, feature subsets) comes from
// StdRng seeded with `TrainConfig::seed`, so the same data and
// config always produce the same model.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::application::train_use_case::TrainConfig;
use crate::data::dataset::TargetDataset;
use crate::domain::error::{AdvisorError, AdvisorResult};
use crate::infra::metrics::EvaluationMetrics;
use crate::ml::forest::{ForestParams, RandomForest};
use crate::ml::model::{ModelKind, TrainedModel};
use crate::ml::tree::{DecisionTree, MaxFeatures, TreeParams};

/// A fitted model together with its test-split evaluation.
#[derive(Debug, Clone)]
pub struct TargetOutcome {
    pub model:   TrainedModel,
    pub metrics: EvaluationMetrics,
}

/// Fit `kind` on `train`, evaluate on `test`.
pub fn train_target(
    cfg:       &TrainConfig,
    run_id:    &str,
    train:     &TargetDataset,
    test:      &TargetDataset,
    n_classes: usize,
) -> AdvisorResult<TargetOutcome> {
    let schema = train.schema();
    let kind   = cfg.model_kind(schema);

    tracing::info!(
        "Fitting {} model ({}) on {} rows",
        schema.model_name(),
        kind,
        train.len()
    );
    let model = fit_model(kind, cfg, train, n_classes)?;

    let (x_test, y_test) = test.to_xy();
    let accuracy = model.accuracy(&x_test, &y_test);
    if test.is_empty() {
        tracing::warn!("No held-out rows for the {} model; accuracy not measured", schema.model_name());
    } else {
        tracing::info!(
            "{} model test accuracy: {:.2}% ({} rows)",
            schema.model_name(),
            accuracy * 100.0,
            test.len()
        );
    }

    let metrics = EvaluationMetrics {
        run_id:     run_id.to_string(),
        target:     schema.model_name().to_string(),
        train_rows: train.len(),
        test_rows:  test.len(),
        accuracy,
    };
    Ok(TargetOutcome { model, metrics })
}

/// Fit a single classifier of the requested kind on every row of `train`.
pub fn fit_model(
    kind:      ModelKind,
    cfg:       &TrainConfig,
    train:     &TargetDataset,
    n_classes: usize,
) -> AdvisorResult<TrainedModel> {
    if train.is_empty() {
        return Err(AdvisorError::Training(format!(
            "no training rows left for the {} model",
            train.schema().model_name()
        )));
    }
    let (x, y) = train.to_xy();

    let model = match kind {
        ModelKind::Forest => {
            let params = ForestParams {
                n_trees: cfg.n_trees,
                seed:    cfg.seed,
                tree:    tree_params(cfg, MaxFeatures::Sqrt),
            };
            TrainedModel::Forest(RandomForest::fit(&x, &y, n_classes, &params))
        }
        ModelKind::Tree => {
            let indices: Vec<usize> = (0..x.len()).collect();
            let mut rng = StdRng::seed_from_u64(cfg.seed);
            let params  = tree_params(cfg, MaxFeatures::All);
            TrainedModel::Tree(DecisionTree::fit(&x, &y, &indices, n_classes, &params, &mut rng))
        }
    };
    Ok(model)
}

fn tree_params(cfg: &TrainConfig, max_features: MaxFeatures) -> TreeParams {
    TreeParams {
        max_depth:         cfg.max_depth,
        min_samples_split: cfg.min_samples_split.max(2),
        max_features,
    }
}
