// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates the offline training pipeline in order:
//
//   Step 1: Load the historical records     (Layer 4 - data)
//   Step 2: Fit the categorical encoders    (Layer 5 - ml)
//   Step 3: Per target: encode, split,
//           fit and evaluate                (Layer 4 + 5)
//   Step 4: Cross-check the artifact set    (Layer 5 - ml)
//   Step 5: Persist artifacts, config and
//           metrics                         (Layer 6 - infra)
//
// Both targets are encoded from the same rows with the same
// encoders and split with the same seed, so the crop model's
// output codes and the fertilizer model's crop input codes are
// one and the same domain.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::dataset::TargetDataset;
use crate::data::loader::CsvRecordLoader;
use crate::domain::error::AdvisorError;
use crate::domain::traits::RecordSource;
use crate::infra::checkpoint::{new_run_id, now_ms, ArtifactSet, ArtifactStore};
use crate::infra::metrics::{EvaluationMetrics, MetricsLogger};
use crate::ml::encoder::EncoderSet;
use crate::ml::features::Schema;
use crate::ml::model::ModelKind;
use crate::ml::registry::ModelRegistry;
use crate::ml::trainer::train_target;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved as train_config.json next to the artifacts it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_path:         String,
    pub artifacts_dir:     String,
    pub test_fraction:     f64,
    pub seed:              u64,
    pub n_trees:           usize,
    pub max_depth:         Option<usize>,
    pub min_samples_split: usize,
    pub crop_model:        ModelKind,
    pub fertilizer_model:  ModelKind,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:         "data/data_core.csv".to_string(),
            artifacts_dir:     "artifacts".to_string(),
            test_fraction:     0.2,
            seed:              42,
            n_trees:           100,
            max_depth:         None,
            min_samples_split: 2,
            crop_model:        ModelKind::Forest,
            fertilizer_model:  ModelKind::Forest,
        }
    }
}

impl TrainConfig {
    pub fn model_kind(&self, schema: Schema) -> ModelKind {
        match schema {
            Schema::Crop       => self.crop_model,
            Schema::Fertilizer => self.fertilizer_model,
        }
    }
}

/// Printed by `train` on success.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub run_id:        String,
    pub artifacts_dir: String,
    pub targets:       Vec<EvaluationMetrics>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Train on the CSV file named in the config.
    pub fn execute(&self) -> Result<TrainingReport> {
        self.execute_from(&CsvRecordLoader::new(&self.config.data_path))
    }

    /// Train on any record source.
    pub fn execute_from(&self, source: &dyn RecordSource) -> Result<TrainingReport> {
        let cfg = &self.config;
        if !(0.0..1.0).contains(&cfg.test_fraction) {
            return Err(AdvisorError::Training(format!(
                "test fraction must be in [0, 1), got {}",
                cfg.test_fraction
            ))
            .into());
        }

        // ── Step 1: Load historical records ───────────────────────────────────
        let records = source.load_all()?;

        // ── Step 2: Fit encoders ──────────────────────────────────────────────
        let encoders = EncoderSet::fit(&records);
        for encoder in encoders.iter() {
            tracing::info!("Encoder '{}': {} labels", encoder.name(), encoder.len());
        }

        let created_at = now_ms();
        let fingerprint = serde_json::to_vec(cfg).context("Cannot fingerprint config")?;
        let run_id = new_run_id(created_at, &fingerprint);
        tracing::info!("Training run '{}' on {} records", run_id, records.len());

        // ── Step 3: Encode, split, fit, evaluate ──────────────────────────────
        let mut models  = Vec::with_capacity(Schema::ALL.len());
        let mut metrics = Vec::with_capacity(Schema::ALL.len());
        for schema in Schema::ALL {
            let dataset       = TargetDataset::encode(schema, &records, &encoders)?;
            let (train, test) = dataset.split(1.0 - cfg.test_fraction, cfg.seed);
            let n_classes     = encoders.get(schema.target_column())?.len();

            let outcome = train_target(cfg, &run_id, &train, &test, n_classes)?;
            models.push(outcome.model);
            metrics.push(outcome.metrics);
        }
        let fertilizer_model = models.pop().context("fertilizer model missing")?;
        let crop_model       = models.pop().context("crop model missing")?;

        let set = ArtifactSet { run_id: run_id.clone(), encoders, crop_model, fertilizer_model };

        // ── Step 4: Same checks the inference side will run ───────────────────
        ModelRegistry::from_set(set.clone())?;

        // ── Step 5: Persist ───────────────────────────────────────────────────
        // train_config.json must never sit beside an older manifest
        let store = ArtifactStore::new(&cfg.artifacts_dir);
        store.save_set(&set)?;
        store.save_config(cfg)?;

        let logger = MetricsLogger::new(&cfg.artifacts_dir)?;
        for m in &metrics {
            logger.log(m)?;
        }

        tracing::info!("Training complete. Artifacts in '{}'", cfg.artifacts_dir);
        Ok(TrainingReport {
            run_id,
            artifacts_dir: cfg.artifacts_dir.clone(),
            targets: metrics,
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    const HEADER: &str =
        "Temparature,Humidity ,Moisture,Soil Type,Crop Type,Nitrogen,Potassium,Phosphorous,Fertilizer Name";

    // Crop follows soil, fertilizer follows crop
    fn write_corpus(path: &Path) {
        let plan = [
            ("Sandy", "Maize", "Urea"),
            ("Clayey", "Paddy", "DAP"),
            ("Black", "Cotton", "28-28"),
        ];
        let mut csv = String::from(HEADER);
        csv.push('\n');
        for i in 0..45 {
            let (soil, crop, fert) = plan[i % 3];
            csv.push_str(&format!(
                "{},{},{},{soil},{crop},{},{},{},{fert}\n",
                24 + i % 9,
                50 + i % 11,
                30 + i % 13,
                i % 40,
                i % 7,
                i % 17,
            ));
        }
        fs::write(path, csv).unwrap();
    }

    fn config(root: &Path, artifacts: &str) -> TrainConfig {
        TrainConfig {
            data_path:     root.join("data.csv").to_string_lossy().into_owned(),
            artifacts_dir: root.join(artifacts).to_string_lossy().into_owned(),
            n_trees:       7,
            ..TrainConfig::default()
        }
    }

    fn payload(dir: &str, file: &str) -> serde_json::Value {
        let raw = fs::read_to_string(Path::new(dir).join(file)).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        value["payload"].take()
    }

    #[test]
    fn test_training_produces_loadable_artifacts() {
        let root = tempdir().unwrap();
        write_corpus(&root.path().join("data.csv"));
        let cfg = config(root.path(), "artifacts");

        let report = TrainUseCase::new(cfg.clone()).execute().unwrap();
        assert_eq!(report.targets.len(), 2);
        assert_eq!(report.targets[0].target, "crop");
        assert_eq!(report.targets[0].test_rows, 9);

        let registry = ModelRegistry::load(&cfg.artifacts_dir).unwrap();
        assert_eq!(registry.run_id(), report.run_id);

        let metrics = fs::read_to_string(Path::new(&cfg.artifacts_dir).join("metrics.csv")).unwrap();
        assert_eq!(metrics.lines().count(), 3);

        let saved: TrainConfig = serde_json::from_str(
            &fs::read_to_string(Path::new(&cfg.artifacts_dir).join("train_config.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(saved, cfg);
    }

    #[test]
    fn test_same_data_and_seed_give_same_artifacts() {
        let root = tempdir().unwrap();
        write_corpus(&root.path().join("data.csv"));
        let a = config(root.path(), "a");
        let b = config(root.path(), "b");
        TrainUseCase::new(a.clone()).execute().unwrap();
        TrainUseCase::new(b.clone()).execute().unwrap();

        for file in [
            "encoder_soil_type.json",
            "encoder_crop_type.json",
            "encoder_fertilizer_name.json",
            "model_crop.json",
            "model_fertilizer.json",
        ] {
            assert_eq!(payload(&a.artifacts_dir, file), payload(&b.artifacts_dir, file), "{file}");
        }
    }

    #[test]
    fn test_tree_fertilizer_model_is_selectable() {
        let root = tempdir().unwrap();
        write_corpus(&root.path().join("data.csv"));
        let cfg = TrainConfig { fertilizer_model: ModelKind::Tree, ..config(root.path(), "t") };
        TrainUseCase::new(cfg.clone()).execute().unwrap();

        let registry = ModelRegistry::load(&cfg.artifacts_dir).unwrap();
        assert_eq!(registry.model(Schema::Fertilizer).kind(), ModelKind::Tree);
        assert_eq!(registry.model(Schema::Crop).kind(), ModelKind::Forest);
    }

    #[test]
    fn test_missing_data_file_is_training_error() {
        let root = tempdir().unwrap();
        let err  = TrainUseCase::new(config(root.path(), "x")).execute().unwrap_err();
        assert!(matches!(err.downcast_ref::<AdvisorError>(), Some(AdvisorError::Training(_))));
    }

    #[test]
    fn test_failed_artifact_write_leaves_no_config() {
        let root = tempdir().unwrap();
        write_corpus(&root.path().join("data.csv"));
        let cfg = config(root.path(), "blocked");

        // A directory where a model file must go makes save_set fail
        fs::create_dir_all(Path::new(&cfg.artifacts_dir).join("model_crop.json")).unwrap();

        assert!(TrainUseCase::new(cfg.clone()).execute().is_err());
        assert!(!Path::new(&cfg.artifacts_dir).join("train_config.json").exists());
        assert!(!Path::new(&cfg.artifacts_dir).join("manifest.json").exists());
    }

    #[test]
    fn test_invalid_test_fraction_is_rejected() {
        let root = tempdir().unwrap();
        write_corpus(&root.path().join("data.csv"));
        let cfg = TrainConfig { test_fraction: 1.0, ..config(root.path(), "x") };
        assert!(TrainUseCase::new(cfg).execute().is_err());
    }
}
