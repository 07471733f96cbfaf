// ============================================================
// Layer 5 - Model Registry
// ============================================================
// The loaded, read-only view of one training run that the
// inference service works against.
//
// Loading goes through the artifact store (which already
// rejects mixed runs and unknown format versions) and then
// checks that the pieces actually fit together:
//
//   - every categorical encoder is present
//   - each model's input width equals its schema width
//   - each model's class count equals its target encoder size
//   - every tree is structurally sound
//
// After `load` returns nothing is ever mutated, so a registry
// can be shared by reference across threads.

use std::path::Path;

use crate::domain::error::{AdvisorError, AdvisorResult};
use crate::domain::record::columns;
use crate::domain::traits::Classifier;
use crate::infra::checkpoint::{ArtifactSet, ArtifactStore};
use crate::ml::encoder::{CategoricalEncoder, EncoderSet};
use crate::ml::features::Schema;
use crate::ml::model::TrainedModel;

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    run_id:           String,
    encoders:         EncoderSet,
    crop_model:       TrainedModel,
    fertilizer_model: TrainedModel,
}

impl ModelRegistry {
    /// Load the artifact set stored in `dir`.
    pub fn load(dir: impl AsRef<Path>) -> AdvisorResult<Self> {
        Self::from_store(&ArtifactStore::new(dir.as_ref()))
    }

    pub fn from_store(store: &ArtifactStore) -> AdvisorResult<Self> {
        let registry = Self::from_set(store.load_set()?)?;
        tracing::info!(
            "Model registry ready: run '{}' from '{}'",
            registry.run_id,
            store.dir().display()
        );
        Ok(registry)
    }

    /// Validate an in-memory artifact set.
    pub fn from_set(set: ArtifactSet) -> AdvisorResult<Self> {
        let registry = Self {
            run_id:           set.run_id,
            encoders:         set.encoders,
            crop_model:       set.crop_model,
            fertilizer_model: set.fertilizer_model,
        };
        registry.check()?;
        Ok(registry)
    }

    fn check(&self) -> AdvisorResult<()> {
        for column in columns::CATEGORICAL {
            self.encoders.get(column)?;
        }

        for schema in Schema::ALL {
            let name  = schema.model_name();
            let model = self.model(schema);
            let fail  = |msg: String| AdvisorError::ModelLoad(format!("{name} model: {msg}"));

            model.validate().map_err(fail)?;
            if model.n_features() != schema.width() {
                return Err(fail(format!(
                    "expects {} features, schema has {}",
                    model.n_features(),
                    schema.width()
                )));
            }
            let decoder = self.decoder(schema)?;
            if model.n_classes() != decoder.len() {
                return Err(fail(format!(
                    "has {} classes but the '{}' encoder has {} labels",
                    model.n_classes(),
                    decoder.name(),
                    decoder.len()
                )));
            }
        }
        Ok(())
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn encoders(&self) -> &EncoderSet {
        &self.encoders
    }

    pub fn model(&self, schema: Schema) -> &TrainedModel {
        match schema {
            Schema::Crop       => &self.crop_model,
            Schema::Fertilizer => &self.fertilizer_model,
        }
    }

    /// Encoder that turns this schema's predictions back into labels.
    pub fn decoder(&self, schema: Schema) -> AdvisorResult<&CategoricalEncoder> {
        self.encoders.get(schema.target_column())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::FieldRecord;
    use crate::ml::tree::DecisionTree;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    fn tree(width: usize, n_classes: usize) -> TrainedModel {
        let x: Vec<Vec<f64>> = (0..n_classes).map(|c| vec![c as f64; width]).collect();
        let y: Vec<usize>    = (0..n_classes).collect();
        let idx: Vec<usize>  = (0..n_classes).collect();
        let mut rng = StdRng::seed_from_u64(3);
        TrainedModel::Tree(DecisionTree::fit(&x, &y, &idx, n_classes, &Default::default(), &mut rng))
    }

    fn encoders() -> EncoderSet {
        let records: Vec<FieldRecord> = [
            ("Sandy", "Maize", "Urea"),
            ("Loamy", "Wheat", "DAP"),
            ("Black", "Cotton", "DAP"),
        ]
        .iter()
        .map(|(soil, crop, fert)| FieldRecord {
            temperature: 25.0, humidity: 50.0, moisture: 40.0,
            soil_type: soil.to_string(), crop_type: crop.to_string(),
            nitrogen: 10.0, potassium: 0.0, phosphorous: 5.0,
            fertilizer_name: fert.to_string(),
        })
        .collect();
        EncoderSet::fit(&records)
    }

    fn set(crop_classes: usize, crop_width: usize) -> ArtifactSet {
        ArtifactSet {
            run_id:           "run-t".into(),
            encoders:         encoders(),
            crop_model:       tree(crop_width, crop_classes),
            fertilizer_model: tree(Schema::Fertilizer.width(), 2),
        }
    }

    #[test]
    fn test_consistent_set_is_accepted() {
        let registry = ModelRegistry::from_set(set(3, Schema::Crop.width())).unwrap();
        assert_eq!(registry.run_id(), "run-t");
        assert_eq!(registry.decoder(Schema::Fertilizer).unwrap().labels(), ["DAP", "Urea"]);
    }

    #[test]
    fn test_class_count_must_match_encoder() {
        let err = ModelRegistry::from_set(set(2, Schema::Crop.width())).unwrap_err();
        assert!(matches!(err, AdvisorError::ModelLoad(msg) if msg.contains("Crop Type")));
    }

    #[test]
    fn test_feature_width_must_match_schema() {
        let err = ModelRegistry::from_set(set(3, 5)).unwrap_err();
        assert!(matches!(err, AdvisorError::ModelLoad(_)));
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempdir().unwrap();
        ArtifactStore::new(dir.path()).save_set(&set(3, Schema::Crop.width())).unwrap();

        let registry = ModelRegistry::load(dir.path()).unwrap();
        assert_eq!(registry.encoders().len(), 3);
        assert_eq!(registry.model(Schema::Crop).n_classes(), 3);
    }

    #[test]
    fn test_registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ModelRegistry>();
    }
}
