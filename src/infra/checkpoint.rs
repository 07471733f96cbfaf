// ============================================================
// Layer 6 - Artifact Store
// ============================================================
// Persists and restores one complete training run: every
// categorical encoder plus both trained models.
//
// What gets saved per run:
//   1. encoder_<column>.json  - one per categorical column
//   2. model_<target>.json    - one per recommender
//   3. manifest.json          - run id, format version, file list
//   4. train_config.json      - hyperparameters of the run
//
// Every encoder/model file is wrapped in the same envelope:
//
//   { "format_version": 1, "run_id": "...", "name": "...", "payload": {...} }
//
// Loading cross-checks each envelope against the manifest. A
// file from another run, another format version, or under the
// wrong name fails the whole load, so a model can never be
// paired with an encoder it was not trained against.
//
// The manifest is written LAST. A run interrupted half-way
// leaves either the previous manifest (whose run id no longer
// matches the rewritten files, so loading fails) or none.
//
// Directory layout:
//   artifacts/
//     manifest.json
//     encoder_crop_type.json
//     encoder_fertilizer_name.json
//     encoder_soil_type.json
//     model_crop.json
//     model_fertilizer.json
//     train_config.json
//     metrics.csv            ← written by MetricsLogger

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::domain::error::{AdvisorError, AdvisorResult};
use crate::domain::record::columns;
use crate::ml::encoder::{CategoricalEncoder, EncoderSet};
use crate::ml::features::Schema;
use crate::ml::model::TrainedModel;

/// Bumped whenever the envelope or payload layout changes.
pub const FORMAT_VERSION: u32 = 1;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const CONFIG_FILE:   &str = "train_config.json";

// ─── On-disk shapes ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub format_version: u32,
    pub run_id:         String,
    pub name:           String,
    pub payload:        T,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub run_id:         String,
    pub created_at_ms:  u64,
    /// column name → file name
    pub encoders:       BTreeMap<String, String>,
    /// model name → file name
    pub models:         BTreeMap<String, String>,
}

// ─── ArtifactSet ──────────────────────────────────────────────────────────────
/// Everything one training run produces, held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactSet {
    pub run_id:           String,
    pub encoders:         EncoderSet,
    pub crop_model:       TrainedModel,
    pub fertilizer_model: TrainedModel,
}

impl ArtifactSet {
    pub fn model(&self, schema: Schema) -> &TrainedModel {
        match schema {
            Schema::Crop       => &self.crop_model,
            Schema::Fertilizer => &self.fertilizer_model,
        }
    }
}

// ─── ArtifactStore ────────────────────────────────────────────────────────────
/// Reads and writes artifact sets in one directory.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write every encoder and model of `set`, then the manifest.
    pub fn save_set(&self, set: &ArtifactSet) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create artifact dir '{}'", self.dir.display()))?;

        let mut manifest = Manifest {
            format_version: FORMAT_VERSION,
            run_id:         set.run_id.clone(),
            created_at_ms:  now_ms(),
            encoders:       BTreeMap::new(),
            models:         BTreeMap::new(),
        };

        for encoder in set.encoders.iter() {
            let file = encoder_file_name(encoder.name());
            self.write_envelope(&file, &set.run_id, encoder.name(), encoder)?;
            manifest.encoders.insert(encoder.name().to_string(), file);
        }

        for schema in Schema::ALL {
            let name = schema.model_name();
            let file = model_file_name(name);
            self.write_envelope(&file, &set.run_id, name, set.model(schema))?;
            manifest.models.insert(name.to_string(), file);
        }

        self.write_json(MANIFEST_FILE, &manifest)?;
        tracing::info!("Saved artifact set '{}' to '{}'", set.run_id, self.dir.display());
        Ok(())
    }

    /// Save the training configuration next to the artifacts.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create artifact dir '{}'", self.dir.display()))?;
        self.write_json(CONFIG_FILE, cfg)
    }

    /// Load and cross-check a complete artifact set.
    ///
    /// Every failure here is `ModelLoad`: missing file, bad JSON,
    /// format version mismatch, foreign run id, or wrong name.
    pub fn load_set(&self) -> AdvisorResult<ArtifactSet> {
        let manifest: Manifest = self.read_json(MANIFEST_FILE)?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(AdvisorError::ModelLoad(format!(
                "manifest format version {} is not supported (expected {})",
                manifest.format_version, FORMAT_VERSION
            )));
        }

        let mut encoders = EncoderSet::default();
        for column in columns::CATEGORICAL {
            let file = manifest_entry(&manifest.encoders, column, "encoder")?;
            let encoder: CategoricalEncoder = self.read_envelope(file, column, &manifest.run_id)?;
            if encoder.name() != column {
                return Err(AdvisorError::ModelLoad(format!(
                    "'{file}' holds the '{}' encoder, expected '{column}'",
                    encoder.name()
                )));
            }
            encoders.insert(encoder);
        }

        let load_model = |schema: Schema| -> AdvisorResult<TrainedModel> {
            let name = schema.model_name();
            let file = manifest_entry(&manifest.models, name, "model")?;
            self.read_envelope(file, name, &manifest.run_id)
        };
        let crop_model       = load_model(Schema::Crop)?;
        let fertilizer_model = load_model(Schema::Fertilizer)?;

        tracing::debug!(
            "Loaded artifact set '{}' ({} encoders) from '{}'",
            manifest.run_id,
            encoders.len(),
            self.dir.display(),
        );

        Ok(ArtifactSet {
            run_id: manifest.run_id,
            encoders,
            crop_model,
            fertilizer_model,
        })
    }

    // ─── Plumbing ─────────────────────────────────────────────────────────────

    fn write_json<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.dir.join(file);
        let json = serde_json::to_string_pretty(value)
            .with_context(|| format!("Cannot serialise '{file}'"))?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }

    fn write_envelope<T: Serialize>(
        &self,
        file:    &str,
        run_id:  &str,
        name:    &str,
        payload: &T,
    ) -> Result<()> {
        let envelope = Envelope {
            format_version: FORMAT_VERSION,
            run_id:         run_id.to_string(),
            name:           name.to_string(),
            payload,
        };
        self.write_json(file, &envelope)
    }

    fn read_json<T: DeserializeOwned>(&self, file: &str) -> AdvisorResult<T> {
        let path = self.dir.join(file);
        let json = fs::read_to_string(&path).map_err(|e| {
            AdvisorError::ModelLoad(format!(
                "cannot read '{}': {e}. Have you run 'train' first?",
                path.display()
            ))
        })?;
        serde_json::from_str(&json)
            .map_err(|e| AdvisorError::ModelLoad(format!("'{}' is corrupt: {e}", path.display())))
    }

    fn read_envelope<T: DeserializeOwned>(
        &self,
        file:   &str,
        name:   &str,
        run_id: &str,
    ) -> AdvisorResult<T> {
        let envelope: Envelope<T> = self.read_json(file)?;
        if envelope.format_version != FORMAT_VERSION {
            return Err(AdvisorError::ModelLoad(format!(
                "'{file}' has format version {} (expected {})",
                envelope.format_version, FORMAT_VERSION
            )));
        }
        if envelope.run_id != run_id {
            return Err(AdvisorError::ModelLoad(format!(
                "'{file}' belongs to run '{}' but the manifest is for run '{run_id}'",
                envelope.run_id
            )));
        }
        if envelope.name != name {
            return Err(AdvisorError::ModelLoad(format!(
                "'{file}' is named '{}', expected '{name}'",
                envelope.name
            )));
        }
        Ok(envelope.payload)
    }
}

fn manifest_entry<'m>(
    entries: &'m BTreeMap<String, String>,
    name:    &str,
    what:    &str,
) -> AdvisorResult<&'m str> {
    let file = entries
        .get(name)
        .ok_or_else(|| AdvisorError::ModelLoad(format!("manifest lists no {what} '{name}'")))?;
    // Only bare file names inside the artifact dir
    if Path::new(file).file_name().and_then(|f| f.to_str()) != Some(file.as_str()) {
        return Err(AdvisorError::ModelLoad(format!("manifest {what} path '{file}' is not a file name")));
    }
    Ok(file)
}

/// "Soil Type" → "encoder_soil_type.json"
pub fn encoder_file_name(column: &str) -> String {
    format!("encoder_{}.json", slug(column))
}

pub fn model_file_name(name: &str) -> String {
    format!("model_{}.json", slug(name))
}

fn slug(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

// ─── Run ids ──────────────────────────────────────────────────────────────────

/// Milliseconds since the Unix epoch; 0 if the clock is before it.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Run id from the creation time and a fingerprint of the inputs:
/// "run-<ms>-<fnv32 hex>".
pub fn new_run_id(created_at_ms: u64, fingerprint: &[u8]) -> String {
    // 32-bit FNV-1a
    let mut hash: u32 = 2_166_136_261;
    for b in created_at_ms.to_le_bytes().iter().chain(fingerprint) {
        hash = (hash ^ u32::from(*b)).wrapping_mul(16_777_619);
    }
    format!("run-{created_at_ms}-{hash:08x}")
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

    fn tiny_tree(width: usize, n_classes: usize) -> TrainedModel {
        let x: Vec<Vec<f64>> = (0..n_classes).map(|c| vec![c as f64; width]).collect();
        let y: Vec<usize>    = (0..n_classes).collect();
        let idx: Vec<usize>  = (0..n_classes).collect();
        let mut rng = StdRng::seed_from_u64(7);
        TrainedModel::Tree(DecisionTree::fit(&x, &y, &idx, n_classes, &Default::default(), &mut rng))
    }

    fn artifact_set(run_id: &str) -> ArtifactSet {
        let records: Vec<FieldRecord> = [("Sandy", "Maize", "Urea"), ("Loamy", "Wheat", "DAP")]
            .iter()
            .map(|(soil, crop, fert)| FieldRecord {
                temperature: 25.0, humidity: 50.0, moisture: 40.0,
                soil_type: soil.to_string(), crop_type: crop.to_string(),
                nitrogen: 10.0, potassium: 0.0, phosphorous: 5.0,
                fertilizer_name: fert.to_string(),
            })
            .collect();
        ArtifactSet {
            run_id:           run_id.to_string(),
            encoders:         EncoderSet::fit(&records),
            crop_model:       tiny_tree(Schema::Crop.width(), 2),
            fertilizer_model: tiny_tree(Schema::Fertilizer.width(), 2),
        }
    }

    #[test]
    fn test_save_then_load_restores_set() {
        let dir   = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let set   = artifact_set("run-1");

        store.save_set(&set).unwrap();
        assert!(dir.path().join("encoder_soil_type.json").exists());
        assert!(dir.path().join("model_fertilizer.json").exists());

        assert_eq!(store.load_set().unwrap(), set);
    }

    #[test]
    fn test_missing_directory_is_model_load_error() {
        let store = ArtifactStore::new("/no/such/artifacts");
        assert!(matches!(store.load_set(), Err(AdvisorError::ModelLoad(_))));
    }

    #[test]
    fn test_mixed_runs_fail_to_load() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        ArtifactStore::new(a.path()).save_set(&artifact_set("run-a")).unwrap();
        ArtifactStore::new(b.path()).save_set(&artifact_set("run-b")).unwrap();

        // Swap in a model trained by another run
        fs::copy(b.path().join("model_crop.json"), a.path().join("model_crop.json")).unwrap();

        let err = ArtifactStore::new(a.path()).load_set().unwrap_err();
        assert!(matches!(err, AdvisorError::ModelLoad(msg) if msg.contains("run-b")));
    }

    #[test]
    fn test_format_version_mismatch_fails() {
        let dir   = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save_set(&artifact_set("run-1")).unwrap();

        let path = dir.path().join("encoder_crop_type.json");
        let mut envelope: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        envelope["format_version"] = serde_json::json!(FORMAT_VERSION + 1);
        fs::write(&path, envelope.to_string()).unwrap();

        assert!(matches!(store.load_set(), Err(AdvisorError::ModelLoad(_))));
    }

    #[test]
    fn test_corrupt_payload_fails() {
        let dir   = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save_set(&artifact_set("run-1")).unwrap();
        fs::write(dir.path().join("model_crop.json"), "{ not json").unwrap();

        assert!(matches!(store.load_set(), Err(AdvisorError::ModelLoad(_))));
    }

    #[test]
    fn test_save_config_writes_json() {
        let dir   = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("nested"));
        store.save_config(&TrainConfig::default()).unwrap();

        let raw = fs::read_to_string(dir.path().join("nested").join(CONFIG_FILE)).unwrap();
        let cfg: TrainConfig = serde_json::from_str(&raw).unwrap();
        assert_eq!(cfg.seed, TrainConfig::default().seed);
    }

    #[test]
    fn test_file_names() {
        assert_eq!(encoder_file_name("Fertilizer Name"), "encoder_fertilizer_name.json");
        assert_eq!(model_file_name("crop"), "model_crop.json");
    }

    #[test]
    fn test_run_id_depends_on_inputs() {
        assert_eq!(new_run_id(5, b"abc"), new_run_id(5, b"abc"));
        assert_ne!(new_run_id(5, b"abc"), new_run_id(5, b"abd"));
        assert!(new_run_id(5, b"abc").starts_with("run-5-"));
    }
}
