// ============================================================
// Layer 4 - Encoded Target Datasets
// ============================================================
// Turns the historical corpus into a fully numeric training
// matrix for one recommender:
//
//   FieldRecord ──FeatureVectorBuilder(schema)──→ features
//   FieldRecord ──target encoder──────────────→ label
//
// Features go through the same builder the inference path uses,
// so a training row and a request with the same values encode
// to the same vector.

use crate::data::splitter::split_train_test;
use crate::domain::error::AdvisorResult;
use crate::domain::record::FieldRecord;
use crate::ml::encoder::EncoderSet;
use crate::ml::features::{FeatureVectorBuilder, Schema};

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRow {
    pub features: Vec<f64>,
    pub label:    usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetDataset {
    schema: Schema,
    rows:   Vec<LabeledRow>,
}

impl TargetDataset {
    /// Encode every record for `schema` with the encoders of this run.
    pub fn encode(
        schema:   Schema,
        records:  &[FieldRecord],
        encoders: &EncoderSet,
    ) -> AdvisorResult<Self> {
        let builder = FeatureVectorBuilder::new(encoders);
        let target  = encoders.get(schema.target_column())?;

        let rows = records
            .iter()
            .map(|record| {
                let label = record
                    .category(schema.target_column())
                    .unwrap_or_default();
                Ok(LabeledRow {
                    features: builder.build(schema, record)?.into_values(),
                    label:    target.encode(label)?,
                })
            })
            .collect::<AdvisorResult<Vec<_>>>()?;

        Ok(Self { schema, rows })
    }

    /// Seeded (train, test) partition.
    pub fn split(self, train_fraction: f64, seed: u64) -> (Self, Self) {
        let schema = self.schema;
        let (train, test) = split_train_test(self.rows, train_fraction, seed);
        (Self { schema, rows: train }, Self { schema, rows: test })
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row-major feature matrix and the matching label vector.
    pub fn to_xy(&self) -> (Vec<Vec<f64>>, Vec<usize>) {
        self.rows
            .iter()
            .map(|r| (r.features.clone(), r.label))
            .unzip()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<FieldRecord> {
        [("Sandy", "Maize", "Urea"), ("Clayey", "Paddy", "DAP"), ("Sandy", "Wheat", "Urea")]
            .iter()
            .enumerate()
            .map(|(i, (soil, crop, fert))| FieldRecord {
                temperature: 20.0 + i as f64, humidity: 50.0, moisture: 40.0,
                soil_type: soil.to_string(), crop_type: crop.to_string(),
                nitrogen: 10.0, potassium: 1.0, phosphorous: 2.0,
                fertilizer_name: fert.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_crop_dataset_labels_are_crop_codes() {
        let recs = records();
        let enc  = EncoderSet::fit(&recs);
        let ds   = TargetDataset::encode(Schema::Crop, &recs, &enc).unwrap();
        let (x, y) = ds.to_xy();

        // Maize=0, Paddy=1, Wheat=2 ; Clayey=0, Sandy=1
        assert_eq!(y, vec![0, 1, 2]);
        assert_eq!(x[1], vec![21.0, 50.0, 40.0, 0.0, 10.0, 2.0, 1.0]);
    }

    #[test]
    fn test_fertilizer_dataset_uses_crop_code_as_input() {
        let recs = records();
        let enc  = EncoderSet::fit(&recs);
        let ds   = TargetDataset::encode(Schema::Fertilizer, &recs, &enc).unwrap();
        let (x, y) = ds.to_xy();

        // DAP=0, Urea=1
        assert_eq!(y, vec![1, 0, 1]);
        assert_eq!(x[2], vec![2.0, 10.0, 2.0, 1.0]);
    }

    #[test]
    fn test_split_keeps_schema() {
        let recs = records();
        let enc  = EncoderSet::fit(&recs);
        let (train, test) = TargetDataset::encode(Schema::Crop, &recs, &enc)
            .unwrap()
            .split(0.67, 42);
        assert_eq!(train.len() + test.len(), 3);
        assert_eq!(test.schema(), Schema::Crop);
    }
}
