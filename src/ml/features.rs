// ============================================================
// Layer 5 - Feature Vector Schemas and Builder
// ============================================================
// Each model consumes a fixed-width f64 vector in a fixed order.
// The order is defined ONCE, here, and used by both sides:
//
//   training   FieldRecord        ─┐
//                                  ├─ Schema::slots() ─→ FeatureVector
//   inference  PredictionRequest  ─┘
//
//   Crop schema (7):       temperature, humidity, moisture,
//                          soil-code, nitrogen, phosphorous, potassium
//   Fertilizer schema (4): crop-code, nitrogen, phosphorous, potassium
//
// Category slots are encoded with the encoder of the same
// training run as the model (the EncoderSet handed to the
// builder), so code 3 means the same label on both sides.

use serde::{Deserialize, Serialize};

use crate::domain::error::{AdvisorError, AdvisorResult};
use crate::domain::record::{columns, FieldRecord};
use crate::domain::request::{PredictionRequest, RequestField};
use crate::ml::encoder::EncoderSet;

// ─── Schema ───────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schema {
    Crop,
    Fertilizer,
}

/// One position of a feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Numeric(RequestField),
    /// Encoded with the encoder fitted on `column`
    Categorical { field: RequestField, column: &'static str },
}

const CROP_SLOTS: [Slot; 7] = [
    Slot::Numeric(RequestField::Temperature),
    Slot::Numeric(RequestField::Humidity),
    Slot::Numeric(RequestField::Moisture),
    Slot::Categorical { field: RequestField::SoilType, column: columns::SOIL_TYPE },
    Slot::Numeric(RequestField::Nitrogen),
    Slot::Numeric(RequestField::Phosphorous),
    Slot::Numeric(RequestField::Potassium),
];

const FERTILIZER_SLOTS: [Slot; 4] = [
    Slot::Categorical { field: RequestField::CropType, column: columns::CROP_TYPE },
    Slot::Numeric(RequestField::Nitrogen),
    Slot::Numeric(RequestField::Phosphorous),
    Slot::Numeric(RequestField::Potassium),
];

impl Schema {
    /// Every recommender, in training order.
    pub const ALL: [Schema; 2] = [Schema::Crop, Schema::Fertilizer];

    pub fn slots(self) -> &'static [Slot] {
        match self {
            Self::Crop       => &CROP_SLOTS,
            Self::Fertilizer => &FERTILIZER_SLOTS,
        }
    }

    pub fn width(self) -> usize {
        self.slots().len()
    }

    /// Column whose encoder decodes this model's predictions.
    pub fn target_column(self) -> &'static str {
        match self {
            Self::Crop       => columns::CROP_TYPE,
            Self::Fertilizer => columns::FERTILIZER_NAME,
        }
    }

    /// Stable artifact name of the model trained on this schema.
    pub fn model_name(self) -> &'static str {
        match self {
            Self::Crop       => "crop",
            Self::Fertilizer => "fertilizer",
        }
    }
}

// ─── FieldValues ──────────────────────────────────────────────────────────────
/// Read access to raw field values, whether they come from a
/// historical row or an incoming request.
pub trait FieldValues {
    fn number(&self, field: RequestField) -> AdvisorResult<f64>;
    fn text(&self, field: RequestField) -> AdvisorResult<&str>;
}

impl FieldValues for PredictionRequest {
    fn number(&self, field: RequestField) -> AdvisorResult<f64> {
        PredictionRequest::number(self, field)
    }

    fn text(&self, field: RequestField) -> AdvisorResult<&str> {
        PredictionRequest::text(self, field)
    }
}

impl FieldValues for FieldRecord {
    fn number(&self, field: RequestField) -> AdvisorResult<f64> {
        Ok(match field {
            RequestField::Temperature => self.temperature,
            RequestField::Humidity    => self.humidity,
            RequestField::Moisture    => self.moisture,
            RequestField::Nitrogen    => self.nitrogen,
            RequestField::Phosphorous => self.phosphorous,
            RequestField::Potassium   => self.potassium,
            other => {
                return Err(AdvisorError::InputFormat(format!(
                    "historical records carry no numeric field '{}'",
                    other.key()
                )))
            }
        })
    }

    fn text(&self, field: RequestField) -> AdvisorResult<&str> {
        match field {
            RequestField::SoilType => Ok(self.soil_type.as_str()),
            RequestField::CropType => Ok(self.crop_type.as_str()),
            other => Err(AdvisorError::InputFormat(format!(
                "historical records carry no categorical field '{}'",
                other.key()
            ))),
        }
    }
}

// ─── FeatureVector ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    schema: Schema,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

// ─── FeatureVectorBuilder ─────────────────────────────────────────────────────
pub struct FeatureVectorBuilder<'a> {
    encoders: &'a EncoderSet,
}

impl<'a> FeatureVectorBuilder<'a> {
    pub fn new(encoders: &'a EncoderSet) -> Self {
        Self { encoders }
    }

    /// Assemble the vector for `schema`, slot by slot, in schema order.
    /// The first missing, malformed or unknown field aborts the build.
    pub fn build<V: FieldValues + ?Sized>(
        &self,
        schema: Schema,
        source: &V,
    ) -> AdvisorResult<FeatureVector> {
        let mut values = Vec::with_capacity(schema.width());

        for slot in schema.slots() {
            let value = match *slot {
                Slot::Numeric(field) => source.number(field)?,
                Slot::Categorical { field, column } => {
                    let label = source.text(field)?;
                    self.encoders.get(column)?.encode(label)? as f64
                }
            };
            values.push(value);
        }

        Ok(FeatureVector { schema, values })
    }
}
