// ============================================================
// Layer 2 - Recommendation Use Case
// ============================================================
// Answers crop and fertilizer requests against one loaded
// ModelRegistry:
//
//   recommend_crop        reading ──crop schema──→ crop model ──→ crop label
//   recommend_fertilizer  crop + N, P, K ──fertilizer schema──→ label
//   recommend             reading ──crop──┐
//                                         └─→ fertilizer (same N, P, K)
//
// The service only borrows the registry and does no I/O, so any
// number of threads can run requests through it at once.

use crate::domain::error::{AdvisorError, AdvisorResult};
use crate::domain::record::columns;
use crate::domain::request::{
    CropRecommendation, FertilizerRecommendation, PredictionRequest, Recommendation, RequestField,
};
use crate::domain::traits::Classifier;
use crate::ml::features::{FeatureVector, FeatureVectorBuilder, FieldValues, Schema};
use crate::ml::registry::ModelRegistry;

pub struct InferenceService<'a> {
    registry: &'a ModelRegistry,
}

impl<'a> InferenceService<'a> {
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self { registry }
    }

    /// Crop for a full soil/climate reading.
    pub fn recommend_crop(&self, reading: &PredictionRequest) -> AdvisorResult<CropRecommendation> {
        // Unknown soil is reported as such, never mapped to a default code
        let soil = reading.text(RequestField::SoilType)?;
        let soil_encoder = self.registry.encoders().get(columns::SOIL_TYPE)?;
        if !soil_encoder.contains(soil) {
            return Err(AdvisorError::unknown_category(columns::SOIL_TYPE, soil));
        }

        let features = self.build(Schema::Crop, reading)?;
        let crop     = self.predict(&features)?;
        tracing::debug!("Recommended crop '{}' for soil '{}'", crop, soil);
        Ok(CropRecommendation { recommended_crop: crop })
    }

    /// Fertilizer for a crop label and the three nutrient readings.
    pub fn recommend_fertilizer(
        &self,
        crop:        &str,
        nitrogen:    f64,
        phosphorous: f64,
        potassium:   f64,
    ) -> AdvisorResult<String> {
        let input = FertilizerInput { crop, nitrogen, phosphorous, potassium };
        let features = self.build(Schema::Fertilizer, &input)?;
        self.predict(&features)
    }

    /// Fertilizer for a request carrying `crop_type` and N, P, K.
    pub fn recommend_fertilizer_request(
        &self,
        request: &PredictionRequest,
    ) -> AdvisorResult<FertilizerRecommendation> {
        let features = self.build(Schema::Fertilizer, request)?;
        Ok(FertilizerRecommendation { recommended_fertilizer: self.predict(&features)? })
    }

    /// Crop for the reading, then the fertilizer for that crop.
    pub fn recommend(&self, reading: &PredictionRequest) -> AdvisorResult<Recommendation> {
        let crop = self.recommend_crop(reading)?.recommended_crop;
        let fertilizer = self.recommend_fertilizer(
            &crop,
            reading.number(RequestField::Nitrogen)?,
            reading.number(RequestField::Phosphorous)?,
            reading.number(RequestField::Potassium)?,
        )?;
        Ok(Recommendation { recommended_crop: crop, recommended_fertilizer: fertilizer })
    }

    fn build<V: FieldValues + ?Sized>(&self, schema: Schema, source: &V) -> AdvisorResult<FeatureVector> {
        FeatureVectorBuilder::new(self.registry.encoders()).build(schema, source)
    }

    fn predict(&self, features: &FeatureVector) -> AdvisorResult<String> {
        let schema = features.schema();
        let code   = self.registry.model(schema).predict_one(features.as_slice());
        let label  = self.registry.decoder(schema)?.decode(code)?;
        Ok(label.to_string())
    }
}

// Typed input of the fertilizer step, e.g. the crop just predicted
struct FertilizerInput<'s> {
    crop:        &'s str,
    nitrogen:    f64,
    phosphorous: f64,
    potassium:   f64,
}

impl FieldValues for FertilizerInput<'_> {
    fn number(&self, field: RequestField) -> AdvisorResult<f64> {
        match field {
            RequestField::Nitrogen    => Ok(self.nitrogen),
            RequestField::Phosphorous => Ok(self.phosphorous),
            RequestField::Potassium   => Ok(self.potassium),
            other => Err(AdvisorError::InputFormat(format!(
                "fertilizer input has no numeric field '{}'",
                other.key()
            ))),
        }
    }

    fn text(&self, field: RequestField) -> AdvisorResult<&str> {
        match field {
            RequestField::CropType => Ok(self.crop),
            other => Err(AdvisorError::InputFormat(format!(
                "fertilizer input has no field '{}'",
                other.key()
            ))),
        }
    }
}
