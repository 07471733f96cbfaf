// ============================================================
// Layer 3 - Requests and Results
// ============================================================
// A request is whatever JSON object the caller passed on the
// command line. It stays untyped until the FeatureVectorBuilder
// (Layer 5) coerces the fields a given model needs, so one
// request shape can feed the crop model, the fertilizer model,
// or both.
//
// Each field has a canonical snake_case key plus the legacy
// spellings older callers still send (including the historical
// "Temparature" typo).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::error::{AdvisorError, AdvisorResult};

// ─── RequestField ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestField {
    Temperature,
    Humidity,
    Moisture,
    SoilType,
    Nitrogen,
    Phosphorous,
    Potassium,
    CropType,
    Crop,
    District,
    LandArea,
}

impl RequestField {
    /// Canonical key, used in error messages.
    pub fn key(self) -> &'static str {
        self.accepted_keys()[0]
    }

    /// Every key this field may arrive under, canonical first.
    pub fn accepted_keys(self) -> &'static [&'static str] {
        match self {
            Self::Temperature => &["temperature", "Temparature", "Temperature"],
            Self::Humidity    => &["humidity", "Humidity"],
            Self::Moisture    => &["moisture", "Moisture"],
            Self::SoilType    => &["soil_type", "SoilType", "Soil Type"],
            Self::Nitrogen    => &["nitrogen", "Nitrogen"],
            Self::Phosphorous => &["phosphorous", "Phosphorous"],
            Self::Potassium   => &["potassium", "Potassium"],
            Self::CropType    => &["crop_type", "CropType", "Crop Type"],
            Self::Crop        => &["crop"],
            Self::District    => &["district"],
            Self::LandArea    => &["land_area"],
        }
    }
}

// ─── PredictionRequest ────────────────────────────────────────────────────────
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionRequest {
    fields: Map<String, Value>,
}

impl PredictionRequest {
    /// Parse the single JSON argument of an invocation.
    /// Anything other than a JSON object is an input format error.
    pub fn from_json(raw: &str) -> AdvisorResult<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| AdvisorError::InputFormat(e.to_string()))?;
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(AdvisorError::InputFormat(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Raw value of a field under any of its accepted keys.
    pub fn get(&self, field: RequestField) -> Option<&Value> {
        field
            .accepted_keys()
            .iter()
            .find_map(|key| self.fields.get(*key))
    }

    /// Required field, or an input format error naming it.
    pub fn require(&self, field: RequestField) -> AdvisorResult<&Value> {
        self.get(field).ok_or_else(|| {
            AdvisorError::InputFormat(format!("missing required field '{}'", field.key()))
        })
    }

    /// Numeric field. JSON integers, floats and numeric strings are
    /// accepted; non-finite results are rejected.
    pub fn number(&self, field: RequestField) -> AdvisorResult<f64> {
        let value = self.require(field)?;
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed {
            Some(v) if v.is_finite() => Ok(v),
            _ => Err(AdvisorError::InputFormat(format!(
                "field '{}' must be numeric, got {}",
                field.key(),
                value
            ))),
        }
    }

    /// String field (categorical selections, names).
    pub fn text(&self, field: RequestField) -> AdvisorResult<&str> {
        match self.require(field)? {
            Value::String(s) => Ok(s.as_str()),
            other => Err(AdvisorError::InputFormat(format!(
                "field '{}' must be a string, got {}",
                field.key(),
                json_type_name(other)
            ))),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null      => "null",
        Value::Bool(_)   => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_)  => "array",
        Value::Object(_) => "object",
    }
}

// ─── Results ──────────────────────────────────────────────────────────────────
// Output key names are part of the invocation contract.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecommendation {
    pub recommended_crop: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizerRecommendation {
    pub recommended_fertilizer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommended_crop:       String,
    pub recommended_fertilizer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldEstimate {
    pub average_yield_per_ha:  f64,
    pub estimated_total_yield: f64,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_accepts_ints_floats_and_numeric_strings() {
        let req = PredictionRequest::from_json(
            r#"{"nitrogen": 37, "humidity": 52.5, "moisture": " 38 "}"#,
        ).unwrap();
        assert_eq!(req.number(RequestField::Nitrogen).unwrap(), 37.0);
        assert_eq!(req.number(RequestField::Humidity).unwrap(), 52.5);
        assert_eq!(req.number(RequestField::Moisture).unwrap(), 38.0);
    }

    #[test]
    fn test_number_rejects_non_numeric() {
        let req = PredictionRequest::from_json(
            r#"{"nitrogen": "lots", "potassium": true, "phosphorous": null}"#,
        ).unwrap();
        for field in [RequestField::Nitrogen, RequestField::Potassium, RequestField::Phosphorous] {
            assert!(matches!(req.number(field), Err(AdvisorError::InputFormat(_))));
        }
    }

    #[test]
    fn test_legacy_keys_are_accepted() {
        let req = PredictionRequest::from_json(r#"{"Temparature": 26, "SoilType": "Sandy"}"#)
            .unwrap();
        assert_eq!(req.number(RequestField::Temperature).unwrap(), 26.0);
        assert_eq!(req.text(RequestField::SoilType).unwrap(), "Sandy");
    }

    #[test]
    fn test_missing_field_names_canonical_key() {
        let req = PredictionRequest::from_json("{}").unwrap();
        let err = req.number(RequestField::Temperature).unwrap_err();
        assert_eq!(
            err,
            AdvisorError::InputFormat("missing required field 'temperature'".into())
        );
    }

    #[test]
    fn test_non_object_payload_is_rejected() {
        assert!(matches!(
            PredictionRequest::from_json("[1, 2]"),
            Err(AdvisorError::InputFormat(_))
        ));
        assert!(matches!(
            PredictionRequest::from_json("not json"),
            Err(AdvisorError::InputFormat(_))
        ));
    }

    #[test]
    fn test_text_rejects_numbers() {
        let req = PredictionRequest::from_json(r#"{"soil_type": 3}"#).unwrap();
        assert!(matches!(req.text(RequestField::SoilType), Err(AdvisorError::InputFormat(_))));
    }
}
