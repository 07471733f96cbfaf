// ============================================================
// Layer 3 - FieldRecord Domain Type
// ============================================================
// One row of the historical corpus the recommenders learn from:
// climate readings, soil class, soil nutrients, and the crop and
// fertilizer that were used on that field.
//
// The three string columns are the categorical ones. Training
// fits one encoder per column and rewrites them to integer codes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub temperature:     f64,
    pub humidity:        f64,
    pub moisture:        f64,
    pub soil_type:       String,
    pub crop_type:       String,
    pub nitrogen:        f64,
    pub potassium:       f64,
    pub phosphorous:     f64,
    pub fertilizer_name: String,
}

/// Names of the categorical columns, exactly as they appear in the
/// historical CSV header. These double as encoder artifact keys.
pub mod columns {
    pub const SOIL_TYPE:       &str = "Soil Type";
    pub const CROP_TYPE:       &str = "Crop Type";
    pub const FERTILIZER_NAME: &str = "Fertilizer Name";

    pub const CATEGORICAL: [&str; 3] = [SOIL_TYPE, CROP_TYPE, FERTILIZER_NAME];
}

impl FieldRecord {
    /// Value of a categorical column by its header name.
    pub fn category(&self, column: &str) -> Option<&str> {
        match column {
            columns::SOIL_TYPE       => Some(self.soil_type.as_str()),
            columns::CROP_TYPE       => Some(self.crop_type.as_str()),
            columns::FERTILIZER_NAME => Some(self.fertilizer_name.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_lookup_by_header_name() {
        let r = FieldRecord {
            temperature: 26.0, humidity: 52.0, moisture: 38.0,
            soil_type: "Sandy".into(), crop_type: "Maize".into(),
            nitrogen: 37.0, potassium: 0.0, phosphorous: 0.0,
            fertilizer_name: "Urea".into(),
        };
        assert_eq!(r.category(columns::SOIL_TYPE), Some("Sandy"));
        assert_eq!(r.category(columns::FERTILIZER_NAME), Some("Urea"));
        assert_eq!(r.category("Humidity"), None);
    }
}
