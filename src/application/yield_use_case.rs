// ============================================================
// Layer 2 - Yield Estimation Use Case
// ============================================================
// total yield = average yield per hectare (lookup table) × land area

use crate::data::lookup::LookupTable;
use crate::domain::error::{AdvisorError, AdvisorResult};
use crate::domain::request::{PredictionRequest, RequestField, YieldEstimate};

pub struct YieldEstimator<'a> {
    table: &'a LookupTable,
}

impl<'a> YieldEstimator<'a> {
    pub fn new(table: &'a LookupTable) -> Self {
        Self { table }
    }

    pub fn estimate(&self, crop: &str, district: &str, area: f64) -> AdvisorResult<YieldEstimate> {
        if !area.is_finite() {
            return Err(AdvisorError::InputFormat(format!(
                "field '{}' must be a finite number",
                RequestField::LandArea.key()
            )));
        }
        let per_ha = self.table.yield_per_ha(crop, district)?;
        tracing::debug!("{} in {}: {} per ha over {} ha", crop, district, per_ha, area);

        Ok(YieldEstimate {
            average_yield_per_ha:  per_ha,
            estimated_total_yield: per_ha * area,
        })
    }

    /// Request form: `crop`, `district`, `land_area`.
    pub fn estimate_request(&self, request: &PredictionRequest) -> AdvisorResult<YieldEstimate> {
        self.estimate(
            request.text(RequestField::Crop)?,
            request.text(RequestField::District)?,
            request.number(RequestField::LandArea)?,
        )
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LookupTable {
        LookupTable::from_reader(
            "Crop Type,Production Area Yield,X,Y\nRice,Area,10,20\nRice,Yield,2500.0,\nJute,Yield,1200,1300\n"
                .as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn test_total_is_average_times_area() {
        let t   = table();
        let out = YieldEstimator::new(&t).estimate("Rice", "X", 4.0).unwrap();
        assert_eq!(out, YieldEstimate { average_yield_per_ha: 2500.0, estimated_total_yield: 10000.0 });
    }

    #[test]
    fn test_errors_from_lookup() {
        let t = table();
        let e = YieldEstimator::new(&t);
        assert_eq!(e.estimate("Unicorn", "X", 1.0), Err(AdvisorError::InvalidCrop("Unicorn".into())));
        assert_eq!(e.estimate("Rice", "Z", 1.0), Err(AdvisorError::InvalidDistrict("Z".into())));
        assert_eq!(e.estimate("Rice", "Y", 1.0), Err(AdvisorError::InvalidDistrict("Y".into())));
    }

    #[test]
    fn test_request_form() {
        let t   = table();
        let req = PredictionRequest::from_json(r#"{"crop": "jute", "district": "Y", "land_area": "2.5"}"#)
            .unwrap();
        let out = YieldEstimator::new(&t).estimate_request(&req).unwrap();
        assert_eq!(out.estimated_total_yield, 3250.0);
    }

    #[test]
    fn test_non_numeric_area_is_input_format() {
        let t   = table();
        let req = PredictionRequest::from_json(r#"{"crop": "Rice", "district": "X", "land_area": "big"}"#)
            .unwrap();
        assert!(matches!(
            YieldEstimator::new(&t).estimate_request(&req),
            Err(AdvisorError::InputFormat(_))
        ));
        assert!(matches!(
            YieldEstimator::new(&t).estimate("Rice", "X", f64::NAN),
            Err(AdvisorError::InputFormat(_))
        ));
    }
}
