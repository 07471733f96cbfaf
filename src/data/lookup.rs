// ============================================================
// Layer 4 - Yield Lookup Table
// ============================================================
// Static reference table of historical average yield per
// hectare. One row per (metric, crop), one column per district:
//
//   Crop Type,Production Area Yield,Dhaka,Khulna,...
//   Rice,Production,...
//   Rice,Area,...
//   Rice,Yield,2500,2310,...
//
// Only rows whose metric is exactly "Yield" are consulted.
//
// Matching is asymmetric:
//   - crop names match case-insensitively ("rice" finds "Rice")
//   - district names must match the column header exactly
// An empty or non-numeric cell under an existing district column
// is reported the same way as a missing column.
//
// The table is immutable after loading and can be shared across
// threads by reference.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use crate::domain::error::{AdvisorError, AdvisorResult};

pub const CROP_COLUMN:   &str = "Crop Type";
pub const METRIC_COLUMN: &str = "Production Area Yield";
pub const YIELD_METRIC:  &str = "Yield";

#[derive(Debug, Clone, PartialEq)]
struct YieldRow {
    crop:   String,
    /// One cell per district, in `districts` order; None when blank
    values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LookupTable {
    districts: Vec<String>,
    rows:      Vec<YieldRow>,
}

impl LookupTable {
    pub fn from_path(path: impl AsRef<Path>) -> AdvisorResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            AdvisorError::ModelLoad(format!("cannot open yield table '{}': {e}", path.display()))
        })?;
        let table = Self::from_reader(file)?;
        tracing::debug!(
            "Loaded yield table '{}': {} crops, {} districts",
            path.display(),
            table.rows.len(),
            table.districts.len(),
        );
        Ok(table)
    }

    /// Parse the table from CSV. Every column other than the crop and
    /// metric columns is a district.
    pub fn from_reader<R: Read>(reader: R) -> AdvisorResult<Self> {
        let corrupt = |msg: String| AdvisorError::ModelLoad(format!("yield table: {msg}"));

        let mut csv = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let headers = csv.headers().map_err(|e| corrupt(e.to_string()))?.clone();

        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| corrupt(format!("missing column '{name}'")))
        };
        let crop_idx   = position(CROP_COLUMN)?;
        let metric_idx = position(METRIC_COLUMN)?;

        let district_idx: Vec<usize> = (0..headers.len())
            .filter(|&i| i != crop_idx && i != metric_idx)
            .collect();
        let districts = district_idx.iter().map(|&i| headers[i].to_string()).collect();

        let mut rows = Vec::new();
        for row in csv.records() {
            let row = row.map_err(|e| corrupt(e.to_string()))?;
            if row.get(metric_idx) != Some(YIELD_METRIC) {
                continue;
            }
            rows.push(YieldRow {
                crop:   row.get(crop_idx).unwrap_or_default().to_string(),
                values: district_idx
                    .iter()
                    .map(|&i| row.get(i).and_then(parse_cell))
                    .collect(),
            });
        }

        Ok(Self { districts, rows })
    }

    pub fn districts(&self) -> &[String] {
        &self.districts
    }

    /// Average yield per hectare for a crop in a district.
    pub fn yield_per_ha(&self, crop: &str, district: &str) -> AdvisorResult<f64> {
        let wanted = crop.to_lowercase();
        let row = self
            .rows
            .iter()
            .find(|r| r.crop.to_lowercase() == wanted)
            .ok_or_else(|| AdvisorError::InvalidCrop(crop.to_string()))?;

        let col = self
            .districts
            .iter()
            .position(|d| d == district)
            .ok_or_else(|| AdvisorError::InvalidDistrict(district.to_string()))?;

        row.values[col].ok_or_else(|| AdvisorError::InvalidDistrict(district.to_string()))
    }
}

// Thousands separators show up in exported spreadsheets ("2,500")
fn parse_cell(raw: &str) -> Option<f64> {
    raw.replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
Crop Type,Production Area Yield,Dhaka,Khulna,Sylhet
Rice,Production,10000,9000,8000
Rice,Yield,2500.0,\"2,310\",
Wheat,Area,40,30,20
Wheat,Yield,1800,1700,1600
";

    fn table() -> LookupTable {
        LookupTable::from_reader(TABLE.as_bytes()).unwrap()
    }

    #[test]
    fn test_only_yield_rows_are_kept() {
        let t = table();
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.districts(), ["Dhaka", "Khulna", "Sylhet"]);
    }

    #[test]
    fn test_crop_match_is_case_insensitive() {
        let t = table();
        assert_eq!(t.yield_per_ha("rice", "Dhaka").unwrap(), 2500.0);
        assert_eq!(t.yield_per_ha("WHEAT", "Sylhet").unwrap(), 1600.0);
    }

    #[test]
    fn test_district_match_is_exact() {
        let t = table();
        assert_eq!(
            t.yield_per_ha("Rice", "dhaka"),
            Err(AdvisorError::InvalidDistrict("dhaka".into()))
        );
    }

    #[test]
    fn test_thousands_separator_is_parsed() {
        assert_eq!(table().yield_per_ha("Rice", "Khulna").unwrap(), 2310.0);
    }

    #[test]
    fn test_blank_cell_reports_invalid_district() {
        assert_eq!(
            table().yield_per_ha("Rice", "Sylhet"),
            Err(AdvisorError::InvalidDistrict("Sylhet".into()))
        );
    }

    #[test]
    fn test_unknown_crop() {
        assert_eq!(
            table().yield_per_ha("Unicorn", "Dhaka"),
            Err(AdvisorError::InvalidCrop("Unicorn".into()))
        );
    }

    #[test]
    fn test_missing_metric_column_is_load_error() {
        let err = LookupTable::from_reader("Crop Type,Dhaka\nRice,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, AdvisorError::ModelLoad(_)));
    }

    #[test]
    fn test_missing_file_is_load_error() {
        assert!(matches!(
            LookupTable::from_path("/no/such/table.csv"),
            Err(AdvisorError::ModelLoad(_))
        ));
    }
}
