// ============================================================
// Layer 4 - Historical Records Loader
// ============================================================
// Reads the historical field-records CSV with the csv crate.
//
// Expected header (order does not matter, surrounding spaces are
// trimmed because the published dataset ships "Humidity " with a
// trailing blank):
//
//   Temparature,Humidity,Moisture,Soil Type,Crop Type,
//   Nitrogen,Potassium,Phosphorous,Fertilizer Name
//
// "Temperature" is accepted for the misspelled first column.
//
// A missing required column fails the whole load. A row with a
// non-numeric reading or an empty category is skipped with a
// warning, and a file with no usable rows at all is an error.

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::domain::error::{AdvisorError, AdvisorResult};
use crate::domain::record::{columns, FieldRecord};
use crate::domain::traits::RecordSource;

/// Loads every usable row of a historical records CSV file.
/// Implements the RecordSource trait from Layer 3.
pub struct CsvRecordLoader {
    path: PathBuf,
}

impl CsvRecordLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for CsvRecordLoader {
    fn load_all(&self) -> AdvisorResult<Vec<FieldRecord>> {
        let file = File::open(&self.path).map_err(|e| {
            AdvisorError::Training(format!("cannot open '{}': {e}", self.path.display()))
        })?;
        let records = read_records(file)?;
        tracing::info!("Loaded {} records from '{}'", records.len(), self.path.display());
        Ok(records)
    }
}

/// Parse historical records from any CSV byte stream.
pub fn read_records<R: Read>(reader: R) -> AdvisorResult<Vec<FieldRecord>> {
    let mut csv = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers = csv
        .headers()
        .map_err(|e| AdvisorError::Training(format!("cannot read CSV header: {e}")))?
        .clone();
    let layout = ColumnLayout::resolve(&headers)?;

    let mut records = Vec::new();
    for (i, row) in csv.records().enumerate() {
        // Line 1 is the header
        let line = i + 2;
        let parsed = row
            .map_err(|e| e.to_string())
            .and_then(|row| layout.parse(&row));
        match parsed {
            Ok(record) => records.push(record),
            Err(reason) => tracing::warn!("Skipping line {}: {}", line, reason),
        }
    }

    if records.is_empty() {
        return Err(AdvisorError::Training("no usable records in training data".into()));
    }
    Ok(records)
}

// ─── ColumnLayout ─────────────────────────────────────────────────────────────
// Header position of every required column.
struct ColumnLayout {
    temperature:     usize,
    humidity:        usize,
    moisture:        usize,
    soil_type:       usize,
    crop_type:       usize,
    nitrogen:        usize,
    potassium:       usize,
    phosphorous:     usize,
    fertilizer_name: usize,
}

impl ColumnLayout {
    fn resolve(headers: &StringRecord) -> AdvisorResult<Self> {
        let find = |names: &[&str]| -> AdvisorResult<usize> {
            headers
                .iter()
                .position(|h| names.contains(&h))
                .ok_or_else(|| {
                    AdvisorError::Training(format!("missing required column '{}'", names[0]))
                })
        };

        Ok(Self {
            temperature:     find(&["Temparature", "Temperature"])?,
            humidity:        find(&["Humidity"])?,
            moisture:        find(&["Moisture"])?,
            soil_type:       find(&[columns::SOIL_TYPE])?,
            crop_type:       find(&[columns::CROP_TYPE])?,
            nitrogen:        find(&["Nitrogen"])?,
            potassium:       find(&["Potassium"])?,
            phosphorous:     find(&["Phosphorous"])?,
            fertilizer_name: find(&[columns::FERTILIZER_NAME])?,
        })
    }

    fn parse(&self, row: &StringRecord) -> Result<FieldRecord, String> {
        let number = |idx: usize, name: &str| -> Result<f64, String> {
            let raw = row.get(idx).unwrap_or("");
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("'{name}' value '{raw}' is not a number"))
        };
        let category = |idx: usize, name: &str| -> Result<String, String> {
            match row.get(idx) {
                Some(v) if !v.is_empty() => Ok(v.to_string()),
                _ => Err(format!("'{name}' is empty")),
            }
        };

        Ok(FieldRecord {
            temperature:     number(self.temperature, "Temparature")?,
            humidity:        number(self.humidity, "Humidity")?,
            moisture:        number(self.moisture, "Moisture")?,
            soil_type:       category(self.soil_type, columns::SOIL_TYPE)?,
            crop_type:       category(self.crop_type, columns::CROP_TYPE)?,
            nitrogen:        number(self.nitrogen, "Nitrogen")?,
            potassium:       number(self.potassium, "Potassium")?,
            phosphorous:     number(self.phosphorous, "Phosphorous")?,
            fertilizer_name: category(self.fertilizer_name, columns::FERTILIZER_NAME)?,
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str =
        "Temparature,Humidity ,Moisture,Soil Type,Crop Type,Nitrogen,Potassium,Phosphorous,Fertilizer Name";

    #[test]
    fn test_reads_rows_with_padded_headers() {
        let csv = format!("{HEADER}\n26,52,38,Sandy,Maize,37,0,0,Urea\n29,52,45,Loamy,Sugarcane,12,0,36,DAP\n");
        let records = read_records(csv.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].humidity, 52.0);
        assert_eq!(records[1].soil_type, "Loamy");
        assert_eq!(records[1].phosphorous, 36.0);
        assert_eq!(records[1].fertilizer_name, "DAP");
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let csv = format!(
            "{HEADER}\n26,52,38,Sandy,Maize,37,0,0,Urea\n26,humid,38,Sandy,Maize,37,0,0,Urea\n26,52,38,,Maize,37,0,0,Urea\n"
        );
        let records = read_records(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_missing_column_is_training_error() {
        let csv = "Temparature,Humidity,Moisture\n1,2,3\n";
        let err = read_records(csv.as_bytes()).unwrap_err();
        assert_eq!(err, AdvisorError::Training("missing required column 'Soil Type'".into()));
    }

    #[test]
    fn test_empty_corpus_is_training_error() {
        let err = read_records(format!("{HEADER}\n").as_bytes()).unwrap_err();
        assert!(matches!(err, AdvisorError::Training(_)));
    }

    #[test]
    fn test_loader_reads_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "{}", HEADER.replace("Temparature", "Temperature")).expect("write header");
        writeln!(file, "34,65,62,Black,Cotton,7,9,30,10-26-26").expect("write row");

        let records = CsvRecordLoader::new(file.path()).load_all().expect("load CSV");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].temperature, 34.0);
        assert_eq!(records[0].crop_type, "Cotton");
    }

    #[test]
    fn test_missing_file_is_training_error() {
        let err = CsvRecordLoader::new("/definitely/not/here.csv").load_all().unwrap_err();
        assert!(matches!(err, AdvisorError::Training(msg) if msg.contains("cannot open")));
    }
}
