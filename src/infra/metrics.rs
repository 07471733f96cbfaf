// ============================================================
// Layer 6 - Metrics Logger
// ============================================================
// Records the held-out evaluation of every trained model to a
// CSV file in the artifact directory.
//
// One row per (run, target). The file is appended to across
// runs, so retraining into the same directory keeps a history:
//
//   run_id,target,train_rows,test_rows,accuracy
//   run-1718000000000-9a3c01f2,crop,5280,1320,0.962121
//   run-1718000000000-9a3c01f2,fertilizer,5280,1320,0.998485
//
// Output file: <artifacts_dir>/metrics.csv

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const METRICS_FILE: &str = "metrics.csv";

/// Test-split evaluation of one trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub run_id:     String,
    /// Model name: "crop" or "fertilizer"
    pub target:     String,
    pub train_rows: usize,
    pub test_rows:  usize,
    /// Fraction of test rows predicted correctly, in [0, 1]
    pub accuracy:   f64,
}

/// Appends evaluation rows to `metrics.csv`.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the directory if needed. The header is written the
    /// first time a row is logged into a new file.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics dir '{}'", dir.display()))?;
        Ok(Self { csv_path: dir.join(METRICS_FILE) })
    }

    pub fn log(&self, m: &EvaluationMetrics) -> Result<()> {
        let is_new = !self.csv_path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer.serialize(Row::from(m))?;
        writer.flush()?;

        tracing::debug!(
            "Logged {} metrics: accuracy={:.4} on {} test rows",
            m.target,
            m.accuracy,
            m.test_rows,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// Accuracy is written with six decimals
#[derive(Serialize)]
struct Row<'a> {
    run_id:     &'a str,
    target:     &'a str,
    train_rows: usize,
    test_rows:  usize,
    accuracy:   String,
}

impl<'a> From<&'a EvaluationMetrics> for Row<'a> {
    fn from(m: &'a EvaluationMetrics) -> Self {
        Self {
            run_id:     &m.run_id,
            target:     &m.target,
            train_rows: m.train_rows,
            test_rows:  m.test_rows,
            accuracy:   format!("{:.6}", m.accuracy),
        }
    }
}
