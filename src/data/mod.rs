// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything between the CSV files on disk and the numeric
// matrices the classifiers are fitted on, plus the static
// yield reference table used at request time.
//
// Training flows in this order:
//
//   historical records CSV
//       │
//       ▼
//   CsvRecordLoader   → parses rows into FieldRecords
//       │
//       ▼
//   TargetDataset     → encodes rows for one recommender
//       │
//       ▼
//   split_train_test  → seeded train/test partition
//
// The yield table sits outside the training flow: it is read
// once per `estimate-yield` call by LookupTable.

/// Reads the historical field-records CSV
pub mod loader;

/// Seeded shuffle and train/test split
pub mod splitter;

/// Per-target encoded feature matrices
pub mod dataset;

/// Yield-per-hectare reference table
pub mod lookup;
