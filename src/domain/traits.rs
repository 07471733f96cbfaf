// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits, not
// against the CSV loader or a particular tree structure:
//   - CsvRecordLoader implements RecordSource
//   - DecisionTree, RandomForest and TrainedModel implement Classifier

use crate::domain::error::AdvisorResult;
use crate::domain::record::FieldRecord;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that can produce the historical training corpus.
pub trait RecordSource {
    fn load_all(&self) -> AdvisorResult<Vec<FieldRecord>>;
}

// ─── Classifier ───────────────────────────────────────────────────────────────
/// A fitted model mapping a fixed-width feature vector to a class index.
///
/// Implementations are immutable once fitted, so a loaded classifier can
/// be shared across threads behind `&` or `Arc` without locking.
pub trait Classifier: Send + Sync {
    /// Predicted class index for one feature vector.
    /// `features.len()` must equal `n_features()`.
    fn predict_one(&self, features: &[f64]) -> usize;

    /// Width of the feature vectors the model was fitted on.
    fn n_features(&self) -> usize;

    /// Number of classes in the target the model was fitted on.
    /// Every prediction is strictly below this value.
    fn n_classes(&self) -> usize;
}
