// ============================================================
// Layer 5 - Categorical Encoders
// ============================================================
// Bidirectional mapping between the string labels of one
// categorical column (soil type, crop type, fertilizer name)
// and dense integer codes 0..n.
//
// Code assignment is lexicographic: the distinct labels are
// sorted byte-wise ascending and a label's code is its position.
// This makes the mapping depend only on the SET of labels seen,
// never on row order, so retraining on the same corpus always
// yields the same codes.
//
//   fit(["Sandy", "Clayey", "Sandy", "Black"])
//     Black → 0, Clayey → 1, Sandy → 2
//
// Encoders are never mutated after fit. A model trained against
// one encoder is only valid with that exact label order, which is
// why encoders are persisted in the same artifact set as the
// models (see infra::checkpoint).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::{AdvisorError, AdvisorResult};
use crate::domain::record::{columns, FieldRecord};

// ─── CategoricalEncoder ───────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EncoderRecord", into = "EncoderRecord")]
pub struct CategoricalEncoder {
    /// Column this encoder was fitted on; used in error messages
    name:   String,
    /// Distinct labels, strictly ascending. Code = index.
    labels: Vec<String>,
}

impl CategoricalEncoder {
    /// Fit an encoder over the distinct values of a column.
    pub fn fit<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut labels: Vec<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();
        labels.sort_unstable();
        labels.dedup();
        Self { name: name.into(), labels }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fitted domain in code order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.code_of(label).is_some()
    }

    /// Label → code. Labels outside the fitted domain are never coerced.
    pub fn encode(&self, label: &str) -> AdvisorResult<usize> {
        self.code_of(label)
            .ok_or_else(|| AdvisorError::unknown_category(&self.name, label))
    }

    /// Code → label. A code past the end means the caller paired this
    /// encoder with a model from a different fit.
    pub fn decode(&self, code: usize) -> AdvisorResult<&str> {
        self.labels
            .get(code)
            .map(String::as_str)
            .ok_or_else(|| AdvisorError::InvalidCode {
                encoder: self.name.clone(),
                code,
                size:    self.labels.len(),
            })
    }

    fn code_of(&self, label: &str) -> Option<usize> {
        self.labels
            .binary_search_by(|probe| probe.as_str().cmp(label))
            .ok()
    }
}

// Serialised shape. Loading re-checks the ordering invariant so a
// hand-edited or truncated artifact cannot silently shift codes.
#[derive(Serialize, Deserialize)]
struct EncoderRecord {
    name:   String,
    labels: Vec<String>,
}

impl TryFrom<EncoderRecord> for CategoricalEncoder {
    type Error = String;

    fn try_from(r: EncoderRecord) -> Result<Self, Self::Error> {
        if let Some(w) = r.labels.windows(2).find(|w| w[0] >= w[1]) {
            return Err(format!(
                "encoder '{}' labels are not strictly ascending ('{}' before '{}')",
                r.name, w[0], w[1]
            ));
        }
        Ok(Self { name: r.name, labels: r.labels })
    }
}

impl From<CategoricalEncoder> for EncoderRecord {
    fn from(e: CategoricalEncoder) -> Self {
        Self { name: e.name, labels: e.labels }
    }
}

// ─── EncoderSet ───────────────────────────────────────────────────────────────
/// All encoders of one training run, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncoderSet {
    encoders: BTreeMap<String, CategoricalEncoder>,
}

impl EncoderSet {
    /// Fit one encoder per categorical column of the corpus.
    pub fn fit(records: &[FieldRecord]) -> Self {
        let mut set = Self::default();
        for column in columns::CATEGORICAL {
            let encoder = CategoricalEncoder::fit(
                column,
                records.iter().filter_map(|r| r.category(column)),
            );
            tracing::debug!("Fitted '{}' encoder with {} labels", column, encoder.len());
            set.insert(encoder);
        }
        set
    }

    pub fn insert(&mut self, encoder: CategoricalEncoder) {
        self.encoders.insert(encoder.name().to_string(), encoder);
    }

    /// Encoder for a column. A missing encoder in a loaded set is an
    /// artifact problem, not a request problem.
    pub fn get(&self, column: &str) -> AdvisorResult<&CategoricalEncoder> {
        self.encoders
            .get(column)
            .ok_or_else(|| AdvisorError::ModelLoad(format!("no encoder for column '{column}'")))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoricalEncoder> {
        self.encoders.values()
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}
