// ============================================================
// Layer 3 - Error Taxonomy
// ============================================================
// Every public operation of the advisor returns one of these
// errors. The set is closed: callers branch on `kind()` rather
// than on message text, and the CLI maps each kind to a fixed
// exit code.
//
// None of these errors are retried. Given the same input and
// the same artifact set they fail the same way every time.

use serde::Serialize;
use thiserror::Error;

/// Result alias used by the domain, data and ml layers.
pub type AdvisorResult<T> = std::result::Result<T, AdvisorError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdvisorError {
    /// An artifact is missing, unparsable, from another training
    /// run, or written by an incompatible format version.
    #[error("model loading error: {0}")]
    ModelLoad(String),

    /// A request field is missing or not of the expected type.
    #[error("invalid input format: {0}")]
    InputFormat(String),

    /// A categorical value was never seen when the encoder was fitted.
    #[error("{field} '{label}' not recognized")]
    UnknownCategory { field: String, label: String },

    /// The model produced a class index the paired encoder cannot
    /// decode. Only possible when a model and encoder are mismatched.
    #[error("class index {code} is outside the '{encoder}' encoder domain (size {size})")]
    InvalidCode { encoder: String, code: usize, size: usize },

    #[error("Invalid crop type: {0}")]
    InvalidCrop(String),

    #[error("Invalid district name: {0}")]
    InvalidDistrict(String),

    /// Offline stage only: the historical corpus cannot be used.
    #[error("training error: {0}")]
    Training(String),
}

/// Machine-readable name of an error, emitted next to the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ModelLoad,
    InputFormat,
    UnknownCategory,
    InvalidCode,
    InvalidCrop,
    InvalidDistrict,
    Training,
}

impl AdvisorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ModelLoad(_)             => ErrorKind::ModelLoad,
            Self::InputFormat(_)           => ErrorKind::InputFormat,
            Self::UnknownCategory { .. }   => ErrorKind::UnknownCategory,
            Self::InvalidCode { .. }       => ErrorKind::InvalidCode,
            Self::InvalidCrop(_)           => ErrorKind::InvalidCrop,
            Self::InvalidDistrict(_)       => ErrorKind::InvalidDistrict,
            Self::Training(_)              => ErrorKind::Training,
        }
    }

    /// Process exit status for this error. Zero is reserved for success
    /// and 1 for failures that never reached the advisor (bad CLI usage,
    /// unexpected I/O).
    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::ModelLoad       => 3,
            ErrorKind::InputFormat     => 4,
            ErrorKind::UnknownCategory => 5,
            ErrorKind::InvalidCode     => 6,
            ErrorKind::InvalidCrop     => 7,
            ErrorKind::InvalidDistrict => 8,
            ErrorKind::Training        => 9,
        }
    }

    pub(crate) fn unknown_category(field: impl Into<String>, label: impl Into<String>) -> Self {
        Self::UnknownCategory { field: field.into(), label: label.into() }
    }
}
