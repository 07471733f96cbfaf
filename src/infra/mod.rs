// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Filesystem concerns shared by training and inference:
//
//   checkpoint.rs - the artifact store
//                   Writes every encoder and model of a
//                   training run as versioned JSON envelopes
//                   plus a manifest, and loads them back as
//                   one cross-checked set. Also saves the
//                   TrainConfig of the run.
//
//   metrics.rs    - evaluation logging
//                   Appends per-target test accuracy to
//                   metrics.csv in the artifact directory.

/// Artifact set saving and loading
pub mod checkpoint;

/// Evaluation metrics CSV logger
pub mod metrics;
