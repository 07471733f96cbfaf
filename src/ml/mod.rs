// ============================================================
// Layer 5 - ML / Model Layer
// ============================================================
// Everything that turns labelled rows into classifiers and
// classifiers back into labels.
//
//   encoder.rs   - label ↔ code mapping per categorical column
//   features.rs  - the two feature schemas and the builder that
//                  fills them from records or requests
//   tree.rs      - CART decision tree (Gini, flat node array)
//   forest.rs    - bagged ensemble of CART trees
//   model.rs     - the persisted model: forest or single tree
//   trainer.rs   - fit + held-out evaluation for one target
//   registry.rs  - the loaded, validated artifact set used at
//                  inference time

/// Categorical encoders
pub mod encoder;

/// Feature schemas and vector builder
pub mod features;

/// CART decision tree
pub mod tree;

/// Random forest classifier
pub mod forest;

/// Serialisable trained model
pub mod model;

/// Fit and evaluate one recommender
pub mod trainer;

/// Read-only registry of one training run
pub mod registry;
