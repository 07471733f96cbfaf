// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Workflow coordination only: these modules tell the data, ml
// and infra layers what to do, in what order. No tree math, no
// CSV parsing and no printing happens here.

// Offline training pipeline
pub mod train_use_case;

// Crop and fertilizer recommendations
pub mod recommend_use_case;

// Yield estimation from the lookup table
pub mod yield_use_case;
