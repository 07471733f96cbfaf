// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that define what the
// advisor works with: historical field records, incoming
// requests, outgoing results, and the closed set of errors.
//
// Rules for this layer:
//   - NO file I/O
//   - NO model or encoder internals
//   - Only plain data and the traits other layers implement

// A row of the historical training corpus
pub mod record;

// Untyped JSON requests and the typed results returned for them
pub mod request;

// AdvisorError and its machine-readable ErrorKind
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;
