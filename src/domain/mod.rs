// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing the genomic
// prediction problem:
//
//   matrix.rs        — FeatureMatrix, TargetMatrix, SampleSet, Split
//   architecture.rs  — layer descriptors and the validated build plan
//   training.rs      — loss / optimizer identifiers, TrainingConfig
//   report.rs        — per-epoch metrics, FitReport, ConvergenceWarning
//   error.rs         — PipelineError
//   traits.rs        — TableSource and Predictor seams
//
// Rules for this layer:
//   - NO burn types
//   - NO file I/O
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

pub mod architecture;
pub mod error;
pub mod matrix;
pub mod report;
pub mod training;
pub mod traits;
