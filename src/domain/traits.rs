// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The two seams of the pipeline:
//
//   TableSource — anything that yields a SampleSet
//                 (whitespace tables on disk, in-memory fixtures, ...)
//
//   Predictor   — the fit / predict / evaluate contract shared by the
//                 dense, convolutional and recurrent models
//
// Building a predictor from an ArchitectureSpec is the job of each
// implementation's constructor (see ml::model::Model::build).
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::domain::error::Result;
use crate::domain::matrix::{FeatureMatrix, SampleSet, TargetMatrix};
use crate::domain::report::FitReport;
use crate::domain::training::TrainingConfig;

// ─── TableSource ──────────────────────────────────────────────────────────────
pub trait TableSource {
    /// Read features and targets; row counts are guaranteed to match.
    fn load(&self) -> Result<SampleSet>;
}

// ─── Predictor ────────────────────────────────────────────────────────────────
/// A supervised model whose parameters are owned by the implementation.
///
/// `fit` is the only method that mutates parameters; `predict` and
/// `evaluate` take `&self`.
pub trait Predictor {
    /// Iterative mini-batch optimisation over `train`.
    fn fit(&mut self, train: &SampleSet, config: &TrainingConfig) -> Result<FitReport>;

    /// One output row per input row.
    fn predict(&self, features: &FeatureMatrix) -> Result<TargetMatrix>;

    /// Scalar loss of the predictions against `data`'s targets.
    fn evaluate(&self, data: &SampleSet) -> Result<f64>;
}
