// ============================================================
// Layer 3 — Pipeline Errors
// ============================================================
// Every failure the library can report. Shape and format problems
// are detected when data is loaded or a model is built, never from
// inside the epoch loop.
//
// Non-fatal training problems are not errors: they are reported as
// ConvergenceWarning values on the FitReport (see report.rs).

use thiserror::Error;

/// Result alias used across the library layers
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Malformed table, non-numeric cell, or mismatched row counts
    #[error("data format error: {0}")]
    DataFormat(String),

    /// Split ratio outside the open interval (0, 1)
    #[error("invalid split ratio {0}: must lie strictly between 0 and 1")]
    InvalidRatio(f64),

    /// Declared architecture width disagrees with the data
    #[error("shape mismatch on {what}: architecture declares {expected}, data has {actual}")]
    ShapeMismatch {
        what:     &'static str,
        expected: usize,
        actual:   usize,
    },

    /// Structurally invalid layer sequence
    #[error("invalid architecture: {0}")]
    Architecture(String),

    /// Invalid training configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
