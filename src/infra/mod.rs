// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Files written next to a trained model:
//
//   checkpoint.rs — weights (CompactRecorder) + run_config.json,
//                   enough to rebuild the model for `predict`
//   metrics.rs    — per-epoch losses as metrics.csv
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
