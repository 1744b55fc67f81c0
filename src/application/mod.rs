// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers; no tensor code and no printing.
//
//   train_use_case.rs   — load → split → build → fit → evaluate → save
//   predict_use_case.rs — checkpoint → predictions for a new table

/// The training pipeline
pub mod train_use_case;

/// Inference from a saved checkpoint
pub mod predict_use_case;
