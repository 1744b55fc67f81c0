// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the text tables on disk and the tensor
// batches the training loop consumes:
//
//   features.txt / targets.txt
//       │
//       ▼
//   TableLoader        → parses whitespace tables into a SampleSet
//       │
//       ▼
//   Splitter           → seeded, disjoint train / test row indices
//       │
//       ▼
//   GenomicDataset     → implements burn's Dataset trait
//       │
//       ▼
//   GenomicBatcher     → stacks rows into [batch, P] / [batch, M] tensors
//       │
//       ▼
//   DataLoader         → feeds (shuffled) batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Whitespace / delimited numeric table parsing and formatting
pub mod table;

/// Loads the feature and target tables from disk
pub mod loader;

/// Seeded train/test splitting
pub mod splitter;

/// Implements burn's Dataset trait over a SampleSet
pub mod dataset;

/// Implements burn's Batcher trait to create tensor batches
pub mod batcher;
