// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Every piece of code that touches burn tensors lives here. The
// domain layer describes models as plain data (ArchitectureSpec,
// TrainingConfig); this layer turns those descriptions into modules,
// trains them and scores them.
//
//   backend.rs        — Autodiff<NdArray> for training (Wgpu behind a feature)
//   activation.rs     — activation functions by name
//   regularization.rs — L1 / L2 / Elastic Net penalty terms
//   loss.rs           — MSE, binary and categorical cross-entropy
//   network.rs        — DenseNet, ConvNet, RecurrentNet modules
//   model.rs          — Model facade implementing Predictor
//   optimizer.rs      — SGD, momentum, Adam, RMSProp configs
//   early_stopping.rs — patience / min_delta bookkeeping
//   trainer.rs        — epoch loop, evaluation, prediction
//   summary.rs        — per-layer shape and parameter table
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

pub mod activation;
pub mod backend;
pub mod early_stopping;
pub mod loss;
pub mod model;
pub mod network;
pub mod optimizer;
pub mod regularization;
pub mod summary;
pub mod trainer;
