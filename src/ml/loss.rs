// ============================================================
// Layer 5 — Loss Functions
// ============================================================
// Losses are written as tensor expressions so they stay on the
// autodiff graph:
//
//   MSE:  mean((ŷ − y)²)                             over all elements
//   BCE:  mean(−(y·ln ŷ + (1 − y)·ln(1 − ŷ)))        over all elements
//   CCE:  mean over rows of −Σ_c y_c·ln ŷ_c
//
// Cross-entropies expect probabilities (sigmoid / softmax outputs);
// predictions are clamped to [ε, 1 − ε] before the log.

use burn::prelude::*;

use crate::domain::architecture::Activation;
use crate::domain::error::{PipelineError, Result};
use crate::domain::matrix::TargetMatrix;
use crate::domain::training::LossKind;

const EPSILON: f64 = 1e-7;

/// Scalar loss of `predictions` against `targets`, both `[batch, M]`.
pub fn compute<B: Backend>(kind: LossKind, predictions: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    match kind {
        LossKind::MeanSquaredError => {
            let diff = predictions - targets;
            diff.clone().mul(diff).mean()
        }
        LossKind::BinaryCrossEntropy => {
            let p = predictions.clamp(EPSILON, 1.0 - EPSILON);
            let positive = targets.clone().mul(p.clone().log());
            let negative = targets.neg().add_scalar(1.0).mul(p.neg().add_scalar(1.0).log());
            positive.add(negative).neg().mean()
        }
        LossKind::CategoricalCrossEntropy => {
            let p = predictions.clamp(EPSILON, 1.0 - EPSILON);
            targets.mul(p.log()).sum_dim(1).neg().mean()
        }
    }
}

/// Check that the targets suit the loss before any training happens.
///
/// Mismatched output activations only produce a warning: a linear head
/// with a cross-entropy loss trains, it just trains badly.
pub fn check_targets(kind: LossKind, targets: &TargetMatrix, output: Activation) -> Result<()> {
    match kind {
        LossKind::MeanSquaredError => {}
        LossKind::BinaryCrossEntropy => {
            if !targets.is_binary() {
                return Err(PipelineError::DataFormat(
                    "binary cross-entropy needs 0/1 targets".into(),
                ));
            }
            if output != Activation::Sigmoid {
                tracing::warn!("binary cross-entropy with a {output} output layer; expected sigmoid");
            }
        }
        LossKind::CategoricalCrossEntropy => {
            let one_hot = targets.is_binary()
                && targets.view().rows().into_iter().all(|row| row.sum() == 1.0);
            if targets.ncols() < 2 || !one_hot {
                return Err(PipelineError::DataFormat(
                    "categorical cross-entropy needs one-hot targets with at least two classes".into(),
                ));
            }
            if output != Activation::Softmax {
                tracing::warn!("categorical cross-entropy with a {output} output layer; expected softmax");
            }
        }
    }
    Ok(())
}
