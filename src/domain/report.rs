// ============================================================
// Layer 3 — Training Report
// ============================================================
// What a fit produces besides the mutated model parameters:
// the per-epoch loss history, whether early stopping fired, and any
// non-fatal convergence warnings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Losses recorded at the end of one epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Epoch number (starts at 1)
    pub epoch: usize,

    /// Mean data loss over the epoch's training batches,
    /// regularization penalties excluded
    pub train_loss: f64,

    /// Loss on the validation hold-out, when one was configured
    pub val_loss: Option<f64>,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: Option<f64>) -> Self {
        Self { epoch, train_loss, val_loss }
    }
}

/// Non-fatal: training finished but the loss did not behave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConvergenceWarning {
    /// Final epoch loss is not below the first epoch loss
    LossNotDecreasing { first: f64, last: f64 },
    /// Loss became NaN or infinite
    NonFiniteLoss { epoch: usize },
}

impl fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LossNotDecreasing { first, last } => write!(
                f,
                "training loss did not decrease (first epoch {first:.6}, last epoch {last:.6})"
            ),
            Self::NonFiniteLoss { epoch } => write!(f, "loss became non-finite at epoch {epoch}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FitReport {
    pub history:       Vec<EpochMetrics>,
    pub stopped_early: bool,
    pub warnings:      Vec<ConvergenceWarning>,
}

impl FitReport {
    pub fn epochs_run(&self) -> usize {
        self.history.len()
    }

    pub fn final_train_loss(&self) -> Option<f64> {
        self.history.last().map(|m| m.train_loss)
    }

    /// Inspect the loss history and record convergence warnings.
    pub fn check_convergence(&mut self) {
        if let Some(bad) = self.history.iter().find(|m| {
            !m.train_loss.is_finite() || m.val_loss.is_some_and(|v| !v.is_finite())
        }) {
            self.warnings.push(ConvergenceWarning::NonFiniteLoss { epoch: bad.epoch });
            return;
        }
        if let (Some(first), Some(last)) = (self.history.first(), self.history.last()) {
            if self.history.len() > 1 && last.train_loss >= first.train_loss {
                self.warnings.push(ConvergenceWarning::LossNotDecreasing {
                    first: first.train_loss,
                    last:  last.train_loss,
                });
            }
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn report(losses: &[f64]) -> FitReport {
        FitReport {
            history: losses
                .iter()
                .enumerate()
                .map(|(i, &l)| EpochMetrics::new(i + 1, l, None))
                .collect(),
            ..FitReport::default()
        }
    }

    #[test]
    fn test_decreasing_loss_has_no_warning() {
        let mut r = report(&[1.0, 0.5, 0.2]);
        r.check_convergence();
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn test_flat_loss_warns() {
        let mut r = report(&[0.4, 0.5, 0.4]);
        r.check_convergence();
        assert_eq!(
            r.warnings,
            vec![ConvergenceWarning::LossNotDecreasing { first: 0.4, last: 0.4 }]
        );
    }

    #[test]
    fn test_nan_loss_warns() {
        let mut r = report(&[1.0, f64::NAN]);
        r.check_convergence();
        assert_eq!(r.warnings, vec![ConvergenceWarning::NonFiniteLoss { epoch: 2 }]);
    }
}
