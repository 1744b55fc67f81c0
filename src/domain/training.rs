// ============================================================
// Layer 3 — Training Configuration
// ============================================================
// Loss function, optimizer and early stopping are chosen by
// enumerated identifier; the ml layer maps each identifier onto a
// concrete burn strategy.
//
// Serialisable so the run configuration can be saved next to a
// checkpoint and reloaded for prediction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, Result};

// ─── LossKind ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossKind {
    /// Continuous traits
    #[default]
    MeanSquaredError,
    /// Two-class targets (0/1), sigmoid outputs
    BinaryCrossEntropy,
    /// One-hot multi-class targets, softmax outputs
    CategoricalCrossEntropy,
}

impl FromStr for LossKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "mse" | "mean_squared_error"                => Ok(Self::MeanSquaredError),
            "bce" | "binary_cross_entropy"              => Ok(Self::BinaryCrossEntropy),
            "cce" | "categorical_cross_entropy"         => Ok(Self::CategoricalCrossEntropy),
            other => Err(format!("unknown loss '{other}' (expected mse, binary_cross_entropy or categorical_cross_entropy)")),
        }
    }
}

impl fmt::Display for LossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MeanSquaredError        => f.write_str("mean_squared_error"),
            Self::BinaryCrossEntropy      => f.write_str("binary_cross_entropy"),
            Self::CategoricalCrossEntropy => f.write_str("categorical_cross_entropy"),
        }
    }
}

// ─── OptimizerKind ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    /// Plain gradient step
    Sgd,
    /// Gradient step with a velocity term
    Momentum,
    /// Adaptive per-parameter scaling
    #[default]
    Adam,
    /// Adaptive scaling by a running average of squared gradients
    RmsProp,
}

impl FromStr for OptimizerKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sgd"      => Ok(Self::Sgd),
            "momentum" => Ok(Self::Momentum),
            "adam"     => Ok(Self::Adam),
            "rmsprop"  => Ok(Self::RmsProp),
            other => Err(format!("unknown optimizer '{other}' (expected sgd, momentum, adam or rmsprop)")),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sgd      => f.write_str("sgd"),
            Self::Momentum => f.write_str("momentum"),
            Self::Adam     => f.write_str("adam"),
            Self::RmsProp  => f.write_str("rmsprop"),
        }
    }
}

// ─── Early stopping ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Monitor {
    /// Mean training loss of the epoch
    Loss,
    /// Loss on the held-out validation rows
    #[default]
    ValLoss,
}

impl FromStr for Monitor {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "loss"     => Ok(Self::Loss),
            "val_loss" => Ok(Self::ValLoss),
            other => Err(format!("unknown monitor '{other}' (expected loss or val_loss)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarlyStoppingConfig {
    #[serde(default)]
    pub monitor:   Monitor,
    /// Smallest decrease that counts as an improvement
    #[serde(default)]
    pub min_delta: f64,
    /// Consecutive non-improving epochs tolerated before halting
    pub patience:  usize,
}

// ─── TrainingConfig ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub loss:             LossKind,
    pub optimizer:        OptimizerKind,
    pub learning_rate:    f64,
    /// Velocity coefficient, used by `OptimizerKind::Momentum` only
    pub momentum:         f64,
    pub epochs:           usize,
    pub batch_size:       usize,
    /// Seeds weight init, batch shuffling and the validation hold-out
    pub seed:             u64,
    /// Fraction of the training rows held out for per-epoch validation
    #[serde(default)]
    pub validation_split: Option<f64>,
    #[serde(default)]
    pub early_stopping:   Option<EarlyStoppingConfig>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            loss:             LossKind::MeanSquaredError,
            optimizer:        OptimizerKind::Adam,
            learning_rate:    1e-3,
            momentum:         0.9,
            epochs:           50,
            batch_size:       32,
            seed:             42,
            validation_split: None,
            early_stopping:   None,
        }
    }
}

impl TrainingConfig {
    /// Reject configurations that would fail inside the epoch loop.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(PipelineError::Config("epochs must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(PipelineError::Config("batch size must be at least 1".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(PipelineError::Config(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.optimizer == OptimizerKind::Momentum && !(0.0..1.0).contains(&self.momentum) {
            return Err(PipelineError::Config(format!(
                "momentum must lie in [0, 1), got {}",
                self.momentum
            )));
        }
        if let Some(ratio) = self.validation_split {
            if !(ratio > 0.0 && ratio < 1.0) {
                return Err(PipelineError::InvalidRatio(ratio));
            }
        }
        if let Some(es) = &self.early_stopping {
            if es.monitor == Monitor::ValLoss && self.validation_split.is_none() {
                return Err(PipelineError::Config(
                    "early stopping on val_loss needs a validation split".into(),
                ));
            }
            if !(es.min_delta >= 0.0) {
                return Err(PipelineError::Config(format!(
                    "min_delta must be non-negative, got {}",
                    es.min_delta
                )));
            }
        }
        Ok(())
    }
}
