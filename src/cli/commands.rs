// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands: `train`, `predict`, `summary`.
//
// Enumerated flags (--activation, --loss, --optimizer, --monitor)
// are parsed through the FromStr impls of the domain enums, so the
// accepted spellings match the JSON architecture format.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::train_use_case::{ArchitectureSource, TrainRequest};
use crate::domain::architecture::Activation;
use crate::domain::training::{EarlyStoppingConfig, LossKind, Monitor, OptimizerKind, TrainingConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load tables, split, train and report the test loss
    Train(TrainArgs),

    /// Predict traits for a feature table with a trained checkpoint
    Predict(PredictArgs),

    /// Print the layer table of a JSON architecture without training
    Summary(SummaryArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Feature table: one sample per line, one marker per column
    #[arg(long)]
    pub features: PathBuf,

    /// Target table with the same number of lines as the feature table
    #[arg(long)]
    pub targets: PathBuf,

    /// Column separator character (default: any whitespace)
    #[arg(long)]
    pub delimiter: Option<char>,

    /// JSON architecture; overrides the multilayer perceptron flags below
    #[arg(long)]
    pub architecture: Option<PathBuf>,

    /// Hidden layer widths of the perceptron, comma separated
    #[arg(long, value_delimiter = ',', default_value = "8")]
    pub hidden_units: Vec<usize>,

    /// Activation of the hidden layers
    #[arg(long, default_value = "relu")]
    pub activation: Activation,

    /// Activation of the output layer (sigmoid for bce, softmax for cce)
    #[arg(long, default_value = "linear")]
    pub output_activation: Activation,

    /// Dropout rate after each hidden layer
    #[arg(long)]
    pub dropout: Option<f64>,

    /// Fraction of samples used for training; the rest is the test split
    #[arg(long, default_value_t = 0.8)]
    pub train_ratio: f64,

    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// mse, bce or cce
    #[arg(long, default_value = "mse")]
    pub loss: LossKind,

    /// sgd, momentum, adam or rmsprop
    #[arg(long, default_value = "adam")]
    pub optimizer: OptimizerKind,

    /// Velocity coefficient for --optimizer momentum
    #[arg(long, default_value_t = 0.9)]
    pub momentum: f64,

    /// Seeds the split, weight init, shuffling and dropout
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Fraction of the training split held out for per-epoch validation
    #[arg(long)]
    pub validation_split: Option<f64>,

    /// Enables early stopping after this many epochs without improvement
    #[arg(long)]
    pub patience: Option<usize>,

    #[arg(long, default_value_t = 0.0)]
    pub min_delta: f64,

    /// loss or val_loss (default: val_loss when --validation-split is set)
    #[arg(long)]
    pub monitor: Option<Monitor>,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,
}

/// Convert CLI TrainArgs into the application-layer TrainRequest.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainRequest {
    fn from(a: TrainArgs) -> Self {
        let architecture = match a.architecture {
            Some(path) => ArchitectureSource::Json(path),
            None => ArchitectureSource::Mlp {
                hidden:            a.hidden_units,
                activation:        a.activation,
                output_activation: a.output_activation,
                dropout:           a.dropout,
            },
        };
        let default_monitor = if a.validation_split.is_some() { Monitor::ValLoss } else { Monitor::Loss };
        let early_stopping = a.patience.map(|patience| EarlyStoppingConfig {
            monitor:   a.monitor.unwrap_or(default_monitor),
            min_delta: a.min_delta,
            patience,
        });

        TrainRequest {
            features:  a.features,
            targets:   a.targets,
            delimiter: a.delimiter,
            architecture,
            train_ratio: a.train_ratio,
            training: TrainingConfig {
                loss:             a.loss,
                optimizer:        a.optimizer,
                learning_rate:    a.lr,
                momentum:         a.momentum,
                epochs:           a.epochs,
                batch_size:       a.batch_size,
                seed:             a.seed,
                validation_split: a.validation_split,
                early_stopping,
            },
            checkpoint_dir: Some(a.checkpoint_dir),
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Feature table to predict for
    #[arg(long)]
    pub features: PathBuf,

    /// Directory written by `train`
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Column separator (default: the one used for training)
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Write predictions here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// JSON architecture file
    #[arg(long)]
    pub architecture: PathBuf,
}
