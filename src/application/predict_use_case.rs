// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Rebuilds a trained model from its checkpoint directory and runs it
// over a new feature table.
//
//   Step 1: Load run_config.json + weights   (Layer 6 - infra)
//   Step 2: Read the feature table           (Layer 4 - data)
//   Step 3: Forward every row                (Layer 5 - ml)

use anyhow::Result;
use std::path::PathBuf;

use crate::application::train_use_case::delimiter;
use crate::data::loader::read_features;
use crate::domain::matrix::TargetMatrix;
use crate::domain::traits::Predictor;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::backend::{default_device, TrainBackend};

pub struct PredictUseCase {
    checkpoint_dir: PathBuf,
    features:       PathBuf,
    /// Overrides the delimiter recorded at training time
    delimiter:      Option<char>,
}

impl PredictUseCase {
    pub fn new(checkpoint_dir: impl Into<PathBuf>, features: impl Into<PathBuf>) -> Self {
        Self { checkpoint_dir: checkpoint_dir.into(), features: features.into(), delimiter: None }
    }

    pub fn with_delimiter(mut self, delimiter: Option<char>) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn execute(&self) -> Result<TargetMatrix> {
        let device = default_device();
        let (model, cfg) = CheckpointManager::new(&self.checkpoint_dir).load::<TrainBackend>(&device)?;

        let features = read_features(&self.features, delimiter(self.delimiter.or(cfg.delimiter)))?;
        tracing::info!("Predicting {} samples with a {} model", features.nrows(), model.kind());

        Ok(model.predict(&features)?)
    }
}
