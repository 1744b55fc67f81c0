// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores a trained model using burn's CompactRecorder.
//
// What gets saved:
//   1. model.mpk    — all learned parameters
//   2. run_config.json — data paths, architecture and training config
//
// The weights alone cannot be loaded: the architecture in
// run_config.json is needed to rebuild an empty model of the right
// shape first. Loading fails if the two disagree.
//
// Layout:
//   checkpoints/
//     model.mpk
//     run_config.json
//     metrics.csv       ← written by MetricsLogger
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::tensor::backend::AutodiffBackend;

use crate::application::train_use_case::RunConfig;
use crate::ml::model::Model;

const MODEL_FILE:  &str = "model";
const CONFIG_FILE: &str = "run_config.json";

/// Manages the files of one checkpoint directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// The directory is created on first save, not here.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write the weights and the run configuration.
    pub fn save<B: AutodiffBackend>(&self, model: &Model<B>, cfg: &RunConfig) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", self.dir.display()))?;

        let path = self.dir.join(MODEL_FILE);
        model
            .save_weights(&path)
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;
        self.save_config(cfg)?;

        tracing::info!("Saved checkpoint to '{}'", self.dir.display());
        Ok(())
    }

    /// Rebuild the model described by `run_config.json` and load its weights.
    pub fn load<B: AutodiffBackend>(&self, device: &B::Device) -> Result<(Model<B>, RunConfig)> {
        let cfg = self.load_config()?;
        let model = Model::<B>::from_spec(cfg.architecture.clone(), device)
            .context("Saved architecture is invalid")?
            .with_loss(cfg.training.loss);

        let path = self.dir.join(MODEL_FILE);
        let model = model.load_weights(&path).with_context(|| {
            format!("Cannot load checkpoint '{}'. Have you trained the model first?", path.display())
        })?;
        Ok((model, cfg))
    }

    pub fn save_config(&self, cfg: &RunConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved run config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<RunConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Make sure you have run 'train' before 'predict'.",
                path.display()
            )
        })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed run config '{}'", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::architecture::{Activation, ArchitectureSpec};
    use crate::domain::matrix::{FeatureMatrix, SampleSet, TargetMatrix};
    use crate::domain::traits::Predictor;
    use crate::domain::training::TrainingConfig;
    use crate::ml::backend::{default_device, TrainBackend};

    fn tiny_set() -> SampleSet {
        let x: Vec<Vec<f32>> = (0..12).map(|i| vec![i as f32 / 12.0, 1.0 - i as f32 / 12.0, 0.5]).collect();
        let y: Vec<Vec<f32>> = (0..12).map(|i| vec![i as f32 / 6.0]).collect();
        SampleSet::new(FeatureMatrix::from_rows(x).unwrap(), TargetMatrix::from_rows(y).unwrap()).unwrap()
    }

    fn run_config(spec: ArchitectureSpec) -> RunConfig {
        RunConfig {
            features:     "x.txt".into(),
            targets:      "y.txt".into(),
            delimiter:    None,
            architecture: spec,
            train_ratio:  0.8,
            training:     TrainingConfig { epochs: 3, batch_size: 4, ..TrainingConfig::default() },
        }
    }

    #[test]
    fn test_round_trip_restores_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let data = tiny_set();
        let spec = ArchitectureSpec::mlp(3, &[4], Activation::Tanh, None, 1, Activation::Linear);
        let cfg = run_config(spec.clone());

        let device = default_device();
        let mut model = Model::<TrainBackend>::build(spec, data.features(), &device).unwrap();
        model.fit(&data, &cfg.training).unwrap();
        let before = model.predict(data.features()).unwrap();

        let manager = CheckpointManager::new(dir.path().join("ckpt"));
        manager.save(&model, &cfg).unwrap();
        let (restored, restored_cfg) = manager.load::<TrainBackend>(&device).unwrap();
        let after = restored.predict(data.features()).unwrap();

        assert_eq!(restored_cfg, cfg);
        for (a, b) in before.view().iter().zip(after.view().iter()) {
            // CompactRecorder stores half precision
            assert!((a - b).abs() < 1e-2, "{a} vs {b}");
        }
    }

    #[test]
    fn test_load_without_training_fails() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path());
        assert!(manager.load::<TrainBackend>(&default_device()).is_err());
    }
}
