// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full pipeline in order:
//
//   Step 1: Load feature + target tables   (Layer 4 - data)
//   Step 2: Resolve the architecture       (Layer 3 - domain)
//   Step 3: Seeded train/test split        (Layer 4 - data)
//   Step 4: Build the model                (Layer 5 - ml)
//   Step 5: Fit, then evaluate on test     (Layer 5 - ml)
//   Step 6: Save checkpoint + metrics      (Layer 6 - infra)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};
use burn::tensor::backend::Backend;

use crate::data::{loader::TableLoader, splitter::Splitter, table::Delimiter};
use crate::domain::architecture::{Activation, ArchitectureSpec};
use crate::domain::matrix::{SampleSet, Split};
use crate::domain::report::FitReport;
use crate::domain::traits::TableSource;
use crate::domain::training::TrainingConfig;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::{
    backend::{default_device, TrainBackend},
    model::Model,
    summary::ModelSummary,
    trainer::train_and_evaluate,
};

// ─── Run Configuration ────────────────────────────────────────────────────────
// Everything needed to reproduce a run, saved next to the checkpoint
// so `predict` can rebuild the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub features:     PathBuf,
    pub targets:      PathBuf,
    /// Single-character column separator; whitespace when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter:    Option<char>,
    pub architecture: ArchitectureSpec,
    /// Fraction of samples used for training; the rest is the test split
    pub train_ratio:  f64,
    pub training:     TrainingConfig,
}

pub fn delimiter(c: Option<char>) -> Delimiter {
    c.map(Delimiter::Char).unwrap_or_default()
}

/// Read an ArchitectureSpec from a JSON file.
pub fn load_architecture(path: &Path) -> Result<ArchitectureSpec> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read architecture '{}'", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Malformed architecture '{}'", path.display()))
}

// ─── Architecture Source ──────────────────────────────────────────────────────
/// Where the layer sequence comes from. A multilayer perceptron takes
/// its input and output widths from the loaded tables.
#[derive(Debug, Clone, PartialEq)]
pub enum ArchitectureSource {
    Json(PathBuf),
    Mlp {
        hidden:            Vec<usize>,
        activation:        Activation,
        output_activation: Activation,
        dropout:           Option<f64>,
    },
}

impl ArchitectureSource {
    fn resolve(&self, data: &SampleSet) -> Result<ArchitectureSpec> {
        match self {
            Self::Json(path) => load_architecture(path),
            Self::Mlp { hidden, activation, output_activation, dropout } => Ok(ArchitectureSpec::mlp(
                data.features().ncols(),
                hidden,
                *activation,
                *dropout,
                data.targets().ncols(),
                *output_activation,
            )),
        }
    }
}

// ─── Request / Outcome ────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct TrainRequest {
    pub features:       PathBuf,
    pub targets:        PathBuf,
    pub delimiter:      Option<char>,
    pub architecture:   ArchitectureSource,
    pub train_ratio:    f64,
    pub training:       TrainingConfig,
    pub checkpoint_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Configured loss on the held-out test split
    pub test_loss: f64,
    pub report:    FitReport,
    pub summary:   ModelSummary,
    pub split:     Split,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    request: TrainRequest,
}

impl TrainUseCase {
    pub fn new(request: TrainRequest) -> Self {
        Self { request }
    }

    /// Execute the full pipeline end to end.
    pub fn execute(&self) -> Result<PipelineOutcome> {
        let req = &self.request;

        // ── Step 1: Load tables ───────────────────────────────────────────────
        let data = TableLoader::new(&req.features, &req.targets)
            .with_delimiter(delimiter(req.delimiter))
            .load()?;

        // ── Step 2: Architecture (needs the table widths) ─────────────────────
        let architecture = req.architecture.resolve(&data)?;

        let run_config = RunConfig {
            features:     req.features.clone(),
            targets:      req.targets.clone(),
            delimiter:    req.delimiter,
            architecture,
            train_ratio:  req.train_ratio,
            training:     req.training.clone(),
        };
        let (model, outcome) = run_pipeline(&data, &run_config)?;

        // ── Step 6: Persist ───────────────────────────────────────────────────
        if let Some(dir) = &req.checkpoint_dir {
            CheckpointManager::new(dir).save(&model, &run_config)?;
            MetricsLogger::new(dir)?.write_history(&outcome.report.history)?;
        }
        Ok(outcome)
    }
}

/// Split → build → fit → evaluate on an in-memory sample set.
pub fn run_pipeline(data: &SampleSet, cfg: &RunConfig) -> Result<(Model<TrainBackend>, PipelineOutcome)> {
    cfg.training.validate()?;

    // ── Step 3: Train / test split ────────────────────────────────────────────
    let split = Splitter::new(cfg.train_ratio, cfg.training.seed)?.split(data);
    let (train, test) = data.partition(&split);
    tracing::info!("Split: {} train, {} test", train.len(), test.len());

    // ── Step 4: Build ─────────────────────────────────────────────────────────
    let device = default_device();
    TrainBackend::seed(cfg.training.seed);
    let mut model = Model::<TrainBackend>::build(cfg.architecture.clone(), train.features(), &device)?;

    // ── Step 5: Fit + evaluate ────────────────────────────────────────────────
    let evaluation = train_and_evaluate(&mut model, &train, &test, &cfg.training)?;
    let outcome = PipelineOutcome {
        test_loss: evaluation.test_loss,
        report:    evaluation.report,
        summary:   model.summary(),
        split,
    };
    Ok((model, outcome))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::PipelineError;
    use std::io::Write;

    /// 20 samples, 3 markers, one trait = sum of markers
    fn write_tables(dir: &Path) -> (PathBuf, PathBuf) {
        let x_path = dir.join("x.txt");
        let y_path = dir.join("y.txt");
        let mut x = fs::File::create(&x_path).unwrap();
        let mut y = fs::File::create(&y_path).unwrap();
        for i in 0..20 {
            let row = [(i % 3) as f32, (i % 2) as f32, (i % 5) as f32 / 4.0];
            writeln!(x, "{} {} {}", row[0], row[1], row[2]).unwrap();
            writeln!(y, "{}", row.iter().sum::<f32>()).unwrap();
        }
        (x_path, y_path)
    }

    fn request(dir: &Path, train_ratio: f64) -> TrainRequest {
        let (features, targets) = write_tables(dir);
        TrainRequest {
            features,
            targets,
            delimiter: None,
            architecture: ArchitectureSource::Mlp {
                hidden:            vec![4],
                activation:        Activation::Relu,
                output_activation: Activation::Linear,
                dropout:           None,
            },
            train_ratio,
            training: TrainingConfig { epochs: 5, batch_size: 4, ..TrainingConfig::default() },
            checkpoint_dir: Some(dir.join("ckpt")),
        }
    }

    #[test]
    fn test_pipeline_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = TrainUseCase::new(request(dir.path(), 0.8)).execute().unwrap();

        assert!(outcome.test_loss.is_finite());
        assert_eq!((outcome.split.train.len(), outcome.split.test.len()), (16, 4));
        assert_eq!(outcome.report.epochs_run(), 5);
        assert_eq!(outcome.summary.total_params, 3 * 4 + 4 + 4 + 1);
        assert!(dir.path().join("ckpt/run_config.json").exists());
        assert!(dir.path().join("ckpt/metrics.csv").exists());
    }

    #[test]
    fn test_invalid_ratio_fails_before_training() {
        let dir = tempfile::tempdir().unwrap();
        let err = TrainUseCase::new(request(dir.path(), 1.5)).execute().unwrap_err();
        assert!(matches!(err.downcast_ref::<PipelineError>(), Some(PipelineError::InvalidRatio(_))));
        assert!(!dir.path().join("ckpt").exists());
    }

    #[test]
    fn test_json_architecture_with_wrong_width() {
        let dir = tempfile::tempdir().unwrap();
        let arch = dir.path().join("arch.json");
        let spec = ArchitectureSpec::mlp(5, &[2], Activation::Relu, None, 1, Activation::Linear);
        fs::write(&arch, serde_json::to_string(&spec).unwrap()).unwrap();

        let mut req = request(dir.path(), 0.8);
        req.architecture = ArchitectureSource::Json(arch);
        let err = TrainUseCase::new(req).execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::ShapeMismatch { expected: 5, actual: 3, .. })
        ));
    }
}
