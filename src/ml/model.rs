// ============================================================
// Layer 5 — Model Facade
// ============================================================
// `Model` hides which network variant an ArchitectureSpec produced.
// It owns the spec, its resolved plan and the burn module, and
// implements the domain `Predictor` trait so the application layer
// never touches burn types.
//
//   build      spec + features → validated, initialised model
//   fit        trains in place (autodiff backend)
//   predict    N × M outputs (inner backend, dropout off)
//   evaluate   mean configured loss on a sample set
//
// Weights are saved with burn's CompactRecorder; the spec alone is
// enough to rebuild an empty model to load them into.

use std::path::Path;

use burn::{
    module::AutodiffModule,
    prelude::*,
    record::CompactRecorder,
    tensor::backend::AutodiffBackend,
};

use crate::domain::architecture::{ArchitecturePlan, ArchitectureSpec, ModelKind};
use crate::domain::error::{PipelineError, Result};
use crate::domain::matrix::{FeatureMatrix, SampleSet, TargetMatrix};
use crate::domain::report::FitReport;
use crate::domain::traits::Predictor;
use crate::domain::training::{LossKind, TrainingConfig};
use crate::ml::{
    loss,
    network::{ConvNet, DenseNet, RecurrentNet},
    summary::ModelSummary,
    trainer,
};

/// The concrete burn module behind a `Model`
#[derive(Debug, Clone)]
pub enum Net<B: Backend> {
    Dense(DenseNet<B>),
    Convolutional(ConvNet<B>),
    Recurrent(RecurrentNet<B>),
}

/// Run `$body` with `$net` bound to whichever variant is inside.
macro_rules! with_net {
    ($value:expr, $net:ident => $body:expr) => {
        match $value {
            Net::Dense($net)         => $body,
            Net::Convolutional($net) => $body,
            Net::Recurrent($net)     => $body,
        }
    };
}

fn checkpoint_error(path: &Path, err: impl std::fmt::Debug) -> PipelineError {
    PipelineError::Checkpoint(format!("{}: {err:?}", path.display()))
}

pub struct Model<B: AutodiffBackend> {
    spec:   ArchitectureSpec,
    plan:   ArchitecturePlan,
    net:    Net<B>,
    loss:   LossKind,
    device: B::Device,
}

impl<B: AutodiffBackend> Model<B> {
    /// Validate `spec` against the feature table and initialise weights.
    ///
    /// Fails with `ShapeMismatch` when the spec's input width differs
    /// from the number of feature columns, and with `Architecture` when
    /// the layer sequence is invalid.
    ///
    /// `evaluate` scores with mean squared error until `fit` or
    /// `with_loss` sets another loss.
    pub fn build(spec: ArchitectureSpec, features: &FeatureMatrix, device: &B::Device) -> Result<Self> {
        let plan = spec.plan()?;
        plan.check_input_width(features.ncols())?;
        Ok(Self::init(spec, plan, device))
    }

    /// Build without a feature table, e.g. before loading a checkpoint.
    /// The loss defaults to mean squared error as in `build`.
    pub fn from_spec(spec: ArchitectureSpec, device: &B::Device) -> Result<Self> {
        let plan = spec.plan()?;
        Ok(Self::init(spec, plan, device))
    }

    fn init(spec: ArchitectureSpec, plan: ArchitecturePlan, device: &B::Device) -> Self {
        let net = match (plan.kind, plan.conv.as_ref()) {
            (ModelKind::Convolutional, Some(conv)) => Net::Convolutional(ConvNet::init(&plan, conv, device)),
            (ModelKind::Recurrent, _) => Net::Recurrent(RecurrentNet::init(&plan, device)),
            _ => Net::Dense(DenseNet::init(&plan, device)),
        };
        tracing::info!(
            "Built {} model: {} layers, {} trainable parameters",
            plan.kind,
            spec.layers.len(),
            plan.total_params()
        );
        Self { spec, plan, net, loss: LossKind::default(), device: device.clone() }
    }

    /// Loss used by `evaluate`; `fit` replaces it with the training loss.
    pub fn with_loss(mut self, loss: LossKind) -> Self {
        self.loss = loss;
        self
    }

    pub fn kind(&self) -> ModelKind {
        self.plan.kind
    }

    pub fn spec(&self) -> &ArchitectureSpec {
        &self.spec
    }

    pub fn plan(&self) -> &ArchitecturePlan {
        &self.plan
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary::from_plan(&self.plan)
    }

    /// Trainable parameters as counted by burn
    pub fn num_params(&self) -> usize {
        with_net!(&self.net, net => net.num_params())
    }

    /// Write the weights to `path` (the recorder appends its extension).
    pub fn save_weights(&self, path: &Path) -> Result<()> {
        let recorder = CompactRecorder::new();
        with_net!(&self.net, net => net.clone().save_file(path.to_path_buf(), &recorder))
            .map_err(|e| checkpoint_error(path, e))
    }

    /// Replace the weights with the ones stored at `path`.
    pub fn load_weights(mut self, path: &Path) -> Result<Self> {
        let recorder = CompactRecorder::new();
        let device = &self.device;
        self.net = match self.net {
            Net::Dense(net) => Net::Dense(
                net.load_file(path.to_path_buf(), &recorder, device)
                    .map_err(|e| checkpoint_error(path, e))?,
            ),
            Net::Convolutional(net) => Net::Convolutional(
                net.load_file(path.to_path_buf(), &recorder, device)
                    .map_err(|e| checkpoint_error(path, e))?,
            ),
            Net::Recurrent(net) => Net::Recurrent(
                net.load_file(path.to_path_buf(), &recorder, device)
                    .map_err(|e| checkpoint_error(path, e))?,
            ),
        };
        tracing::debug!("Loaded weights from '{}'", path.display());
        Ok(self)
    }
}

impl<B: AutodiffBackend> Predictor for Model<B> {
    fn fit(&mut self, train: &SampleSet, config: &TrainingConfig) -> Result<FitReport> {
        config.validate()?;
        self.plan.check_input_width(train.features().ncols())?;
        self.plan.check_output_width(train.targets().ncols())?;
        loss::check_targets(config.loss, train.targets(), self.plan.output_activation())?;
        if train.is_empty() {
            return Err(PipelineError::DataFormat("training set is empty".into()));
        }

        B::seed(config.seed);
        let device = &self.device;
        let (net, report) = match self.net.clone() {
            Net::Dense(net) => {
                let (net, report) = trainer::fit::<B, _>(net, train, config, device)?;
                (Net::Dense(net), report)
            }
            Net::Convolutional(net) => {
                let (net, report) = trainer::fit::<B, _>(net, train, config, device)?;
                (Net::Convolutional(net), report)
            }
            Net::Recurrent(net) => {
                let (net, report) = trainer::fit::<B, _>(net, train, config, device)?;
                (Net::Recurrent(net), report)
            }
        };
        self.net  = net;
        self.loss = config.loss;
        Ok(report)
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<TargetMatrix> {
        self.plan.check_input_width(features.ncols())?;
        let outputs = self.plan.output_width();
        let values = with_net!(&self.net, net => {
            trainer::predict::<B::InnerBackend, _>(&net.valid(), features, outputs, &self.device)
        })?;
        Ok(TargetMatrix::new(values))
    }

    fn evaluate(&self, data: &SampleSet) -> Result<f64> {
        self.plan.check_input_width(data.features().ncols())?;
        self.plan.check_output_width(data.targets().ncols())?;
        with_net!(&self.net, net => {
            trainer::evaluate::<B::InnerBackend, _>(&net.valid(), data, self.loss, &self.device)
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use crate::data::splitter::Splitter;
    use crate::domain::architecture::{Activation, LayerSpec};
    use crate::domain::training::{EarlyStoppingConfig, Monitor, OptimizerKind};
    use crate::ml::backend::{default_device, TrainBackend};
    use crate::ml::trainer::train_and_evaluate;

    type M = Model<TrainBackend>;

    /// N × P uniform features with a noisy linear trait
    fn regression_set(n: usize, p: usize, seed: u64) -> SampleSet {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let weights: Vec<f32> = (0..p).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let mut x = Vec::with_capacity(n);
        let mut y = Vec::with_capacity(n);
        for _ in 0..n {
            let row: Vec<f32> = (0..p).map(|_| rng.gen_range(-1.0..1.0)).collect();
            let target = row.iter().zip(&weights).map(|(a, w)| a * w).sum::<f32>()
                + rng.gen_range(-0.05..0.05);
            x.push(row);
            y.push(vec![target]);
        }
        SampleSet::new(
            FeatureMatrix::from_rows(x).unwrap(),
            TargetMatrix::from_rows(y).unwrap(),
        )
        .unwrap()
    }

    /// Two well separated clusters labelled 0 / 1
    fn separable_set() -> SampleSet {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..40 {
            let a = (i % 5) as f32 * 0.1;
            let b = (i / 5) as f32 * 0.05;
            if i % 2 == 0 {
                x.push(vec![1.0 + a, 1.0 + b]);
                y.push(vec![1.0]);
            } else {
                x.push(vec![-1.0 - a, -1.0 - b]);
                y.push(vec![0.0]);
            }
        }
        SampleSet::new(
            FeatureMatrix::from_rows(x).unwrap(),
            TargetMatrix::from_rows(y).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_build_rejects_wrong_input_width() {
        let data = regression_set(5, 12, 1);
        let spec = ArchitectureSpec::mlp(10, &[4], Activation::Relu, None, 1, Activation::Linear);
        let err = M::build(spec, data.features(), &default_device()).err().unwrap();
        assert!(matches!(err, PipelineError::ShapeMismatch { expected: 10, actual: 12, .. }));
    }

    #[test]
    fn test_fit_rejects_wrong_output_width() {
        let data = regression_set(10, 4, 2);
        let spec = ArchitectureSpec::mlp(4, &[3], Activation::Relu, None, 2, Activation::Linear);
        let mut model = M::build(spec, data.features(), &default_device()).unwrap();
        let err = model.fit(&data, &TrainingConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn test_bce_rejects_continuous_targets() {
        let data = regression_set(10, 4, 3);
        let spec = ArchitectureSpec::mlp(4, &[3], Activation::Relu, None, 1, Activation::Sigmoid);
        let mut model = M::build(spec, data.features(), &default_device()).unwrap();
        let config = TrainingConfig { loss: LossKind::BinaryCrossEntropy, ..TrainingConfig::default() };
        assert!(matches!(model.fit(&data, &config), Err(PipelineError::DataFormat(_))));
    }

    #[test]
    fn test_evaluate_uses_mse_until_loss_is_set() {
        let data = separable_set();
        let spec = ArchitectureSpec::mlp(2, &[4], Activation::Relu, None, 1, Activation::Sigmoid);
        let model = M::build(spec, data.features(), &default_device()).unwrap();

        let pred = model.predict(data.features()).unwrap();
        let pairs: Vec<(f64, f64)> = pred
            .view()
            .iter()
            .zip(data.targets().view().iter())
            .map(|(&p, &y)| (p as f64, y as f64))
            .collect();
        let n = pairs.len() as f64;
        let mse = pairs.iter().map(|(p, y)| (p - y).powi(2)).sum::<f64>() / n;
        let bce = -pairs.iter().map(|(p, y)| y * p.ln() + (1.0 - y) * (1.0 - p).ln()).sum::<f64>() / n;

        assert!((model.evaluate(&data).unwrap() - mse).abs() < 1e-4);
        let model = model.with_loss(LossKind::BinaryCrossEntropy);
        assert!((model.evaluate(&data).unwrap() - bce).abs() < 1e-4);
    }

    #[test]
    fn test_learns_separable_classes() {
        let data = separable_set();
        let spec = ArchitectureSpec::mlp(2, &[4], Activation::Relu, None, 1, Activation::Sigmoid);
        let mut model = M::build(spec, data.features(), &default_device()).unwrap();
        let config = TrainingConfig {
            loss:          LossKind::BinaryCrossEntropy,
            optimizer:     OptimizerKind::Adam,
            learning_rate: 0.05,
            epochs:        60,
            batch_size:    8,
            ..TrainingConfig::default()
        };
        let report = model.fit(&data, &config).unwrap();
        let first = report.history[0].train_loss;
        let last = report.final_train_loss().unwrap();
        assert!(last < first, "loss went from {first} to {last}");
        let loss = model.evaluate(&data).unwrap();
        assert!(loss < 0.2, "training-set loss {loss}");

        let predictions = model.predict(data.features()).unwrap();
        let correct = predictions
            .view()
            .iter()
            .zip(data.targets().view().iter())
            .filter(|(p, t)| (**p > 0.5) == (**t > 0.5))
            .count();
        assert!(correct as f64 / data.len() as f64 >= 0.95, "{correct}/40 correct");
    }

    #[test]
    fn test_hundred_by_ten_scenario() {
        let data = regression_set(100, 10, 42);
        let split = Splitter::new(0.8, 42).unwrap().split(&data);
        assert_eq!((split.train.len(), split.test.len()), (80, 20));
        let (train, test) = data.partition(&split);

        let spec = ArchitectureSpec::mlp(10, &[8], Activation::Relu, None, 1, Activation::Linear);
        let mut model = M::build(spec, train.features(), &default_device()).unwrap();
        let config = TrainingConfig {
            loss:       LossKind::MeanSquaredError,
            optimizer:  OptimizerKind::Sgd,
            learning_rate: 0.01,
            epochs:     50,
            batch_size: 10,
            ..TrainingConfig::default()
        };
        let outcome = train_and_evaluate(&mut model, &train, &test, &config).unwrap();
        assert!(outcome.test_loss.is_finite());
        assert_eq!(outcome.report.epochs_run(), 50);
        assert!(!outcome.report.stopped_early);
    }

    #[test]
    fn test_early_stopping_halts_training() {
        let data = regression_set(30, 4, 7);
        let spec = ArchitectureSpec::mlp(4, &[3], Activation::Tanh, None, 1, Activation::Linear);
        let mut model = M::build(spec, data.features(), &default_device()).unwrap();
        let config = TrainingConfig {
            epochs: 50,
            batch_size: 10,
            early_stopping: Some(EarlyStoppingConfig {
                monitor:   Monitor::Loss,
                // no epoch after the first can beat best − 1e9
                min_delta: 1e9,
                patience:  2,
            }),
            ..TrainingConfig::default()
        };
        let report = model.fit(&data, &config).unwrap();
        assert!(report.stopped_early);
        assert_eq!(report.epochs_run(), 3);
    }

    #[test]
    fn test_validation_split_records_val_loss() {
        let data = regression_set(40, 6, 9);
        let spec = ArchitectureSpec::mlp(6, &[4], Activation::Relu, Some(0.1), 1, Activation::Linear);
        let mut model = M::build(spec, data.features(), &default_device()).unwrap();
        let config = TrainingConfig {
            epochs: 3,
            batch_size: 8,
            validation_split: Some(0.25),
            ..TrainingConfig::default()
        };
        let report = model.fit(&data, &config).unwrap();
        assert!(report.history.iter().all(|m| m.val_loss.is_some_and(f64::is_finite)));
    }

    #[test]
    fn test_conv_and_recurrent_variants_train() {
        let data = regression_set(24, 12, 11);
        let config = TrainingConfig { epochs: 2, batch_size: 6, ..TrainingConfig::default() };

        let conv = ArchitectureSpec::new(12)
            .with_layer(LayerSpec::conv1d(2, 3, 1, Activation::Relu))
            .with_layer(LayerSpec::max_pool1d(2))
            .with_layer(LayerSpec::dense(1, Activation::Linear));
        let recurrent = ArchitectureSpec::new(12)
            .with_timesteps(4)
            .with_layer(LayerSpec::lstm(3, false))
            .with_layer(LayerSpec::dense(1, Activation::Linear));

        for (spec, kind) in [(conv, ModelKind::Convolutional), (recurrent, ModelKind::Recurrent)] {
            let mut model = M::build(spec, data.features(), &default_device()).unwrap();
            assert_eq!(model.kind(), kind);
            assert_eq!(model.num_params(), model.summary().total_params);
            let report = model.fit(&data, &config).unwrap();
            assert_eq!(report.epochs_run(), 2);
            assert_eq!(model.predict(data.features()).unwrap().ncols(), 1);
        }
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let data = regression_set(5, 4, 5);
        let spec = ArchitectureSpec::mlp(4, &[2], Activation::Relu, None, 1, Activation::Linear);
        let model = M::build(spec, data.features(), &default_device()).unwrap();
        let wide = regression_set(5, 6, 5);
        assert!(matches!(
            model.predict(wide.features()),
            Err(PipelineError::ShapeMismatch { expected: 4, actual: 6, .. })
        ));
    }
}
