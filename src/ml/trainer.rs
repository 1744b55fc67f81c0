// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Generic over the network variant and the optimizer:
//
//   - Training runs on the autodiff backend; every batch computes
//       objective = data loss + activity penalties + weight penalties
//     and takes one optimizer step
//   - The reported epoch loss is the sample-weighted mean *data* loss
//   - Validation / evaluation / prediction use `net.valid()`, i.e. the
//     inner backend with dropout disabled
//
// Reference: Burn Book §5 (custom training loop)

use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion, TensorData},
};
use ndarray::{Array2, ArrayView2, Axis};

use crate::data::{batcher::GenomicBatcher, dataset::GenomicDataset, splitter::Splitter};
use crate::domain::error::{PipelineError, Result};
use crate::domain::matrix::{FeatureMatrix, SampleSet};
use crate::domain::report::{EpochMetrics, FitReport};
use crate::domain::traits::Predictor;
use crate::domain::training::{LossKind, Monitor, OptimizerKind, TrainingConfig};
use crate::ml::{early_stopping::EarlyStopping, loss, network::Network, optimizer, regularization};

/// Rows per forward pass when evaluating or predicting
pub const INFERENCE_BATCH_SIZE: usize = 256;

/// Train `net` on `train` and return the updated parameters with the
/// loss history. `config` must already be validated.
pub fn fit<B, M>(
    net:    M,
    train:  &SampleSet,
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<(M, FitReport)>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + Network<B>,
    M::InnerModule: Network<B::InnerBackend>,
{
    match config.optimizer {
        OptimizerKind::Sgd      => train_loop(net, optimizer::sgd().init(), train, config, device),
        OptimizerKind::Momentum => {
            train_loop(net, optimizer::momentum(config.momentum).init(), train, config, device)
        }
        OptimizerKind::Adam     => train_loop(net, optimizer::adam().init(), train, config, device),
        OptimizerKind::RmsProp  => train_loop(net, optimizer::rms_prop().init(), train, config, device),
    }
}

fn train_loop<B, M, O>(
    mut net:   M,
    mut optim: O,
    train:     &SampleSet,
    config:    &TrainingConfig,
    device:    &B::Device,
) -> Result<(M, FitReport)>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + Network<B>,
    M::InnerModule: Network<B::InnerBackend>,
    O: Optimizer<M, B>,
{
    let (fit_rows, validation) = hold_out(train, config)?;
    tracing::info!(
        "Training on {} samples ({} held out for validation), {} epochs, batch size {}",
        fit_rows.len(),
        validation.as_ref().map(SampleSet::len).unwrap_or(0),
        config.epochs,
        config.batch_size,
    );

    let loader = DataLoaderBuilder::new(GenomicBatcher::<B>::new(device.clone()))
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .build(GenomicDataset::from(&fit_rows));

    let mut stopper = config.early_stopping.as_ref().map(EarlyStopping::new);
    let mut report  = FitReport::default();

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=config.epochs {
        let mut loss_sum = 0.0f64;
        let mut seen     = 0usize;

        for batch in loader.iter() {
            let rows = batch.features.dims()[0];
            let (output, activity) = net.forward_penalized(batch.features);
            let data_loss = loss::compute(config.loss, output, batch.targets);

            loss_sum += data_loss.clone().into_scalar().elem::<f64>() * rows as f64;
            seen     += rows;

            let objective = match regularization::add(activity, net.weight_penalty()) {
                Some(penalty) => data_loss + penalty,
                None => data_loss,
            };
            let grads = GradientsParams::from_grads(objective.backward(), &net);
            net = optim.step(config.learning_rate, net, grads);
        }

        let train_loss = if seen > 0 { loss_sum / seen as f64 } else { f64::NAN };
        let val_loss = match &validation {
            Some(v) => Some(evaluate::<B::InnerBackend, _>(&net.valid(), v, config.loss, device)?),
            None => None,
        };

        match val_loss {
            Some(v) => tracing::info!(
                "Epoch {:>3}/{} | train_loss={:.6} | val_loss={:.6}",
                epoch, config.epochs, train_loss, v
            ),
            None => tracing::info!("Epoch {:>3}/{} | train_loss={:.6}", epoch, config.epochs, train_loss),
        }
        report.history.push(EpochMetrics::new(epoch, train_loss, val_loss));

        if let Some(stopper) = stopper.as_mut() {
            let metric = match stopper.monitor() {
                Monitor::Loss    => Some(train_loss),
                Monitor::ValLoss => val_loss,
            };
            if metric.is_some_and(|m| stopper.should_stop(m)) {
                tracing::info!("Early stopping at epoch {epoch} (best {:?})", stopper.best());
                report.stopped_early = true;
                break;
            }
        }
    }

    report.check_convergence();
    for warning in &report.warnings {
        tracing::warn!("{warning}");
    }
    Ok((net, report))
}

/// Split off the validation hold-out, if one is configured.
fn hold_out(train: &SampleSet, config: &TrainingConfig) -> Result<(SampleSet, Option<SampleSet>)> {
    let Some(fraction) = config.validation_split else {
        return Ok((train.clone(), None));
    };
    let split = Splitter::new(1.0 - fraction, config.seed)?.split(train);
    if split.train.is_empty() || split.test.is_empty() {
        return Err(PipelineError::DataFormat(format!(
            "validation split {fraction} of {} samples leaves an empty side",
            train.len()
        )));
    }
    let (fit_rows, validation) = train.partition(&split);
    Ok((fit_rows, Some(validation)))
}

fn to_tensor<B: Backend>(view: ArrayView2<'_, f32>, device: &B::Device) -> Tensor<B, 2> {
    let (rows, cols) = view.dim();
    let values: Vec<f32> = view.iter().copied().collect();
    Tensor::from_data(TensorData::new(values, [rows, cols]), device)
}

/// Mean data loss over `data`, weighted by rows across batches.
pub fn evaluate<B: Backend, N: Network<B>>(
    net:    &N,
    data:   &SampleSet,
    kind:   LossKind,
    device: &B::Device,
) -> Result<f64> {
    if data.is_empty() {
        return Err(PipelineError::DataFormat("cannot evaluate on an empty sample set".into()));
    }
    let features = data.features().view();
    let targets  = data.targets().view();

    let mut total = 0.0f64;
    for (x, y) in features
        .axis_chunks_iter(Axis(0), INFERENCE_BATCH_SIZE)
        .zip(targets.axis_chunks_iter(Axis(0), INFERENCE_BATCH_SIZE))
    {
        let rows = x.nrows();
        let output = net.forward(to_tensor::<B>(x, device));
        let value = loss::compute(kind, output, to_tensor::<B>(y, device))
            .into_scalar()
            .elem::<f64>();
        total += value * rows as f64;
    }
    Ok(total / data.len() as f64)
}

/// Forward every row of `features`; returns an N × `outputs` array.
pub fn predict<B: Backend, N: Network<B>>(
    net:      &N,
    features: &FeatureMatrix,
    outputs:  usize,
    device:   &B::Device,
) -> Result<Array2<f32>> {
    let mut values = Vec::with_capacity(features.nrows() * outputs);
    for chunk in features.view().axis_chunks_iter(Axis(0), INFERENCE_BATCH_SIZE) {
        let output = net.forward(to_tensor::<B>(chunk, device));
        let chunk_values = output
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| PipelineError::DataFormat(format!("cannot read predictions: {e:?}")))?;
        values.extend(chunk_values);
    }
    let expected = features.nrows() * outputs;
    if values.len() != expected {
        return Err(PipelineError::ShapeMismatch {
            what:     "prediction values",
            expected,
            actual:   values.len(),
        });
    }
    Array2::from_shape_vec((features.nrows(), outputs), values)
        .map_err(|e| PipelineError::DataFormat(format!("prediction array: {e}")))
}

// ─── Trainer / Evaluator ──────────────────────────────────────────────────────
/// Result of fitting on the train split and scoring the test split
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub test_loss: f64,
    pub report:    FitReport,
}

/// Fit `model` on `train`, then report its loss on `test`.
pub fn train_and_evaluate<P: Predictor>(
    model:  &mut P,
    train:  &SampleSet,
    test:   &SampleSet,
    config: &TrainingConfig,
) -> Result<Evaluation> {
    let report = model.fit(train, config)?;
    let test_loss = model.evaluate(test)?;
    tracing::info!(
        "Finished after {} epochs: test {} = {:.6}",
        report.epochs_run(),
        config.loss,
        test_loss
    );
    Ok(Evaluation { test_loss, report })
}
