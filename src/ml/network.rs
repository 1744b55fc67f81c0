// ============================================================
// Layer 5 — Network Modules
// ============================================================
// Three burn modules, one per model variant, each built from a
// validated ArchitecturePlan:
//
//   DenseNet:      [B, P] → dense* → [B, M]
//   ConvNet:       [B, P] → [B, 1, P] → conv1d → pool? → flatten → dense* → [B, M]
//   RecurrentNet:  [B, P] → [B, T, P/T] → lstm* → last step | flatten → dense* → [B, M]
//
// Every block returns its activity penalty next to its output so the
// trainer can add it to the loss; weight penalties are read from the
// parameters on demand. The activity penalty is taken after the
// layer's own activation. Activation, pooling and dropout layers
// declared after a weighted layer then run in declaration order.

use burn::{
    module::Ignored,
    nn::{
        conv::{Conv1d, Conv1dConfig},
        pool::{MaxPool1d, MaxPool1dConfig},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
        Lstm, LstmConfig,
    },
    prelude::*,
};

use crate::domain::architecture::{
    Activation, ArchitecturePlan, ConvPlan, DensePlan, RecurrentPlan, Regularizer, TailOp,
};
use crate::ml::{activation, regularization};

/// Penalty accumulated during a forward pass
pub type PenaltyTerm<B> = Option<Tensor<B, 1>>;

/// Forward pass shared by all model variants.
pub trait Network<B: Backend> {
    /// Output plus the summed activity penalty of every regularized layer.
    fn forward_penalized(&self, features: Tensor<B, 2>) -> (Tensor<B, 2>, PenaltyTerm<B>);

    /// Summed kernel and bias penalties.
    fn weight_penalty(&self) -> PenaltyTerm<B>;

    fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        self.forward_penalized(features).0
    }
}

fn dropouts(rates: &[f64]) -> Vec<Dropout> {
    rates.iter().map(|&rate| DropoutConfig::new(rate).init()).collect()
}

fn apply_dropouts<B: Backend, const D: usize>(layers: &[Dropout], x: Tensor<B, D>) -> Tensor<B, D> {
    layers.iter().fold(x, |x, d| d.forward(x))
}

/// Runs a block's trailing layers in order. `dropouts` holds one module per
/// `TailOp::Dropout`; `pool` is only reached in convolutional blocks.
fn apply_tail<B: Backend, const D: usize>(
    ops:      &[TailOp],
    dropouts: &[Dropout],
    pool:     impl Fn(Tensor<B, D>) -> Tensor<B, D>,
    x:        Tensor<B, D>,
) -> Tensor<B, D> {
    let mut dropouts = dropouts.iter();
    ops.iter().fold(x, |x, op| match op {
        TailOp::Activation(f) => activation::apply(*f, x),
        TailOp::Pool => pool(x),
        TailOp::Dropout(_) => match dropouts.next() {
            Some(dropout) => dropout.forward(x),
            None => x,
        },
    })
}

// ─── Dense ────────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct DenseBlock<B: Backend> {
    pub linear:      Linear<B>,
    pub dropouts:    Vec<Dropout>,
    pub activation:  Ignored<Activation>,
    pub tail:        Ignored<Vec<TailOp>>,
    pub regularizer: Ignored<Regularizer>,
}

impl<B: Backend> DenseBlock<B> {
    pub fn init(plan: &DensePlan, device: &B::Device) -> Self {
        Self {
            linear:      LinearConfig::new(plan.inputs, plan.units).init(device),
            dropouts:    dropouts(&plan.tail.dropout_rates()),
            activation:  Ignored(plan.tail.activation),
            tail:        Ignored(plan.tail.ops.clone()),
            regularizer: Ignored(plan.regularizer),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> (Tensor<B, 2>, PenaltyTerm<B>) {
        let x = activation::apply(*self.activation, self.linear.forward(x));
        let penalty = regularization::activity(self.regularizer.activity, &x);
        (apply_tail(&self.tail, &self.dropouts, |x| x, x), penalty)
    }

    pub fn weight_penalty(&self) -> PenaltyTerm<B> {
        regularization::linear(&self.regularizer, &self.linear)
    }
}

fn forward_head<B: Backend>(
    head:    &[DenseBlock<B>],
    x:       Tensor<B, 2>,
    penalty: PenaltyTerm<B>,
) -> (Tensor<B, 2>, PenaltyTerm<B>) {
    head.iter().fold((x, penalty), |(x, acc), block| {
        let (x, p) = block.forward(x);
        (x, regularization::add(acc, p))
    })
}

fn head_penalty<B: Backend>(head: &[DenseBlock<B>]) -> PenaltyTerm<B> {
    head.iter().fold(None, |acc, block| regularization::add(acc, block.weight_penalty()))
}

/// Multilayer perceptron
#[derive(Module, Debug)]
pub struct DenseNet<B: Backend> {
    pub input_dropout: Vec<Dropout>,
    pub layers:        Vec<DenseBlock<B>>,
}

impl<B: Backend> DenseNet<B> {
    pub fn init(plan: &ArchitecturePlan, device: &B::Device) -> Self {
        Self {
            input_dropout: dropouts(&plan.input_dropout),
            layers:        plan.dense.iter().map(|d| DenseBlock::init(d, device)).collect(),
        }
    }
}

impl<B: Backend> Network<B> for DenseNet<B> {
    fn forward_penalized(&self, features: Tensor<B, 2>) -> (Tensor<B, 2>, PenaltyTerm<B>) {
        let x = apply_dropouts(&self.input_dropout, features);
        forward_head(&self.layers, x, None)
    }

    fn weight_penalty(&self) -> PenaltyTerm<B> {
        head_penalty(&self.layers)
    }
}

// ─── Convolutional ────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv:        Conv1d<B>,
    pub pool:        Option<MaxPool1d>,
    pub dropouts:    Vec<Dropout>,
    pub activation:  Ignored<Activation>,
    pub tail:        Ignored<Vec<TailOp>>,
    pub regularizer: Ignored<Regularizer>,
}

impl<B: Backend> ConvBlock<B> {
    pub fn init(plan: &ConvPlan, device: &B::Device) -> Self {
        let conv = Conv1dConfig::new(1, plan.filters, plan.kernel_size)
            .with_stride(plan.stride)
            .init(device);
        let pool = plan
            .pool
            .as_ref()
            .map(|p| MaxPool1dConfig::new(p.pool_size).with_stride(p.stride).init());
        Self {
            conv,
            pool,
            dropouts:    dropouts(&plan.tail.dropout_rates()),
            activation:  Ignored(plan.tail.activation),
            tail:        Ignored(plan.tail.ops.clone()),
            regularizer: Ignored(plan.regularizer),
        }
    }

    /// [batch, P] → [batch, filters × length]
    pub fn forward(&self, x: Tensor<B, 2>) -> (Tensor<B, 2>, PenaltyTerm<B>) {
        let [batch, width] = x.dims();
        let x = self.conv.forward(x.reshape([batch, 1, width]));
        let x = activation::apply(*self.activation, x);
        let penalty = regularization::activity(self.regularizer.activity, &x);
        let pool = |x: Tensor<B, 3>| match &self.pool {
            Some(pool) => pool.forward(x),
            None => x,
        };
        let x = apply_tail(&self.tail, &self.dropouts, pool, x);
        (x.flatten::<2>(1, 2), penalty)
    }

    pub fn weight_penalty(&self) -> PenaltyTerm<B> {
        let kernel = regularization::penalty(self.regularizer.kernel, self.conv.weight.val());
        let bias = self
            .conv
            .bias
            .as_ref()
            .and_then(|b| regularization::penalty(self.regularizer.bias, b.val()));
        regularization::add(kernel, bias)
    }
}

/// One conv1d block over the marker axis followed by a dense head
#[derive(Module, Debug)]
pub struct ConvNet<B: Backend> {
    pub input_dropout: Vec<Dropout>,
    pub conv:          ConvBlock<B>,
    pub head:          Vec<DenseBlock<B>>,
}

impl<B: Backend> ConvNet<B> {
    pub fn init(plan: &ArchitecturePlan, conv: &ConvPlan, device: &B::Device) -> Self {
        Self {
            input_dropout: dropouts(&plan.input_dropout),
            conv:          ConvBlock::init(conv, device),
            head:          plan.dense.iter().map(|d| DenseBlock::init(d, device)).collect(),
        }
    }
}

impl<B: Backend> Network<B> for ConvNet<B> {
    fn forward_penalized(&self, features: Tensor<B, 2>) -> (Tensor<B, 2>, PenaltyTerm<B>) {
        let x = apply_dropouts(&self.input_dropout, features);
        let (x, penalty) = self.conv.forward(x);
        forward_head(&self.head, x, penalty)
    }

    fn weight_penalty(&self) -> PenaltyTerm<B> {
        regularization::add(self.conv.weight_penalty(), head_penalty(&self.head))
    }
}

// ─── Recurrent ────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct LstmBlock<B: Backend> {
    pub lstm:             Lstm<B>,
    pub return_sequences: bool,
    pub dropouts:         Vec<Dropout>,
    pub tail:             Ignored<Vec<TailOp>>,
    pub regularizer:      Ignored<Regularizer>,
}

impl<B: Backend> LstmBlock<B> {
    pub fn init(plan: &RecurrentPlan, device: &B::Device) -> Self {
        Self {
            lstm:             LstmConfig::new(plan.inputs, plan.units, true).init(device),
            return_sequences: plan.return_sequences,
            dropouts:         dropouts(&plan.tail.dropout_rates()),
            tail:             Ignored(plan.tail.ops.clone()),
            regularizer:      Ignored(plan.regularizer),
        }
    }

    /// [batch, T, d] → [batch, T, units]
    pub fn forward_sequence(&self, x: Tensor<B, 3>) -> (Tensor<B, 3>, PenaltyTerm<B>) {
        let (hidden, _state) = self.lstm.forward(x, None);
        self.finish(hidden)
    }

    /// [batch, T, d] → [batch, units], hidden state of the final step
    pub fn forward_last(&self, x: Tensor<B, 3>) -> (Tensor<B, 2>, PenaltyTerm<B>) {
        let (hidden, _state) = self.lstm.forward(x, None);
        let [batch, steps, units] = hidden.dims();
        let last = hidden
            .slice([0..batch, steps - 1..steps, 0..units])
            .reshape([batch, units]);
        self.finish(last)
    }

    fn finish<const D: usize>(&self, x: Tensor<B, D>) -> (Tensor<B, D>, PenaltyTerm<B>) {
        let penalty = regularization::activity(self.regularizer.activity, &x);
        (apply_tail(&self.tail, &self.dropouts, |x| x, x), penalty)
    }

    pub fn weight_penalty(&self) -> PenaltyTerm<B> {
        let gates = [
            &self.lstm.input_gate,
            &self.lstm.forget_gate,
            &self.lstm.output_gate,
            &self.lstm.cell_gate,
        ];
        gates.into_iter().fold(None, |acc, gate| {
            let input  = regularization::linear(&self.regularizer, &gate.input_transform);
            let hidden = regularization::linear(&self.regularizer, &gate.hidden_transform);
            regularization::add(acc, regularization::add(input, hidden))
        })
    }
}

/// Stacked LSTMs over the marker vector cut into `timesteps` steps
#[derive(Module, Debug)]
pub struct RecurrentNet<B: Backend> {
    pub input_dropout: Vec<Dropout>,
    pub timesteps:     usize,
    pub recurrent:     Vec<LstmBlock<B>>,
    pub head:          Vec<DenseBlock<B>>,
}

impl<B: Backend> RecurrentNet<B> {
    pub fn init(plan: &ArchitecturePlan, device: &B::Device) -> Self {
        Self {
            input_dropout: dropouts(&plan.input_dropout),
            timesteps:     plan.timesteps,
            recurrent:     plan.recurrent.iter().map(|r| LstmBlock::init(r, device)).collect(),
            head:          plan.dense.iter().map(|d| DenseBlock::init(d, device)).collect(),
        }
    }
}

impl<B: Backend> Network<B> for RecurrentNet<B> {
    fn forward_penalized(&self, features: Tensor<B, 2>) -> (Tensor<B, 2>, PenaltyTerm<B>) {
        let [batch, width] = features.dims();
        let x = apply_dropouts(&self.input_dropout, features);
        let mut seq = x.reshape([batch, self.timesteps, width / self.timesteps]);
        let mut penalty = None;

        let Some((last, stacked)) = self.recurrent.split_last() else {
            return forward_head(&self.head, seq.flatten::<2>(1, 2), None);
        };
        for block in stacked {
            let (out, p) = block.forward_sequence(seq);
            seq = out;
            penalty = regularization::add(penalty, p);
        }
        let (flat, p) = if last.return_sequences {
            let (out, p) = last.forward_sequence(seq);
            (out.flatten::<2>(1, 2), p)
        } else {
            last.forward_last(seq)
        };
        forward_head(&self.head, flat, regularization::add(penalty, p))
    }

    fn weight_penalty(&self) -> PenaltyTerm<B> {
        let recurrent = self
            .recurrent
            .iter()
            .fold(None, |acc, block| regularization::add(acc, block.weight_penalty()));
        regularization::add(recurrent, head_penalty(&self.head))
    }
}
