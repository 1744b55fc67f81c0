// ============================================================
// Layer 3 — Architecture Spec
// ============================================================
// A model is described by an immutable, ordered list of layer
// descriptors (LayerSpec). Nothing numeric happens here: the spec is
// folded into an ArchitecturePlan that
//
//   1. decides the model variant (dense / convolutional / recurrent)
//   2. checks the layer ordering rules for that variant
//   3. computes every intermediate width and parameter count
//
// The ml layer turns a plan into burn modules; the summary printer
// reads the per-layer rows recorded while planning.
//
// Example JSON accepted by `--architecture`:
//
//   {
//     "input_width": 1279,
//     "layers": [
//       { "kind": "conv1d", "filters": 16, "kernel_size": 3, "stride": 1,
//         "activation": "relu" },
//       { "kind": "max_pool1d", "pool_size": 2 },
//       { "kind": "dense", "units": 32, "activation": "relu" },
//       { "kind": "dropout", "rate": 0.2 },
//       { "kind": "dense", "units": 1 }
//     ]
//   }

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, Result};

// ─── Activation ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Sigmoid,
    Tanh,
    Softmax,
    Gelu,
}

impl FromStr for Activation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" | "identity" => Ok(Self::Linear),
            "relu"                => Ok(Self::Relu),
            "sigmoid"             => Ok(Self::Sigmoid),
            "tanh"                => Ok(Self::Tanh),
            "softmax"             => Ok(Self::Softmax),
            "gelu"                => Ok(Self::Gelu),
            other => Err(format!(
                "unknown activation '{other}' (expected linear, relu, sigmoid, tanh, softmax or gelu)"
            )),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Linear  => "linear",
            Self::Relu    => "relu",
            Self::Sigmoid => "sigmoid",
            Self::Tanh    => "tanh",
            Self::Softmax => "softmax",
            Self::Gelu    => "gelu",
        };
        f.write_str(name)
    }
}

// ─── Regularization ───────────────────────────────────────────────────────────
/// L1 / L2 strengths for one regularized term. Both non-zero is Elastic Net.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Penalty {
    #[serde(default)]
    pub l1: f64,
    #[serde(default)]
    pub l2: f64,
}

impl Penalty {
    pub fn l1(strength: f64) -> Self {
        Self { l1: strength, l2: 0.0 }
    }

    pub fn l2(strength: f64) -> Self {
        Self { l1: 0.0, l2: strength }
    }

    pub fn elastic_net(l1: f64, l2: f64) -> Self {
        Self { l1, l2 }
    }

    pub fn is_zero(&self) -> bool {
        self.l1 == 0.0 && self.l2 == 0.0
    }
}

/// Independent penalties on kernel weights, bias terms and layer outputs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Regularizer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel: Option<Penalty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bias: Option<Penalty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<Penalty>,
}

impl Regularizer {
    fn validate(&self) -> Result<()> {
        for p in [self.kernel, self.bias, self.activity].into_iter().flatten() {
            if !(p.l1 >= 0.0 && p.l2 >= 0.0) {
                return Err(PipelineError::Architecture(format!(
                    "regularization strengths must be non-negative, got l1={} l2={}",
                    p.l1, p.l2
                )));
            }
        }
        Ok(())
    }
}

// ─── LayerSpec ────────────────────────────────────────────────────────────────
/// One entry of the layer sequence. Closed set of kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerSpec {
    Dense {
        units: usize,
        #[serde(default)]
        activation: Activation,
        #[serde(default)]
        regularizer: Regularizer,
    },
    Conv1d {
        filters:     usize,
        kernel_size: usize,
        #[serde(default = "one")]
        stride:      usize,
        #[serde(default)]
        activation:  Activation,
        #[serde(default)]
        regularizer: Regularizer,
    },
    MaxPool1d {
        pool_size: usize,
        /// Defaults to `pool_size`
        #[serde(default)]
        stride:    Option<usize>,
    },
    Lstm {
        units: usize,
        #[serde(default)]
        return_sequences: bool,
        #[serde(default)]
        regularizer: Regularizer,
    },
    Dropout {
        rate: f64,
    },
    Activation {
        function: Activation,
    },
}

fn one() -> usize {
    1
}

impl LayerSpec {
    pub fn dense(units: usize, activation: Activation) -> Self {
        Self::Dense { units, activation, regularizer: Regularizer::default() }
    }

    pub fn conv1d(filters: usize, kernel_size: usize, stride: usize, activation: Activation) -> Self {
        Self::Conv1d { filters, kernel_size, stride, activation, regularizer: Regularizer::default() }
    }

    pub fn max_pool1d(pool_size: usize) -> Self {
        Self::MaxPool1d { pool_size, stride: None }
    }

    pub fn lstm(units: usize, return_sequences: bool) -> Self {
        Self::Lstm { units, return_sequences, regularizer: Regularizer::default() }
    }

    pub fn dropout(rate: f64) -> Self {
        Self::Dropout { rate }
    }

    pub fn activation(function: Activation) -> Self {
        Self::Activation { function }
    }

    /// Attach a regularizer. Layers without weights are returned unchanged.
    pub fn with_regularizer(mut self, reg: Regularizer) -> Self {
        match &mut self {
            Self::Dense { regularizer, .. }
            | Self::Conv1d { regularizer, .. }
            | Self::Lstm { regularizer, .. } => *regularizer = reg,
            _ => {}
        }
        self
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Dense { .. }      => "dense",
            Self::Conv1d { .. }     => "conv1d",
            Self::MaxPool1d { .. }  => "max_pool1d",
            Self::Lstm { .. }       => "lstm",
            Self::Dropout { .. }    => "dropout",
            Self::Activation { .. } => "activation",
        }
    }
}

// ─── ArchitectureSpec ─────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureSpec {
    /// Number of predictor columns the model expects
    pub input_width: usize,
    /// Recurrent models only: number of steps the marker vector is cut
    /// into. Defaults to `input_width` (one marker per step).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timesteps: Option<usize>,
    pub layers: Vec<LayerSpec>,
}

impl ArchitectureSpec {
    pub fn new(input_width: usize) -> Self {
        Self { input_width, timesteps: None, layers: Vec::new() }
    }

    pub fn with_layer(mut self, layer: LayerSpec) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn with_timesteps(mut self, timesteps: usize) -> Self {
        self.timesteps = Some(timesteps);
        self
    }

    /// Multilayer perceptron: hidden dense layers, optional dropout after
    /// each, then a linear-or-`output_activation` head.
    pub fn mlp(
        input_width:       usize,
        hidden:            &[usize],
        activation:        Activation,
        dropout:           Option<f64>,
        outputs:           usize,
        output_activation: Activation,
    ) -> Self {
        let mut spec = Self::new(input_width);
        for &units in hidden {
            spec = spec.with_layer(LayerSpec::dense(units, activation));
            if let Some(rate) = dropout.filter(|r| *r > 0.0) {
                spec = spec.with_layer(LayerSpec::dropout(rate));
            }
        }
        spec.with_layer(LayerSpec::dense(outputs, output_activation))
    }

    /// Validate the layer sequence and compute all intermediate shapes.
    pub fn plan(&self) -> Result<ArchitecturePlan> {
        Planner::new(self)?.run()
    }
}

// ─── Plan ─────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Dense,
    Convolutional,
    Recurrent,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dense         => f.write_str("dense"),
            Self::Convolutional => f.write_str("convolutional"),
            Self::Recurrent     => f.write_str("recurrent"),
        }
    }
}

/// A parameter-free layer declared after a weighted one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TailOp {
    Activation(Activation),
    Pool,
    Dropout(f64),
}

/// The weighted layer's own activation, then the parameter-free layers that
/// follow it, kept in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockTail {
    pub activation: Activation,
    pub ops:        Vec<TailOp>,
}

impl BlockTail {
    pub fn new(activation: Activation) -> Self {
        Self { activation, ops: Vec::new() }
    }

    pub fn dropout_rates(&self) -> Vec<f64> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                TailOp::Dropout(rate) => Some(*rate),
                _ => None,
            })
            .collect()
    }

    /// Activation applied last, ignoring dropout and pooling
    pub fn last_activation(&self) -> Activation {
        self.ops
            .iter()
            .rev()
            .find_map(|op| match op {
                TailOp::Activation(f) => Some(*f),
                _ => None,
            })
            .unwrap_or(self.activation)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DensePlan {
    pub inputs:      usize,
    pub units:       usize,
    pub regularizer: Regularizer,
    pub tail:        BlockTail,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolPlan {
    pub pool_size:     usize,
    pub stride:        usize,
    pub output_length: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvPlan {
    pub input_length: usize,
    pub filters:      usize,
    pub kernel_size:  usize,
    pub stride:       usize,
    pub conv_length:  usize,
    pub pool:         Option<PoolPlan>,
    pub regularizer:  Regularizer,
    pub tail:         BlockTail,
}

impl ConvPlan {
    /// Sequence length after convolution and pooling
    pub fn output_length(&self) -> usize {
        self.pool.as_ref().map(|p| p.output_length).unwrap_or(self.conv_length)
    }

    pub fn flat_width(&self) -> usize {
        self.filters * self.output_length()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecurrentPlan {
    pub inputs:           usize,
    pub units:            usize,
    pub return_sequences: bool,
    pub regularizer:      Regularizer,
    pub tail:             BlockTail,
}

/// One row of the architecture summary
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRow {
    pub name:         String,
    /// Output shape without the batch dimension
    pub output_shape: Vec<usize>,
    pub params:       usize,
}

/// Validated, shape-resolved form of an ArchitectureSpec.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchitecturePlan {
    pub kind:          ModelKind,
    pub input_width:   usize,
    pub timesteps:     usize,
    pub input_dropout: Vec<f64>,
    pub conv:          Option<ConvPlan>,
    pub recurrent:     Vec<RecurrentPlan>,
    pub dense:         Vec<DensePlan>,
    pub rows:          Vec<LayerRow>,
}

impl ArchitecturePlan {
    pub fn output_width(&self) -> usize {
        self.dense.last().map(|d| d.units).unwrap_or(0)
    }

    /// Last activation applied to the model output
    pub fn output_activation(&self) -> Activation {
        self.dense
            .last()
            .map(|d| d.tail.last_activation())
            .unwrap_or(Activation::Linear)
    }

    pub fn total_params(&self) -> usize {
        self.rows.iter().map(|r| r.params).sum()
    }

    /// Fail with `ShapeMismatch` unless the data has `input_width` columns.
    pub fn check_input_width(&self, actual: usize) -> Result<()> {
        if self.input_width != actual {
            return Err(PipelineError::ShapeMismatch {
                what:     "input width",
                expected: self.input_width,
                actual,
            });
        }
        Ok(())
    }

    /// Fail with `ShapeMismatch` unless the head produces `actual` outputs.
    pub fn check_output_width(&self, actual: usize) -> Result<()> {
        if self.output_width() != actual {
            return Err(PipelineError::ShapeMismatch {
                what:     "output width",
                expected: self.output_width(),
                actual,
            });
        }
        Ok(())
    }
}

// ─── Planner ──────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Input,
    Conv,
    Recurrent,
    Dense,
}

struct Planner<'a> {
    spec:  &'a ArchitectureSpec,
    plan:  ArchitecturePlan,
    stage: Stage,
    /// Width of the 2-D tensor a dense layer would receive next
    flat:  usize,
    /// Per-step feature width a recurrent layer would receive next
    step:  usize,
}

fn invalid(index: usize, layer: &LayerSpec, msg: impl fmt::Display) -> PipelineError {
    PipelineError::Architecture(format!("layer {} ({}): {msg}", index + 1, layer.name()))
}

impl<'a> Planner<'a> {
    fn new(spec: &'a ArchitectureSpec) -> Result<Self> {
        if spec.input_width == 0 {
            return Err(PipelineError::Architecture("input width must be positive".into()));
        }
        if spec.layers.is_empty() {
            return Err(PipelineError::Architecture("no layers declared".into()));
        }

        let has_lstm = spec.layers.iter().any(|l| matches!(l, LayerSpec::Lstm { .. }));
        let has_conv = spec.layers.iter().any(|l| matches!(l, LayerSpec::Conv1d { .. }));
        let kind = match (has_conv, has_lstm) {
            (true, true) => {
                return Err(PipelineError::Architecture(
                    "convolutional and recurrent layers cannot be mixed".into(),
                ))
            }
            (true, false)  => ModelKind::Convolutional,
            (false, true)  => ModelKind::Recurrent,
            (false, false) => ModelKind::Dense,
        };

        let timesteps = match kind {
            ModelKind::Recurrent => {
                let t = spec.timesteps.unwrap_or(spec.input_width);
                if t == 0 || spec.input_width % t != 0 {
                    return Err(PipelineError::Architecture(format!(
                        "input width {} cannot be split into {t} timesteps",
                        spec.input_width
                    )));
                }
                t
            }
            _ => 1,
        };

        Ok(Self {
            spec,
            plan: ArchitecturePlan {
                kind,
                input_width: spec.input_width,
                timesteps,
                input_dropout: Vec::new(),
                conv: None,
                recurrent: Vec::new(),
                dense: Vec::new(),
                rows: Vec::new(),
            },
            stage: Stage::Input,
            flat:  spec.input_width,
            step:  spec.input_width / timesteps,
        })
    }

    fn run(mut self) -> Result<ArchitecturePlan> {
        let spec = self.spec;
        for (i, layer) in spec.layers.iter().enumerate() {
            self.fold(i, layer)?;
        }
        if self.stage != Stage::Dense {
            return Err(PipelineError::Architecture(
                "the last weighted layer must be a dense output layer".into(),
            ));
        }
        Ok(self.plan)
    }

    fn current_shape(&self) -> Vec<usize> {
        match self.stage {
            Stage::Conv => {
                let conv = self.plan.conv.as_ref().map(|c| (c.filters, c.output_length()));
                conv.map(|(f, l)| vec![f, l]).unwrap_or_default()
            }
            Stage::Recurrent => match self.plan.recurrent.last() {
                Some(r) if r.return_sequences => vec![self.plan.timesteps, r.units],
                Some(r) => vec![r.units],
                None => vec![],
            },
            Stage::Input if self.plan.kind == ModelKind::Recurrent => {
                vec![self.plan.timesteps, self.step]
            }
            _ => vec![self.flat],
        }
    }

    fn tail_mut(&mut self) -> Option<&mut BlockTail> {
        match self.stage {
            Stage::Input     => None,
            Stage::Conv      => self.plan.conv.as_mut().map(|c| &mut c.tail),
            Stage::Recurrent => self.plan.recurrent.last_mut().map(|r| &mut r.tail),
            Stage::Dense     => self.plan.dense.last_mut().map(|d| &mut d.tail),
        }
    }

    fn push_row(&mut self, name: String, params: usize) {
        let output_shape = self.current_shape();
        self.plan.rows.push(LayerRow { name, output_shape, params });
    }

    fn fold(&mut self, i: usize, layer: &LayerSpec) -> Result<()> {
        match layer {
            LayerSpec::Dense { units, activation, regularizer } => {
                if *units == 0 {
                    return Err(invalid(i, layer, "units must be positive"));
                }
                regularizer.validate()?;
                if self.stage == Stage::Recurrent {
                    // flatten the final sequence output, if any
                    self.flat = match self.plan.recurrent.last() {
                        Some(r) if r.return_sequences => self.plan.timesteps * r.units,
                        Some(r) => r.units,
                        None => self.flat,
                    };
                }
                let inputs = self.flat;
                self.plan.dense.push(DensePlan {
                    inputs,
                    units: *units,
                    regularizer: *regularizer,
                    tail: BlockTail::new(*activation),
                });
                self.flat  = *units;
                self.stage = Stage::Dense;
                self.push_row(format!("dense ({activation})"), inputs * units + units);
            }

            LayerSpec::Conv1d { filters, kernel_size, stride, activation, regularizer } => {
                if self.stage != Stage::Input {
                    return Err(invalid(i, layer, "must be the first weighted layer"));
                }
                if *filters == 0 || *kernel_size == 0 || *stride == 0 {
                    return Err(invalid(i, layer, "filters, kernel size and stride must be positive"));
                }
                if *kernel_size > self.spec.input_width {
                    return Err(invalid(
                        i,
                        layer,
                        format!("kernel size {kernel_size} exceeds input width {}", self.spec.input_width),
                    ));
                }
                regularizer.validate()?;
                let conv_length = (self.spec.input_width - kernel_size) / stride + 1;
                self.plan.conv = Some(ConvPlan {
                    input_length: self.spec.input_width,
                    filters: *filters,
                    kernel_size: *kernel_size,
                    stride: *stride,
                    conv_length,
                    pool: None,
                    regularizer: *regularizer,
                    tail: BlockTail::new(*activation),
                });
                self.flat  = filters * conv_length;
                self.stage = Stage::Conv;
                self.push_row(format!("conv1d ({activation})"), kernel_size * filters + filters);
            }

            LayerSpec::MaxPool1d { pool_size, stride } => {
                let conv = match (self.stage, self.plan.conv.as_mut()) {
                    (Stage::Conv, Some(conv)) if conv.pool.is_none() => conv,
                    (Stage::Conv, Some(_)) => return Err(invalid(i, layer, "only one pooling layer is allowed")),
                    _ => return Err(invalid(i, layer, "must follow the conv1d layer")),
                };
                let stride = stride.unwrap_or(*pool_size);
                if *pool_size == 0 || stride == 0 {
                    return Err(invalid(i, layer, "pool size and stride must be positive"));
                }
                if *pool_size > conv.conv_length {
                    return Err(invalid(
                        i,
                        layer,
                        format!("pool size {pool_size} exceeds sequence length {}", conv.conv_length),
                    ));
                }
                let output_length = (conv.conv_length - pool_size) / stride + 1;
                conv.pool = Some(PoolPlan { pool_size: *pool_size, stride, output_length });
                conv.tail.ops.push(TailOp::Pool);
                self.flat = conv.flat_width();
                self.push_row("max_pool1d".into(), 0);
            }

            LayerSpec::Lstm { units, return_sequences, regularizer } => {
                match self.stage {
                    Stage::Input => {}
                    Stage::Recurrent if self.plan.recurrent.last().is_some_and(|r| r.return_sequences) => {}
                    Stage::Recurrent => {
                        return Err(invalid(i, layer, "previous lstm must set return_sequences"))
                    }
                    _ => return Err(invalid(i, layer, "recurrent layers must precede dense layers")),
                }
                if *units == 0 {
                    return Err(invalid(i, layer, "units must be positive"));
                }
                regularizer.validate()?;
                let inputs = self.step;
                self.plan.recurrent.push(RecurrentPlan {
                    inputs,
                    units: *units,
                    return_sequences: *return_sequences,
                    regularizer: *regularizer,
                    tail: BlockTail::new(Activation::Linear),
                });
                self.step  = *units;
                self.stage = Stage::Recurrent;
                // four gates, each an input and a hidden linear map with bias
                let params = 4 * (inputs * units + units * units + 2 * units);
                self.push_row("lstm".into(), params);
            }

            LayerSpec::Dropout { rate } => {
                if !(0.0..1.0).contains(rate) {
                    return Err(invalid(i, layer, format!("rate {rate} outside [0, 1)")));
                }
                match self.tail_mut() {
                    Some(tail) => tail.ops.push(TailOp::Dropout(*rate)),
                    None => self.plan.input_dropout.push(*rate),
                }
                self.push_row(format!("dropout ({rate})"), 0);
            }

            LayerSpec::Activation { function } => {
                match self.tail_mut() {
                    Some(tail) => tail.ops.push(TailOp::Activation(*function)),
                    None => return Err(invalid(i, layer, "must follow a weighted layer")),
                }
                self.push_row(format!("activation ({function})"), 0);
            }
        }
        Ok(())
    }
}
