use burn::tensor::{activation, backend::Backend, Tensor};

use crate::domain::architecture::Activation;

/// Apply one activation. Softmax normalises over the last dimension.
pub fn apply<B: Backend, const D: usize>(function: Activation, x: Tensor<B, D>) -> Tensor<B, D> {
    match function {
        Activation::Linear  => x,
        Activation::Relu    => activation::relu(x),
        Activation::Sigmoid => activation::sigmoid(x),
        Activation::Tanh    => activation::tanh(x),
        Activation::Gelu    => activation::gelu(x),
        Activation::Softmax => activation::softmax(x, D - 1),
    }
}
