// ============================================================
// Layer 5 — Regularization Penalties
// ============================================================
// L1: strength × Σ|w|      L2: strength × Σw²
//
// A Penalty with both strengths set is the Elastic Net combination.
// Kernel and bias penalties are computed from the current parameter
// values; activity penalties from a layer's output, averaged over the
// batch so their weight does not depend on the batch size.
//
// All penalties are tensors on the autodiff graph, so adding them to
// the data loss makes them part of the gradient.

use burn::{nn::Linear, prelude::*};

use crate::domain::architecture::{Penalty, Regularizer};

/// `l1 · Σ|x| + l2 · Σx²`, or None when no penalty is configured.
pub fn penalty<B: Backend, const D: usize>(
    penalty: Option<Penalty>,
    tensor:  Tensor<B, D>,
) -> Option<Tensor<B, 1>> {
    let p = penalty.filter(|p| !p.is_zero())?;

    let l1 = (p.l1 > 0.0).then(|| tensor.clone().abs().sum().mul_scalar(p.l1));
    let l2 = (p.l2 > 0.0).then(|| tensor.clone().mul(tensor).sum().mul_scalar(p.l2));
    add(l1, l2)
}

/// Activity penalty on a layer output whose first dimension is the batch.
pub fn activity<B: Backend, const D: usize>(
    p:      Option<Penalty>,
    output: &Tensor<B, D>,
) -> Option<Tensor<B, 1>> {
    let batch = output.dims()[0].max(1);
    penalty(p, output.clone()).map(|t| t.div_scalar(batch as f64))
}

/// Kernel and bias penalties of one linear map.
pub fn linear<B: Backend>(reg: &Regularizer, layer: &Linear<B>) -> Option<Tensor<B, 1>> {
    let kernel = penalty(reg.kernel, layer.weight.val());
    let bias   = layer.bias.as_ref().and_then(|b| penalty(reg.bias, b.val()));
    add(kernel, bias)
}

/// Sum two optional scalar terms.
pub fn add<B: Backend>(a: Option<Tensor<B, 1>>, b: Option<Tensor<B, 1>>) -> Option<Tensor<B, 1>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a + b),
        (a, None)          => a,
        (None, b)          => b,
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::{ElementConversion, TensorData};

    type B = NdArray;

    fn weights() -> Tensor<B, 2> {
        Tensor::from_data(TensorData::new(vec![1.0f32, -2.0, 0.5, 0.0], [2, 2]), &Default::default())
    }

    fn scalar(t: Tensor<B, 1>) -> f64 {
        t.into_scalar().elem::<f64>()
    }

    #[test]
    fn test_l1() {
        let p = penalty(Some(Penalty::l1(0.1)), weights()).unwrap();
        assert!((scalar(p) - 0.35).abs() < 1e-6);
    }

    #[test]
    fn test_l2() {
        let p = penalty(Some(Penalty::l2(0.1)), weights()).unwrap();
        assert!((scalar(p) - 0.525).abs() < 1e-6);
    }

    #[test]
    fn test_elastic_net_is_sum() {
        let p = penalty(Some(Penalty::elastic_net(0.1, 0.1)), weights()).unwrap();
        assert!((scalar(p) - 0.875).abs() < 1e-6);
    }

    #[test]
    fn test_zero_or_missing_penalty() {
        assert!(penalty(None, weights()).is_none());
        assert!(penalty(Some(Penalty::default()), weights()).is_none());
    }

    #[test]
    fn test_activity_is_batch_averaged() {
        // 2 rows: Σ|x| = 3.5, averaged over the batch = 1.75
        let p = activity(Some(Penalty::l1(1.0)), &weights()).unwrap();
        assert!((scalar(p) - 1.75).abs() < 1e-6);
    }
}
