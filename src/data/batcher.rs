// ============================================================
// Layer 4 — Genomic Batcher
// ============================================================
// Implements burn's Batcher trait: a Vec of GenomicSamples becomes
// one pair of 2-D tensors.
//
//   Input:  B samples, each with P features and M targets
//   Output: features [B, P], targets [B, M]
//
// Rows are flattened in order and reshaped, so row i of each tensor
// belongs to sample i. The last batch of an epoch may hold fewer
// than `batch_size` samples.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::GenomicSample;

// ─── GenomicBatch ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct GenomicBatch<B: Backend> {
    /// Marker values — shape: [batch_size, P]
    pub features: Tensor<B, 2>,

    /// Trait values or one-hot classes — shape: [batch_size, M]
    pub targets: Tensor<B, 2>,
}

// ─── GenomicBatcher ───────────────────────────────────────────────────────────
/// Holds the target device so tensors are created where the model lives.
#[derive(Clone, Debug)]
pub struct GenomicBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> GenomicBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<GenomicSample, GenomicBatch<B>> for GenomicBatcher<B> {
    fn batch(&self, items: Vec<GenomicSample>) -> GenomicBatch<B> {
        let batch_size = items.len();
        let n_features = items[0].features.len();
        let n_targets  = items[0].targets.len();

        let features: Vec<f32> = items
            .iter()
            .flat_map(|s| s.features.iter().copied())
            .collect();
        let targets: Vec<f32> = items
            .iter()
            .flat_map(|s| s.targets.iter().copied())
            .collect();

        let features = Tensor::<B, 2>::from_data(
            TensorData::new(features, [batch_size, n_features]),
            &self.device,
        );
        let targets = Tensor::<B, 2>::from_data(
            TensorData::new(targets, [batch_size, n_targets]),
            &self.device,
        );

        GenomicBatch { features, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shapes_and_order() {
        let batcher = GenomicBatcher::<NdArray>::new(Default::default());
        let items = vec![
            GenomicSample { features: vec![0.0, 1.0, 2.0], targets: vec![5.0] },
            GenomicSample { features: vec![2.0, 1.0, 0.0], targets: vec![7.0] },
        ];
        let batch = batcher.batch(items);

        assert_eq!(batch.features.dims(), [2, 3]);
        assert_eq!(batch.targets.dims(), [2, 1]);

        let features = batch.features.into_data().to_vec::<f32>().unwrap();
        assert_eq!(features, vec![0.0, 1.0, 2.0, 2.0, 1.0, 0.0]);
        let targets = batch.targets.into_data().to_vec::<f32>().unwrap();
        assert_eq!(targets, vec![5.0, 7.0]);
    }
}
