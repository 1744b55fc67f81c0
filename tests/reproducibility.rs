// Kept in its own test binary: weight init and dropout draw from the
// backend's global RNG, which tests running on other threads would
// otherwise advance between the seed and the draws.

use genomic_predict::application::train_use_case::{run_pipeline, RunConfig};
use genomic_predict::domain::architecture::{Activation, ArchitectureSpec};
use genomic_predict::domain::matrix::{FeatureMatrix, SampleSet, TargetMatrix};
use genomic_predict::domain::training::{OptimizerKind, TrainingConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn marker_set(n: usize, p: usize) -> SampleSet {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let rows: Vec<Vec<f32>> = (0..n)
        .map(|_| (0..p).map(|_| f32::from(rng.gen_range(0u8..3))).collect())
        .collect();
    let targets = rows.iter().map(|r| vec![r.iter().sum::<f32>() / p as f32]).collect();
    SampleSet::new(
        FeatureMatrix::from_rows(rows).unwrap(),
        TargetMatrix::from_rows(targets).unwrap(),
    )
    .unwrap()
}

fn config(seed: u64) -> RunConfig {
    RunConfig {
        features:     "features.txt".into(),
        targets:      "targets.txt".into(),
        delimiter:    None,
        architecture: ArchitectureSpec::mlp(6, &[8], Activation::Relu, Some(0.3), 1, Activation::Linear),
        train_ratio:  0.8,
        training:     TrainingConfig {
            optimizer:  OptimizerKind::Adam,
            learning_rate: 0.01,
            epochs:     4,
            batch_size: 8,
            seed,
            ..TrainingConfig::default()
        },
    }
}

#[test]
fn test_same_seed_reproduces_training() {
    let data = marker_set(60, 6);

    let (_, first) = run_pipeline(&data, &config(42)).unwrap();
    let (_, second) = run_pipeline(&data, &config(42)).unwrap();

    assert_eq!(first.split, second.split);
    assert_eq!(first.report.history, second.report.history);
    assert_eq!(first.test_loss, second.test_loss);

    let (_, other) = run_pipeline(&data, &config(7)).unwrap();
    assert_ne!(first.report.history, other.report.history);
}
