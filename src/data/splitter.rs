// ============================================================
// Layer 4 — Train/Test Splitter
// ============================================================
// Shuffles the row indices 0..N with a seeded generator and cuts
// them into two disjoint sets:
//   - train: round(N × ratio) rows, used to update model weights
//   - test:  the remaining rows, used only for evaluation
//
// ChaCha8 is used instead of the thread RNG so the same seed gives
// the same partition on every platform and every run.
//
// Reference: rand crate documentation (SliceRandom, SeedableRng)

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::domain::error::{PipelineError, Result};
use crate::domain::matrix::{SampleSet, Split};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Splitter {
    ratio: f64,
    seed:  u64,
}

impl Splitter {
    /// `ratio` is the training fraction and must lie in (0, 1).
    pub fn new(ratio: f64, seed: u64) -> Result<Self> {
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(PipelineError::InvalidRatio(ratio));
        }
        Ok(Self { ratio, seed })
    }

    /// Partition the rows of `data`.
    pub fn split(&self, data: &SampleSet) -> Split {
        self.split_len(data.len())
    }

    /// Partition the index range `0..n`.
    pub fn split_len(&self, n: usize) -> Split {
        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);

        let split_at = ((n as f64) * self.ratio).round() as usize;
        let split_at = split_at.min(n);

        let mut test  = indices.split_off(split_at);
        let mut train = indices;
        train.sort_unstable();
        test.sort_unstable();

        tracing::debug!(
            "Dataset split: {} train, {} test (seed {})",
            train.len(),
            test.len(),
            self.seed
        );

        Split { train, test }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_correct_split_sizes() {
        let split = Splitter::new(0.8, 7).unwrap().split_len(100);
        assert_eq!(split.train.len(), 80);
        assert_eq!(split.test.len(), 20);
    }

    #[test]
    fn test_partition_is_disjoint_and_complete() {
        for n in [0usize, 1, 2, 3, 10, 57, 101] {
            for ratio in [0.1, 0.25, 0.5, 0.8, 0.99] {
                let split = Splitter::new(ratio, n as u64).unwrap().split_len(n);
                assert_eq!(split.train.len() + split.test.len(), n);

                let train: HashSet<_> = split.train.iter().copied().collect();
                let test: HashSet<_> = split.test.iter().copied().collect();
                assert!(train.is_disjoint(&test));
                let all: HashSet<_> = train.union(&test).copied().collect();
                assert_eq!(all, (0..n).collect::<HashSet<_>>());
            }
        }
    }

    #[test]
    fn test_same_seed_same_partition() {
        let a = Splitter::new(0.7, 1234).unwrap().split_len(250);
        let b = Splitter::new(0.7, 1234).unwrap().split_len(250);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_different_partition() {
        let a = Splitter::new(0.5, 1).unwrap().split_len(200);
        let b = Splitter::new(0.5, 2).unwrap().split_len(200);
        assert_ne!(a, b);
    }

    #[test]
    fn test_ratio_out_of_range() {
        for ratio in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            assert!(matches!(Splitter::new(ratio, 0), Err(PipelineError::InvalidRatio(_))));
        }
    }
}
