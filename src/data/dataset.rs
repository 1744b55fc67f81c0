use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::matrix::SampleSet;

/// One sample: a marker row and its trait values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenomicSample {
    pub features: Vec<f32>,
    pub targets:  Vec<f32>,
}

pub struct GenomicDataset {
    samples: Vec<GenomicSample>,
}

impl GenomicDataset {
    pub fn new(samples: Vec<GenomicSample>) -> Self {
        Self { samples }
    }
}

impl From<&SampleSet> for GenomicDataset {
    fn from(data: &SampleSet) -> Self {
        let samples = data
            .features()
            .view()
            .rows()
            .into_iter()
            .zip(data.targets().view().rows())
            .map(|(x, y)| GenomicSample {
                features: x.to_vec(),
                targets:  y.to_vec(),
            })
            .collect();
        Self::new(samples)
    }
}

impl Dataset<GenomicSample> for GenomicDataset {
    fn get(&self, index: usize) -> Option<GenomicSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::matrix::{FeatureMatrix, TargetMatrix};

    #[test]
    fn test_rows_are_paired() {
        let x = FeatureMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let y = TargetMatrix::from_rows(vec![vec![10.0], vec![20.0]]).unwrap();
        let ds = GenomicDataset::from(&SampleSet::new(x, y).unwrap());

        assert_eq!(ds.len(), 2);
        assert_eq!(
            ds.get(1),
            Some(GenomicSample { features: vec![3.0, 4.0], targets: vec![20.0] })
        );
        assert!(ds.get(2).is_none());
    }
}
