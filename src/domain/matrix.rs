// ============================================================
// Layer 3 — Feature and Target Matrices
// ============================================================
// FeatureMatrix: N samples × P predictors (genetic markers)
// TargetMatrix:  N samples × M traits (or one-hot classes)
// SampleSet:     both together, with the N == N invariant enforced
// Split:         disjoint train/test row indices covering 0..N
//
// Both matrices are row-major ndarray arrays and are never mutated
// after construction: no &mut accessors are exposed, and selecting
// rows always produces a new matrix.
//
// Reference: ndarray crate documentation (Array2, Axis, select)

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, Result};

/// Builds a dense N×P array from parsed rows, rejecting ragged input.
fn rows_to_array(rows: Vec<Vec<f32>>, what: &str) -> Result<Array2<f32>> {
    let n_rows = rows.len();
    let n_cols = rows.first().map(Vec::len).unwrap_or(0);

    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_cols) {
        return Err(PipelineError::DataFormat(format!(
            "{what} row {} has {} columns, expected {}",
            i + 1,
            row.len(),
            n_cols
        )));
    }

    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| PipelineError::DataFormat(format!("{what}: {e}")))
}

// ─── FeatureMatrix ────────────────────────────────────────────────────────────
/// Dense numeric predictors, one row per sample.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix(Array2<f32>);

impl FeatureMatrix {
    pub fn new(values: Array2<f32>) -> Self {
        Self(values)
    }

    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        rows_to_array(rows, "feature").map(Self)
    }

    pub fn nrows(&self) -> usize {
        self.0.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.0.ncols()
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.0.view()
    }

    /// Copy of the given rows, in the given order
    pub fn select(&self, rows: &[usize]) -> Self {
        Self(self.0.select(Axis(0), rows))
    }
}

// ─── TargetMatrix ─────────────────────────────────────────────────────────────
/// Continuous traits, binary labels, or one-hot encoded classes.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetMatrix(Array2<f32>);

impl TargetMatrix {
    pub fn new(values: Array2<f32>) -> Self {
        Self(values)
    }

    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        rows_to_array(rows, "target").map(Self)
    }

    /// One-hot encode integer class labels into an N × `classes` matrix.
    pub fn one_hot(labels: &[usize], classes: usize) -> Result<Self> {
        let mut values = Array2::<f32>::zeros((labels.len(), classes));
        for (row, &label) in labels.iter().enumerate() {
            if label >= classes {
                return Err(PipelineError::DataFormat(format!(
                    "class label {label} in row {} is out of range for {classes} classes",
                    row + 1
                )));
            }
            values[[row, label]] = 1.0;
        }
        Ok(Self(values))
    }

    pub fn nrows(&self) -> usize {
        self.0.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.0.ncols()
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.0.view()
    }

    /// True when every value is exactly 0 or 1
    pub fn is_binary(&self) -> bool {
        self.0.iter().all(|&v| v == 0.0 || v == 1.0)
    }

    pub fn select(&self, rows: &[usize]) -> Self {
        Self(self.0.select(Axis(0), rows))
    }
}

// ─── SampleSet ────────────────────────────────────────────────────────────────
/// Features and targets for the same samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    features: FeatureMatrix,
    targets:  TargetMatrix,
}

impl SampleSet {
    /// Pair features with targets. Fails with `DataFormat` when the row
    /// counts differ.
    pub fn new(features: FeatureMatrix, targets: TargetMatrix) -> Result<Self> {
        if features.nrows() != targets.nrows() {
            return Err(PipelineError::DataFormat(format!(
                "feature table has {} rows but target table has {}",
                features.nrows(),
                targets.nrows()
            )));
        }
        Ok(Self { features, targets })
    }

    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    pub fn targets(&self) -> &TargetMatrix {
        &self.targets
    }

    pub fn select(&self, rows: &[usize]) -> Self {
        Self {
            features: self.features.select(rows),
            targets:  self.targets.select(rows),
        }
    }

    /// Materialise the (train, test) subsets described by `split`.
    pub fn partition(&self, split: &Split) -> (Self, Self) {
        (self.select(&split.train), self.select(&split.test))
    }
}

// ─── Split ────────────────────────────────────────────────────────────────────
/// Disjoint row indices whose union is `0..N`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub train: Vec<usize>,
    pub test:  Vec<usize>,
}

impl Split {
    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ragged_rows_rejected() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        let err = FeatureMatrix::from_rows(rows).unwrap_err();
        assert!(matches!(err, PipelineError::DataFormat(_)));
    }

    #[test]
    fn test_row_count_mismatch_rejected() {
        let x = FeatureMatrix::from_rows(vec![vec![0.0, 1.0]; 4]).unwrap();
        let y = TargetMatrix::from_rows(vec![vec![1.0]; 3]).unwrap();
        assert!(matches!(SampleSet::new(x, y), Err(PipelineError::DataFormat(_))));
    }

    #[test]
    fn test_one_hot() {
        let y = TargetMatrix::one_hot(&[0, 2, 1], 3).unwrap();
        assert_eq!(y.ncols(), 3);
        assert_eq!(y.view()[[1, 2]], 1.0);
        assert_eq!(y.view().row(0).sum(), 1.0);
        assert!(y.is_binary());
        assert!(TargetMatrix::one_hot(&[3], 3).is_err());
    }

    #[test]
    fn test_partition_leaves_source_untouched() {
        let x = FeatureMatrix::from_rows((0..5).map(|i| vec![i as f32]).collect()).unwrap();
        let y = TargetMatrix::from_rows((0..5).map(|i| vec![i as f32 * 10.0]).collect()).unwrap();
        let data = SampleSet::new(x, y).unwrap();
        let before = data.clone();

        let split = Split { train: vec![4, 0, 2], test: vec![1, 3] };
        let (train, test) = data.partition(&split);

        assert_eq!(train.len(), 3);
        assert_eq!(test.len(), 2);
        assert_eq!(train.features().view()[[0, 0]], 4.0);
        assert_eq!(test.targets().view()[[1, 0]], 30.0);
        assert_eq!(data, before);
    }
}
