// ============================================================
// Layer 4 — Table Loader
// ============================================================
// Loads the genotype (feature) table and the phenotype (target)
// table from two headerless text files:
//
//   features.txt   N lines × P marker values
//   targets.txt    N lines × M trait values
//
// The loader only reads: nothing on disk is created or modified.
// Row counts must match, otherwise a DataFormat error is returned
// before any model is built.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use std::{fs, path::Path, path::PathBuf};

use crate::data::table::{parse_table, Delimiter};
use crate::domain::error::{PipelineError, Result};
use crate::domain::matrix::{FeatureMatrix, SampleSet, TargetMatrix};
use crate::domain::traits::TableSource;

/// Loads a SampleSet from a feature file and a target file.
/// Implements the TableSource trait from Layer 3.
#[derive(Debug, Clone)]
pub struct TableLoader {
    features_path: PathBuf,
    targets_path:  PathBuf,
    delimiter:     Delimiter,
}

impl TableLoader {
    pub fn new(features_path: impl Into<PathBuf>, targets_path: impl Into<PathBuf>) -> Self {
        Self {
            features_path: features_path.into(),
            targets_path:  targets_path.into(),
            delimiter:     Delimiter::Whitespace,
        }
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl TableSource for TableLoader {
    fn load(&self) -> Result<SampleSet> {
        let features = read_features(&self.features_path, self.delimiter)?;
        let targets  = read_targets(&self.targets_path, self.delimiter)?;

        tracing::info!(
            "Loaded {} samples: {} markers, {} target columns",
            features.nrows(),
            features.ncols(),
            targets.ncols()
        );

        SampleSet::new(features, targets)
    }
}

/// Read a feature table on its own (used for prediction).
pub fn read_features(path: &Path, delimiter: Delimiter) -> Result<FeatureMatrix> {
    let rows = read_rows(path, delimiter, "features")?;
    FeatureMatrix::from_rows(rows)
}

pub fn read_targets(path: &Path, delimiter: Delimiter) -> Result<TargetMatrix> {
    let rows = read_rows(path, delimiter, "targets")?;
    TargetMatrix::from_rows(rows)
}

fn read_rows(path: &Path, delimiter: Delimiter, what: &str) -> Result<Vec<Vec<f32>>> {
    let text = fs::read_to_string(path).map_err(|e| {
        PipelineError::DataFormat(format!("cannot read {what} file '{}': {e}", path.display()))
    })?;
    let rows = parse_table(&text, delimiter, what)?;
    if rows.is_empty() {
        return Err(PipelineError::DataFormat(format!(
            "{what} file '{}' contains no rows",
            path.display()
        )));
    }
    tracing::debug!("Read {} rows from '{}'", rows.len(), path.display());
    Ok(rows)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_tmp(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "{contents}").unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn test_loads_matching_tables() {
        let x = write_tmp("0 1 2\n2 1 0\n1 1 1\n");
        let y = write_tmp("0.5\n-1.25\n3\n");
        let data = TableLoader::new(x.path(), y.path()).load().unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data.features().ncols(), 3);
        assert_eq!(data.targets().view()[[1, 0]], -1.25);
    }

    #[test]
    fn test_row_count_mismatch() {
        let x = write_tmp("0 1\n1 0\n");
        let y = write_tmp("1\n");
        let err = TableLoader::new(x.path(), y.path()).load().unwrap_err();
        assert!(matches!(err, PipelineError::DataFormat(_)));
    }

    #[test]
    fn test_non_numeric_target() {
        let x = write_tmp("0 1\n1 0\n");
        let y = write_tmp("1\ntall\n");
        let err = TableLoader::new(x.path(), y.path()).load().unwrap_err();
        assert!(matches!(err, PipelineError::DataFormat(_)));
    }

    #[test]
    fn test_comma_delimited() {
        let x = write_tmp("0,1\n1,0\n");
        let y = write_tmp("1\n0\n");
        let data = TableLoader::new(x.path(), y.path())
            .with_delimiter(Delimiter::Char(','))
            .load()
            .unwrap();
        assert_eq!(data.features().ncols(), 2);
    }

    #[test]
    fn test_missing_file() {
        let y = write_tmp("1\n");
        let err = TableLoader::new("/nonexistent/features.txt", y.path()).load().unwrap_err();
        assert!(matches!(err, PipelineError::DataFormat(_)));
    }
}
