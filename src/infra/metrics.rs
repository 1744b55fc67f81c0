// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Writes the per-epoch loss history to a CSV file.
//
// Output file: checkpoints/metrics.csv
//
//   epoch,train_loss,val_loss
//   1,0.912300,0.954100
//   2,0.701200,0.760300
//   ...
//
// val_loss is left empty when no validation split was configured.
// Each training run replaces the previous file.

use anyhow::{Context, Result};
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::domain::report::EpochMetrics;

const HEADER: &str = "epoch,train_loss,val_loss";

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;
        Ok(Self { csv_path: dir.join("metrics.csv") })
    }

    /// Replace the CSV with the given history.
    pub fn write_history(&self, history: &[EpochMetrics]) -> Result<()> {
        let file = fs::File::create(&self.csv_path)
            .with_context(|| format!("Cannot create '{}'", self.csv_path.display()))?;
        let mut out = BufWriter::new(file);

        writeln!(out, "{HEADER}")?;
        for m in history {
            writeln!(out, "{}", row(m))?;
        }
        out.flush()?;

        tracing::debug!("Wrote {} epochs to '{}'", history.len(), self.csv_path.display());
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

fn row(m: &EpochMetrics) -> String {
    let val = m.val_loss.map(|v| format!("{v:.6}")).unwrap_or_default();
    format!("{},{:.6},{}", m.epoch, m.train_loss, val)
}
