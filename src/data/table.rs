// ============================================================
// Layer 4 — Numeric Tables
// ============================================================
// Headerless numeric tables: one sample per line, one value per
// column. Columns are separated by runs of whitespace by default or
// by a single delimiter character. Blank lines are ignored.

use std::io::Write;

use ndarray::ArrayView2;

use crate::domain::error::{PipelineError, Result};

/// Column separator convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    #[default]
    Whitespace,
    Char(char),
}

/// Parse `text` into rows of finite f32 values.
///
/// `what` names the table in error messages ("features", "targets").
pub fn parse_table(text: &str, delimiter: Delimiter, what: &str) -> Result<Vec<Vec<f32>>> {
    let mut rows: Vec<Vec<f32>> = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let cells: Vec<&str> = match delimiter {
            Delimiter::Whitespace => line.split_whitespace().collect(),
            Delimiter::Char(c)    => line.split(c).map(str::trim).collect(),
        };

        let mut row = Vec::with_capacity(cells.len());
        for (col, cell) in cells.iter().enumerate() {
            let value: f32 = cell.parse().map_err(|_| {
                PipelineError::DataFormat(format!(
                    "{what} line {}, column {}: '{cell}' is not a number",
                    line_no + 1,
                    col + 1
                ))
            })?;
            if !value.is_finite() {
                return Err(PipelineError::DataFormat(format!(
                    "{what} line {}, column {}: value '{cell}' is not finite",
                    line_no + 1,
                    col + 1
                )));
            }
            row.push(value);
        }

        if let Some(first) = rows.first() {
            if first.len() != row.len() {
                return Err(PipelineError::DataFormat(format!(
                    "{what} line {} has {} columns, expected {}",
                    line_no + 1,
                    row.len(),
                    first.len()
                )));
            }
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Write a matrix as a whitespace-delimited table, one row per line.
pub fn write_table<W: Write>(mut out: W, values: ArrayView2<'_, f32>) -> Result<()> {
    for row in values.rows() {
        let line: Vec<String> = row.iter().map(|v| format!("{v:.6}")).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    out.flush()?;
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_whitespace_table() {
        let rows = parse_table("0 1  2\n\n1\t1 0\n", Delimiter::Whitespace, "features").unwrap();
        assert_eq!(rows, vec![vec![0.0, 1.0, 2.0], vec![1.0, 1.0, 0.0]]);
    }

    #[test]
    fn test_char_delimiter() {
        let rows = parse_table("0.5, 1\n2 ,3\n", Delimiter::Char(','), "targets").unwrap();
        assert_eq!(rows, vec![vec![0.5, 1.0], vec![2.0, 3.0]]);
    }

    #[test]
    fn test_non_numeric_cell() {
        let err = parse_table("0 1\n0 NA\n", Delimiter::Whitespace, "features").unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, PipelineError::DataFormat(_)));
        assert!(msg.contains("line 2") && msg.contains("'NA'"), "{msg}");
    }

    #[test]
    fn test_nan_rejected() {
        assert!(parse_table("1 NaN\n", Delimiter::Whitespace, "features").is_err());
    }

    #[test]
    fn test_ragged_rows() {
        let err = parse_table("1 2 3\n4 5\n", Delimiter::Whitespace, "features").unwrap_err();
        assert!(matches!(err, PipelineError::DataFormat(_)));
    }

    #[test]
    fn test_write_table() {
        let mut buf = Vec::new();
        write_table(&mut buf, array![[1.0f32, 0.5], [2.0, -1.0]].view()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "1.000000 0.500000\n2.000000 -1.000000\n");
    }
}
