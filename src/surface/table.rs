//! Whitespace-delimited numeric tables (`surface*.plt`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::interp::Sample;
use crate::error::{KurticError, KurticResult};

/// Which 0-based columns hold x, y and z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSelection {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Default for ColumnSelection {
    fn default() -> Self {
        Self { x: 2, y: 3, z: 4 }
    }
}

impl ColumnSelection {
    fn max(&self) -> usize {
        self.x.max(self.y).max(self.z)
    }
}

#[derive(Debug, Clone)]
pub struct SampleTable {
    pub path: PathBuf,
    width: usize,
    rows: Vec<Vec<f64>>,
}

impl SampleTable {
    pub fn load(path: &Path) -> KurticResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| KurticError::io(path, e))?;
        Self::parse(path, &text)
    }

    /// Parses `text`; `path` is only used in error messages.
    pub fn parse(path: &Path, text: &str) -> KurticResult<Self> {
        let mut rows: Vec<Vec<f64>> = Vec::new();
        let mut width = 0;
        for (idx, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let parse_err = |message: String| KurticError::Parse {
                path: path.to_path_buf(),
                line: idx + 1,
                message,
            };
            let row = trimmed
                .split_whitespace()
                .map(|tok| {
                    tok.parse::<f64>()
                        .map_err(|_| parse_err(format!("'{tok}' is not a number")))
                })
                .collect::<KurticResult<Vec<f64>>>()?;
            if rows.is_empty() {
                width = row.len();
            } else if row.len() != width {
                return Err(parse_err(format!(
                    "expected {width} columns, found {}",
                    row.len()
                )));
            }
            rows.push(row);
        }
        Ok(Self {
            path: path.to_path_buf(),
            width,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// (x, y, z) triples for every row.
    pub fn samples(&self, columns: ColumnSelection) -> KurticResult<Vec<Sample>> {
        if !self.rows.is_empty() && columns.max() >= self.width {
            return Err(KurticError::MissingColumn {
                column: columns.max(),
                width: self.width,
            });
        }
        Ok(self
            .rows
            .iter()
            .map(|r| Sample::new(r[columns.x], r[columns.y], r[columns.z]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_and_comment_lines() {
        let text = "# k_m k_w s_m s_w n\n\n0 0 1.0 2.0 3.5\n  0 0 1.5 2.0 4.0  \n";
        let table = SampleTable::parse(Path::new("t.plt"), text).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.width(), 5);
        let samples = table.samples(ColumnSelection::default()).unwrap();
        assert_eq!(samples[1], Sample::new(1.5, 2.0, 4.0));
    }

    #[test]
    fn reports_line_of_bad_token() {
        let text = "1 2 3\n4 x 6\n";
        let err = SampleTable::parse(Path::new("bad.plt"), text).unwrap_err();
        match err {
            KurticError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_ragged_rows() {
        let text = "1 2 3\n\n4 5\n";
        let err = SampleTable::parse(Path::new("ragged.plt"), text).unwrap_err();
        assert!(matches!(err, KurticError::Parse { line: 3, .. }));
    }

    #[test]
    fn missing_column_is_an_error() {
        let table = SampleTable::parse(Path::new("narrow.plt"), "1 2 3\n").unwrap();
        let err = table.samples(ColumnSelection::default()).unwrap_err();
        assert!(matches!(
            err,
            KurticError::MissingColumn {
                column: 4,
                width: 3
            }
        ));
        let cols = ColumnSelection { x: 0, y: 1, z: 2 };
        assert_eq!(table.samples(cols).unwrap().len(), 1);
    }
}
