//! Matrix text parsing
//!
//! Rows are separated by line breaks, cells by spaces:
//!
//! ```text
//! 1 2 3
//! 4 5 6
//! ```
//!
//! Runs of spaces or tabs, spaces around line breaks, `\r\n` line endings and
//! leading/trailing blank lines are tolerated.

use crate::error::{MatrixError, Result};
use crate::matrix::Matrix;
use std::str::FromStr;

/// Collapse whitespace so that rows are `\n`-separated and cells single-space separated
pub fn normalize(text: &str) -> String {
    let lines: Vec<String> = text
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();

    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);
    lines[start..end].join("\n")
}

impl Matrix {
    /// Parse a matrix from its text form
    pub fn parse(text: &str) -> Result<Matrix> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Err(MatrixError::Parse("empty input".into()));
        }

        let mut rows = 0;
        let mut cols = 0;
        let mut data = Vec::new();
        for (i, line) in normalized.split('\n').enumerate() {
            if line.is_empty() {
                return Err(MatrixError::Parse(format!("row {} is empty", i + 1)));
            }
            let before = data.len();
            for cell in line.split(' ') {
                let value = cell
                    .parse::<f64>()
                    .map_err(|_| MatrixError::Parse(format!("invalid number '{}'", cell)))?;
                data.push(value);
            }
            let width = data.len() - before;
            if i == 0 {
                cols = width;
            } else if width != cols {
                return Err(MatrixError::Parse(format!(
                    "row {} has {} cells, expected {}",
                    i + 1,
                    width,
                    cols
                )));
            }
            rows += 1;
        }

        Matrix::from_vec(rows, cols, data)
    }
}

impl FromStr for Matrix {
    type Err = MatrixError;

    fn from_str(s: &str) -> Result<Self> {
        Matrix::parse(s)
    }
}
