//! Error types for tally-matrix

use thiserror::Error;

/// Result type alias using [`MatrixError`]
pub type Result<T> = std::result::Result<T, MatrixError>;

/// Errors that can occur in the matrix runtime
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixError {
    /// Operation requires a square matrix
    #[error("Matrix is not square ({rows}x{cols})")]
    NotSquare { rows: usize, cols: usize },

    /// A pivot column is entirely zero
    #[error("Matrix is singular")]
    Singular,

    /// Operand shapes do not line up
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// Matrix text could not be parsed
    #[error("Matrix parse error: {0}")]
    Parse(String),

    /// Element position outside the matrix storage
    #[error("Index {index} out of bounds for {rows}x{cols} matrix")]
    IndexOutOfBounds {
        index: String,
        rows: usize,
        cols: usize,
    },
}

impl MatrixError {
    pub(crate) fn dimensions(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        MatrixError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
