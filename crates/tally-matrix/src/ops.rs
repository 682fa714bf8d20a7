//! Arithmetic operators on matrices
//!
//! All operators are pure: they read their operands and return a new matrix.
//! Shape-checked operators (`+`, `-` and matrix `*`) yield `Result<Matrix>`.

use crate::error::{MatrixError, Result};
use crate::matrix::Matrix;
use crate::multiply::multiply;
use std::ops::{Add, Mul, Neg, Sub};

impl Matrix {
    /// Element-wise sum
    pub fn checked_add(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_with(other, |a, b| a + b)
    }

    /// Element-wise difference
    pub fn checked_sub(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_with(other, |a, b| a - b)
    }

    /// Multiply every element by `n`
    pub fn scale(&self, n: f64) -> Matrix {
        Matrix::from_parts(
            self.rows(),
            self.cols(),
            self.as_slice().iter().map(|v| v * n).collect(),
        )
    }

    fn zip_with(&self, other: &Matrix, f: impl Fn(f64, f64) -> f64) -> Result<Matrix> {
        if self.shape() != other.shape() {
            return Err(MatrixError::dimensions(
                format!("{}x{}", self.rows(), self.cols()),
                format!("{}x{}", other.rows(), other.cols()),
            ));
        }
        let data = self
            .as_slice()
            .iter()
            .zip(other.as_slice())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(Matrix::from_parts(self.rows(), self.cols(), data))
    }
}

impl Neg for &Matrix {
    type Output = Matrix;

    fn neg(self) -> Matrix {
        self.scale(-1.0)
    }
}

impl Neg for Matrix {
    type Output = Matrix;

    fn neg(self) -> Matrix {
        self.scale(-1.0)
    }
}

impl Add for &Matrix {
    type Output = Result<Matrix>;

    fn add(self, rhs: &Matrix) -> Result<Matrix> {
        self.checked_add(rhs)
    }
}

impl Sub for &Matrix {
    type Output = Result<Matrix>;

    fn sub(self, rhs: &Matrix) -> Result<Matrix> {
        self.checked_sub(rhs)
    }
}

impl Mul for &Matrix {
    type Output = Result<Matrix>;

    fn mul(self, rhs: &Matrix) -> Result<Matrix> {
        multiply(self, rhs)
    }
}

impl Mul<f64> for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: f64) -> Matrix {
        self.scale(rhs)
    }
}

impl Mul<&Matrix> for f64 {
    type Output = Matrix;

    fn mul(self, rhs: &Matrix) -> Matrix {
        rhs.scale(self)
    }
}
