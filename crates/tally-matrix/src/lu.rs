//! LU factorization with partial pivoting, and everything built on it
//!
//! `PA = LU` where `L` is unit lower triangular, `U` upper triangular and `P`
//! the row permutation recorded while pivoting. The factors are cached on the
//! matrix the first time any of [`Matrix::factorize`], [`Matrix::solve`],
//! [`Matrix::invert`] or [`Matrix::determinant`] needs them.

use crate::error::{MatrixError, Result};
use crate::matrix::Matrix;

/// Cached factors of a square matrix
#[derive(Debug, Clone, PartialEq)]
pub struct LuFactors {
    n: usize,
    lower: Vec<f64>,
    upper: Vec<f64>,
    permutation: Vec<usize>,
    sign: f64,
}

impl LuFactors {
    fn compute(m: &Matrix) -> Result<Self> {
        if !m.is_square() {
            return Err(MatrixError::NotSquare {
                rows: m.rows(),
                cols: m.cols(),
            });
        }

        let n = m.rows();
        let mut lower = Matrix::identity(n).into_vec();
        let mut upper = m.data().to_vec();
        let mut permutation: Vec<usize> = (0..n).collect();
        let mut sign = 1.0;

        for k in 0..n {
            // row with the largest pivot candidate
            let mut p = 0.0;
            let mut k0 = k;
            for i in k..n {
                let v = upper[i * n + k].abs();
                if v > p {
                    p = v;
                    k0 = i;
                }
            }
            if p == 0.0 {
                return Err(MatrixError::Singular);
            }

            if k0 != k {
                permutation.swap(k, k0);
                for i in 0..k {
                    lower.swap(k * n + i, k0 * n + i);
                }
                for j in 0..n {
                    upper.swap(k * n + j, k0 * n + j);
                }
                sign = -sign;
            }

            for i in k + 1..n {
                let factor = upper[i * n + k] / upper[k * n + k];
                lower[i * n + k] = factor;
                for j in k..n {
                    upper[i * n + j] -= factor * upper[k * n + j];
                }
            }
        }

        tracing::trace!(n, sign, "computed LU factorization");

        Ok(Self {
            n,
            lower,
            upper,
            permutation,
            sign,
        })
    }

    /// Order of the factorized matrix
    pub fn size(&self) -> usize {
        self.n
    }

    /// Unit lower triangular factor
    pub fn lower(&self) -> Matrix {
        Matrix::from_parts(self.n, self.n, self.lower.clone())
    }

    /// Upper triangular factor
    pub fn upper(&self) -> Matrix {
        Matrix::from_parts(self.n, self.n, self.upper.clone())
    }

    /// Row `i` of `PA` is row `permutation()[i]` of `A`
    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    /// Sign of the permutation, `1.0` or `-1.0`
    pub fn sign(&self) -> f64 {
        self.sign
    }

    /// Solve `Ax = b` for one right-hand side
    fn solve_column(&self, b: &[f64]) -> Vec<f64> {
        let n = self.n;

        // forward substitution on L with the permuted right-hand side
        let mut z = vec![0.0; n];
        for i in 0..n {
            let mut acc = b[self.permutation[i]];
            for j in 0..i {
                acc -= self.lower[i * n + j] * z[j];
            }
            z[i] = acc / self.lower[i * n + i];
        }

        // back substitution on U
        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut acc = z[i];
            for j in i + 1..n {
                acc -= self.upper[i * n + j] * x[j];
            }
            x[i] = acc / self.upper[i * n + i];
        }
        x
    }
}

impl Matrix {
    /// LU-factorize this matrix, caching the result
    ///
    /// Fails with [`MatrixError::NotSquare`] for rectangular input and
    /// [`MatrixError::Singular`] when a pivot column is all zeros.
    pub fn factorize(&self) -> Result<&LuFactors> {
        self.lu.get_or_try_init(|| LuFactors::compute(self))
    }

    /// Unit lower triangular factor `L`
    pub fn lower(&self) -> Result<Matrix> {
        Ok(self.factorize()?.lower())
    }

    /// Upper triangular factor `U`
    pub fn upper(&self) -> Result<Matrix> {
        Ok(self.factorize()?.upper())
    }

    /// Permutation matrix `P` with `PA = LU`
    pub fn permutation_matrix(&self) -> Result<Matrix> {
        let lu = self.factorize()?;
        let n = lu.size();
        let mut p = vec![0.0; n * n];
        for (i, &src) in lu.permutation().iter().enumerate() {
            p[i * n + src] = 1.0;
        }
        Matrix::from_vec(n, n, p)
    }

    /// Solve `AX = B`; each column of `b` is an independent right-hand side
    pub fn solve(&self, b: &Matrix) -> Result<Matrix> {
        if !self.is_square() {
            return Err(MatrixError::NotSquare {
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        if b.rows() != self.rows() {
            return Err(MatrixError::dimensions(
                format!("{} rows in right-hand side", self.rows()),
                format!("{} rows", b.rows()),
            ));
        }
        let lu = self.factorize()?;

        let mut x = Matrix::zeros(b.rows(), b.cols());
        for k in 0..b.cols() {
            let rhs = b.column(k)?;
            let col = Matrix::from_vec(b.rows(), 1, lu.solve_column(rhs.as_slice()))?;
            x.set_column(k, &col)?;
        }
        Ok(x)
    }

    /// Solve `Ax = b` for a plain vector
    pub fn solve_vector(&self, b: &[f64]) -> Result<Vec<f64>> {
        let rhs = Matrix::from_vec(b.len(), 1, b.to_vec())?;
        Ok(self.solve(&rhs)?.into_vec())
    }

    /// Inverse, assembled column by column from the standard basis
    pub fn invert(&self) -> Result<Matrix> {
        let n = self.factorize()?.size();
        let mut inv = Matrix::zeros(n, n);
        for i in 0..n {
            let mut e = Matrix::zeros(n, 1);
            e.set(i, 0, 1.0)?;
            let col = self.solve(&e)?;
            inv.set_column(i, &col)?;
        }
        Ok(inv)
    }

    /// Determinant: product of `U`'s diagonal times the permutation sign
    pub fn determinant(&self) -> Result<f64> {
        let lu = self.factorize()?;
        let n = lu.size();
        Ok((0..n).fold(lu.sign(), |det, i| det * lu.upper[i * n + i]))
    }
}
