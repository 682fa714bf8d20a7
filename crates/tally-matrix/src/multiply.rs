//! Matrix multiplication kernels
//!
//! [`multiply`] picks between the plain triple loop and a Strassen-style
//! block-recursive kernel:
//!
//! - largest dimension below [`NAIVE_THRESHOLD`], or either operand not
//!   square: naive
//! - both square with a power-of-two order: Strassen
//! - otherwise: naive

use crate::error::{MatrixError, Result};
use crate::matrix::Matrix;

/// Below this size the naive kernel always wins
pub const NAIVE_THRESHOLD: usize = 32;

/// Block size at which the Strassen recursion hands over to the naive kernel
pub const STRASSEN_LEAF: usize = 16;

fn check_dimensions(a: &Matrix, b: &Matrix) -> Result<()> {
    if a.cols() != b.rows() {
        return Err(MatrixError::dimensions(
            format!("{} rows in right operand", a.cols()),
            format!("{}x{}", b.rows(), b.cols()),
        ));
    }
    Ok(())
}

/// Whether [`multiply`] hands these operands to the Strassen kernel
pub(crate) fn uses_strassen(a: &Matrix, b: &Matrix) -> bool {
    let msize = a.rows().max(a.cols()).max(b.rows()).max(b.cols());
    msize >= NAIVE_THRESHOLD && a.is_square() && b.is_square() && msize.is_power_of_two()
}

/// Multiply `a * b`, dispatching to the cheapest kernel for the shapes
pub fn multiply(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    check_dimensions(a, b)?;

    if uses_strassen(a, b) {
        tracing::debug!(size = a.rows(), "using block-recursive multiply");
        return strassen_multiply(a, b);
    }
    naive_multiply(a, b)
}

/// Plain `O(n^3)` multiplication
pub fn naive_multiply(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    check_dimensions(a, b)?;
    let (n, m, p) = (a.rows(), a.cols(), b.cols());
    let mut out = vec![0.0; n * p];
    naive_kernel(a.as_slice(), b.as_slice(), &mut out, n, m, p);
    Ok(Matrix::from_parts(n, p, out))
}

/// Strassen multiplication for operands of any shape
///
/// Both operands are copied into zero-padded square blocks whose order is
/// the next power of two, the product is computed recursively, and the
/// `a.rows() x b.cols()` corner is returned.
pub fn strassen_multiply(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    strassen_multiply_with_leaf(a, b, STRASSEN_LEAF)
}

pub(crate) fn strassen_multiply_with_leaf(a: &Matrix, b: &Matrix, leaf: usize) -> Result<Matrix> {
    check_dimensions(a, b)?;
    let msize = a.rows().max(a.cols()).max(b.rows()).max(b.cols());
    let size = msize.max(1).next_power_of_two();

    let pa = padded(a, size);
    let pb = padded(b, size);
    let pc = strassen(&pa, &pb, size, leaf.max(1));

    let (rows, cols) = (a.rows(), b.cols());
    let mut out = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        out.extend_from_slice(&pc[i * size..i * size + cols]);
    }
    Ok(Matrix::from_parts(rows, cols, out))
}

/// `c += a * b` for row-major `n x m` and `m x p` inputs
fn naive_kernel(a: &[f64], b: &[f64], c: &mut [f64], n: usize, m: usize, p: usize) {
    for i in 0..n {
        for k in 0..m {
            let aik = a[i * m + k];
            for j in 0..p {
                c[i * p + j] += aik * b[k * p + j];
            }
        }
    }
}

/// Copy `m` into the top-left corner of a zeroed `size x size` block
fn padded(m: &Matrix, size: usize) -> Vec<f64> {
    let mut out = vec![0.0; size * size];
    let cols = m.cols();
    for i in 0..m.rows() {
        out[i * size..i * size + cols].copy_from_slice(&m.as_slice()[i * cols..(i + 1) * cols]);
    }
    out
}

/// Quadrant `(qr, qc)` of an `n x n` block
fn quadrant(m: &[f64], n: usize, qr: usize, qc: usize) -> Vec<f64> {
    let h = n / 2;
    let mut out = Vec::with_capacity(h * h);
    for i in 0..h {
        let start = (qr * h + i) * n + qc * h;
        out.extend_from_slice(&m[start..start + h]);
    }
    out
}

fn add(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

fn sub(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

fn strassen(a: &[f64], b: &[f64], n: usize, leaf: usize) -> Vec<f64> {
    if n <= leaf {
        let mut c = vec![0.0; n * n];
        naive_kernel(a, b, &mut c, n, n, n);
        return c;
    }

    let h = n / 2;
    let (a11, a12, a21, a22) = (
        quadrant(a, n, 0, 0),
        quadrant(a, n, 0, 1),
        quadrant(a, n, 1, 0),
        quadrant(a, n, 1, 1),
    );
    let (b11, b12, b21, b22) = (
        quadrant(b, n, 0, 0),
        quadrant(b, n, 0, 1),
        quadrant(b, n, 1, 0),
        quadrant(b, n, 1, 1),
    );

    let m1 = strassen(&add(&a11, &a22), &add(&b11, &b22), h, leaf);
    let m2 = strassen(&add(&a21, &a22), &b11, h, leaf);
    let m3 = strassen(&a11, &sub(&b12, &b22), h, leaf);
    let m4 = strassen(&a22, &sub(&b21, &b11), h, leaf);
    let m5 = strassen(&add(&a11, &a12), &b22, h, leaf);
    let m6 = strassen(&sub(&a21, &a11), &add(&b11, &b12), h, leaf);
    let m7 = strassen(&sub(&a12, &a22), &add(&b21, &b22), h, leaf);

    let mut c = vec![0.0; n * n];
    for i in 0..h {
        for j in 0..h {
            let k = i * h + j;
            c[i * n + j] = m1[k] + m4[k] - m5[k] + m7[k];
            c[i * n + j + h] = m3[k] + m5[k];
            c[(i + h) * n + j] = m2[k] + m4[k];
            c[(i + h) * n + j + h] = m1[k] - m2[k] + m3[k] + m6[k];
        }
    }
    c
}

impl Matrix {
    /// Matrix product `self * other`
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        multiply(self, other)
    }

    /// Integer power by repeated squaring
    ///
    /// `power(0)` is the identity and negative exponents go through the
    /// inverse.
    pub fn power(&self, exponent: i32) -> Result<Matrix> {
        if !self.is_square() {
            return Err(MatrixError::NotSquare {
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        match exponent {
            0 => return Ok(Matrix::identity(self.rows())),
            1 => return Ok(self.clone()),
            -1 => return self.invert(),
            _ => {}
        }

        let mut base = if exponent < 0 {
            self.invert()?
        } else {
            self.clone()
        };
        let mut e = exponent.unsigned_abs();
        let mut result = Matrix::identity(self.rows());
        while e != 0 {
            if e & 1 == 1 {
                result = multiply(&result, &base)?;
            }
            e >>= 1;
            if e != 0 {
                base = multiply(&base, &base)?;
            }
        }
        Ok(result)
    }
}
