//! Dense row-major matrix value type

use crate::error::{MatrixError, Result};
use crate::lu::LuFactors;
use once_cell::sync::OnceCell;
use rand::Rng;
use std::fmt;

/// Dense `rows x cols` matrix of `f64` stored row-major.
///
/// Zero-based accessors (`get`, `set`) address the storage directly; the
/// one-based accessors (`get_one_based`, `get_flat_one_based`) are the ones
/// formulas go through.
///
/// The LU factorization is computed on first use and cached. Every method
/// that changes the values takes `&mut self` and drops the cache.
#[derive(Clone)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
    pub(crate) lu: OnceCell<LuFactors>,
}

impl Matrix {
    /// Create a zero-filled matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
            lu: OnceCell::new(),
        }
    }

    /// Create an `n x n` identity matrix
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        m
    }

    /// Create a matrix from row-major values
    ///
    /// Fails with [`MatrixError::DimensionMismatch`] unless
    /// `data.len() == rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(MatrixError::dimensions(
                format!("{} values for {}x{}", rows * cols, rows, cols),
                format!("{} values", data.len()),
            ));
        }
        Ok(Self {
            rows,
            cols,
            data,
            lu: OnceCell::new(),
        })
    }

    /// Create a matrix from row slices
    pub fn from_rows(rows: &[&[f64]]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(MatrixError::dimensions(
                    format!("{} columns", cols),
                    format!("{} columns in row {}", row.len(), i + 1),
                ));
            }
            data.extend_from_slice(row);
        }
        Self::from_vec(rows.len(), cols, data)
    }

    /// Random integer-valued matrix with entries in `[-dispersion, dispersion)`
    pub fn random(rows: usize, cols: usize, dispersion: u32) -> Self {
        Self::random_with(&mut rand::thread_rng(), rows, cols, dispersion)
    }

    /// Same as [`Matrix::random`] with a caller-supplied generator
    pub fn random_with<R: Rng>(
        rng: &mut R,
        rows: usize,
        cols: usize,
        dispersion: u32,
    ) -> Self {
        let mut m = Self::zeros(rows, cols);
        if dispersion == 0 {
            return m;
        }
        let d = i64::from(dispersion);
        for v in &mut m.data {
            *v = rng.gen_range(-d..d) as f64;
        }
        m
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Check if the matrix is square
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Row-major storage
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Consume the matrix, returning its row-major storage
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Whether the LU factorization is currently cached
    pub fn is_factorized(&self) -> bool {
        self.lu.get().is_some()
    }

    /// Zero-based element access
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// One-based `(row, col)` access
    pub fn get_one_based(&self, row: i32, col: i32) -> Result<f64> {
        let r = one_based_to_index(row, self.rows);
        let c = one_based_to_index(col, self.cols);
        match (r, c) {
            (Some(r), Some(c)) => Ok(self.data[r * self.cols + c]),
            _ => Err(self.out_of_bounds(format!("({}, {})", row, col))),
        }
    }

    /// One-based access into the flattened row-major storage
    pub fn get_flat_one_based(&self, index: i32) -> Result<f64> {
        one_based_to_index(index, self.data.len())
            .map(|i| self.data[i])
            .ok_or_else(|| self.out_of_bounds(index.to_string()))
    }

    /// Zero-based element assignment
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(self.out_of_bounds(format!("[{}, {}]", row, col)));
        }
        self.invalidate();
        self.data[row * self.cols + col] = value;
        Ok(())
    }

    /// Replace all values, keeping the shape
    pub fn set_values(&mut self, values: Vec<f64>) -> Result<()> {
        if values.len() != self.data.len() {
            return Err(MatrixError::dimensions(
                format!("{} values", self.data.len()),
                format!("{} values", values.len()),
            ));
        }
        self.invalidate();
        self.data = values;
        Ok(())
    }

    /// Copy of column `k` (zero-based) as a `rows x 1` matrix
    pub fn column(&self, k: usize) -> Result<Matrix> {
        if k >= self.cols {
            return Err(self.out_of_bounds(format!("column {}", k)));
        }
        let data = (0..self.rows)
            .map(|i| self.data[i * self.cols + k])
            .collect();
        Matrix::from_vec(self.rows, 1, data)
    }

    /// Overwrite column `k` (zero-based) with the first column of `v`
    pub fn set_column(&mut self, k: usize, v: &Matrix) -> Result<()> {
        if k >= self.cols {
            return Err(self.out_of_bounds(format!("column {}", k)));
        }
        if v.rows != self.rows || v.cols == 0 {
            return Err(MatrixError::dimensions(
                format!("{}x1", self.rows),
                format!("{}x{}", v.rows, v.cols),
            ));
        }
        self.invalidate();
        for i in 0..self.rows {
            self.data[i * self.cols + k] = v.data[i * v.cols];
        }
        Ok(())
    }

    /// Transposed copy
    pub fn transpose(&self) -> Matrix {
        let mut t = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                t.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        t
    }

    /// Reduced row echelon form (Gauss-Jordan), leaving `self` untouched
    pub fn reduced_row_echelon(&self) -> Matrix {
        let (rows, cols) = (self.rows, self.cols);
        let mut m = self.data.clone();
        let mut lead = 0;

        'rows: for r in 0..rows {
            if lead >= cols {
                break;
            }
            let mut i = r;
            while m[i * cols + lead] == 0.0 {
                i += 1;
                if i == rows {
                    i = r;
                    lead += 1;
                    if lead == cols {
                        break 'rows;
                    }
                }
            }
            for j in 0..cols {
                m.swap(r * cols + j, i * cols + j);
            }
            let div = m[r * cols + lead];
            for j in 0..cols {
                m[r * cols + j] /= div;
            }
            for j in 0..rows {
                if j != r {
                    let sub = m[j * cols + lead];
                    for k in 0..cols {
                        m[j * cols + k] -= sub * m[r * cols + k];
                    }
                }
            }
            lead += 1;
        }

        Matrix::from_parts(rows, cols, m)
    }

    /// Caller guarantees `data.len() == rows * cols`
    pub(crate) fn from_parts(rows: usize, cols: usize, data: Vec<f64>) -> Matrix {
        debug_assert_eq!(data.len(), rows * cols);
        Matrix {
            rows,
            cols,
            data,
            lu: OnceCell::new(),
        }
    }

    pub(crate) fn data(&self) -> &[f64] {
        &self.data
    }

    fn invalidate(&mut self) {
        self.lu.take();
    }

    fn out_of_bounds(&self, index: String) -> MatrixError {
        MatrixError::IndexOutOfBounds {
            index,
            rows: self.rows,
            cols: self.cols,
        }
    }
}

/// Map a one-based position onto zero-based storage of length `len`
fn one_based_to_index(pos: i32, len: usize) -> Option<usize> {
    let idx = usize::try_from(pos).ok()?.checked_sub(1)?;
    (idx < len).then_some(idx)
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.data == other.data
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("data", &self.data)
            .field("factorized", &self.is_factorized())
            .finish()
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            for j in 0..self.cols {
                write!(f, "{:>9.2e} ", self.data[i * self.cols + j])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample() -> Matrix {
        Matrix::from_vec(3, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]).unwrap()
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0]).is_err());
        assert!(Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).is_ok());
    }

    #[test]
    fn test_from_rows() {
        let m = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]]).unwrap();
        assert_eq!(m.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
        assert!(Matrix::from_rows(&[&[1.0, 2.0], &[3.0]]).is_err());
    }

    #[test]
    fn test_one_based_access() {
        let m = sample();
        assert_eq!(m.get_one_based(2, 3).unwrap(), 6.0);
        assert_eq!(m.get_one_based(1, 3).unwrap(), 3.0);
        assert_eq!(m.get_flat_one_based(5).unwrap(), 5.0);
        assert_eq!(m.get(2, 0), Some(7.0));
    }

    #[test]
    fn test_one_based_out_of_bounds() {
        let m = sample();
        assert!(matches!(
            m.get_one_based(0, 1),
            Err(MatrixError::IndexOutOfBounds { .. })
        ));
        assert!(m.get_one_based(4, 1).is_err());
        assert!(m.get_one_based(1, -1).is_err());
        assert!(m.get_flat_one_based(10).is_err());
        assert_eq!(m.get(3, 0), None);
    }

    #[test]
    fn test_columns() {
        let mut m = sample();
        assert_eq!(m.column(1).unwrap().as_slice(), &[2.0, 5.0, 8.0]);

        let v = Matrix::from_vec(3, 1, vec![0.0, -1.0, -2.0]).unwrap();
        m.set_column(0, &v).unwrap();
        assert_eq!(m.as_slice(), &[0.0, 2.0, 3.0, -1.0, 5.0, 6.0, -2.0, 8.0, 9.0]);
        assert!(m.column(3).is_err());
    }

    #[test]
    fn test_transpose() {
        let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let t = m.transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_reduced_row_echelon() {
        let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 2.0, 4.0, 7.0]).unwrap();
        let r = m.reduced_row_echelon();
        assert_eq!(r.as_slice(), &[1.0, 2.0, 0.0, 0.0, 0.0, 1.0]);
        // source untouched
        assert_eq!(m.get(1, 2), Some(7.0));
    }

    #[test]
    fn test_reduced_row_echelon_zero_matrix() {
        let m = Matrix::zeros(2, 2);
        assert_eq!(m.reduced_row_echelon(), m);
    }

    #[test]
    fn test_random_is_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let m = Matrix::random_with(&mut rng, 4, 5, 3);
        assert_eq!(m.shape(), (4, 5));
        assert!(m.as_slice().iter().all(|v| (-3.0..3.0).contains(v)));
        assert!(m.as_slice().iter().all(|v| v.fract() == 0.0));
        assert_eq!(Matrix::random(2, 2, 0), Matrix::zeros(2, 2));
    }

    #[test]
    fn test_mutation_drops_cache() {
        let mut m = Matrix::identity(3);
        m.factorize().unwrap();
        assert!(m.is_factorized());
        m.set(0, 0, 2.0).unwrap();
        assert!(!m.is_factorized());
    }

    #[test]
    fn test_display() {
        let m = Matrix::identity(2);
        let text = m.to_string();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("1.00e0"));
    }
}
