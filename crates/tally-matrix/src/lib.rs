//! # tally-matrix
//!
//! Dense matrix runtime backing the matrix-valued objects of the tally
//! formula engine.
//!
//! This crate provides:
//! - [`Matrix`] - row-major `f64` matrix with zero- and one-based accessors
//! - LU factorization with partial pivoting, cached per matrix
//! - Linear solves, inversion and determinants on top of the factorization
//! - Naive and Strassen-style block-recursive multiplication
//! - Parsing from whitespace-separated text
//!
//! ## Example
//!
//! ```rust
//! use tally_matrix::Matrix;
//!
//! let a: Matrix = "4 3\n6 3".parse().unwrap();
//! let inv = a.invert().unwrap();
//! let product = a.multiply(&inv).unwrap();
//!
//! assert!((a.determinant().unwrap() + 6.0).abs() < 1e-12);
//! assert!((product.get(0, 0).unwrap() - 1.0).abs() < 1e-12);
//! ```

pub mod error;
pub mod lu;
pub mod matrix;
pub mod multiply;
pub mod ops;
pub mod parse;

pub use error::{MatrixError, Result};
pub use lu::LuFactors;
pub use matrix::Matrix;
pub use multiply::{multiply, naive_multiply, strassen_multiply};
