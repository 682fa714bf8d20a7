//! # tally
//!
//! Formula evaluation over caller-supplied variables, registered scalar
//! functions and registered matrices.
//!
//! ## Features
//!
//! - Two interchangeable executors: a tree-walking interpreter and a
//!   bytecode compiler for formulas evaluated many times
//! - A name registry with arity and overwrite checks
//! - Dense matrices with cached LU factorization, solve, inverse,
//!   determinant and Strassen multiplication
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use tally::prelude::*;
//!
//! let mut registry = Registry::new();
//! let m: Matrix = "1 2 3\n4 5 6\n7 8 10".parse().unwrap();
//! registry.register_matrix_value("M", m.invert().unwrap(), true).unwrap();
//! registry.register_function("sq", |x: f64| x * x, true).unwrap();
//!
//! // sq(M(i, i)) > 0
//! let op = Operation::gt(
//!     Operation::call(
//!         "sq",
//!         vec![Operation::matrix("m", vec![Operation::var("i"), Operation::var("i")])],
//!     ),
//!     Operation::int(0),
//! );
//!
//! let formula = Compiler.build(&op, &registry).unwrap();
//! for i in 1..=3 {
//!     let mut vars = HashMap::new();
//!     vars.insert("i".to_string(), f64::from(i));
//!     assert_eq!(formula(&vars).unwrap(), 1.0);
//! }
//! ```

pub mod prelude;

pub use tally_eval::{
    ast, compiler, context, evaluate, executor, function, interpreter, registry, BinaryOperator,
    Compiler, Context, EvalError, EvalResult, Executor, Formula, FunctionInfo, Instr,
    IntoScalarFunction, Interpreter, MatrixInfo, NameCase, Operation, Program, Registry,
    RegistryEntry, ScalarFunction, UnaryOperator, MAX_ARITY,
};

pub use tally_matrix::{
    multiply, naive_multiply, strassen_multiply, LuFactors, Matrix, MatrixError,
};

/// Matrix runtime
pub mod matrix {
    pub use tally_matrix::*;
}
