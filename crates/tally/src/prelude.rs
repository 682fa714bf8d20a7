//! Prelude module - common imports for tally users
//!
//! ```rust
//! use tally::prelude::*;
//! ```

pub use crate::{
    // Errors
    EvalError,
    EvalResult,
    // Executors
    Compiler,
    Executor,
    Formula,
    Interpreter,
    Program,
    // Matrices
    Matrix,
    MatrixError,
    // AST
    Operation,
    // Registry
    NameCase,
    Registry,
};
