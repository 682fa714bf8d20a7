//! # tally-eval
//!
//! Formula evaluation for tally.
//!
//! This crate provides:
//! - The formula AST ([`Operation`])
//! - A registry binding names to scalar functions and matrices
//! - A tree-walking [`Interpreter`]
//! - A bytecode [`Compiler`] producing reusable [`Program`]s
//!
//! Both executors implement [`Executor`] and give identical results.
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use tally_eval::{Compiler, Executor, Interpreter, Operation, Registry};
//!
//! let mut registry = Registry::new();
//! registry.register_function("max", |a: f64, b: f64| a.max(b), true).unwrap();
//! registry.register_matrix("M", 2, 2, vec![1.0, 2.0, 3.0, 4.0], true).unwrap();
//!
//! // max(x, M(2, 1))
//! let op = Operation::call(
//!     "MAX",
//!     vec![
//!         Operation::var("x"),
//!         Operation::matrix("m", vec![Operation::int(2), Operation::int(1)]),
//!     ],
//! );
//!
//! let mut vars = HashMap::new();
//! vars.insert("x".to_string(), 1.5);
//!
//! let once = Interpreter.evaluate(&op, &registry, &vars).unwrap();
//! let formula = Compiler.build(&op, &registry).unwrap();
//! assert_eq!(once, 3.0);
//! assert_eq!(formula(&vars).unwrap(), once);
//! ```

pub mod ast;
pub mod compiler;
pub mod context;
pub mod error;
pub mod executor;
pub mod function;
pub mod interpreter;
pub mod registry;

pub use ast::{BinaryOperator, Operation, UnaryOperator};
pub use compiler::{Compiler, Instr, Program};
pub use context::Context;
pub use error::{EvalError, EvalResult};
pub use executor::{Executor, Formula};
pub use function::{IntoScalarFunction, ScalarFunction, MAX_ARITY};
pub use interpreter::{evaluate, Interpreter};
pub use registry::{FunctionInfo, MatrixInfo, NameCase, Registry, RegistryEntry};
