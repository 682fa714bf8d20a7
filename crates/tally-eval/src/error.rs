//! Evaluation error types

use tally_matrix::MatrixError;
use thiserror::Error;

/// Result type for registry and evaluation operations
pub type EvalResult<T> = std::result::Result<T, EvalError>;

/// Errors raised while registering objects or evaluating formulas
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Empty or otherwise unusable argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An entry with this name exists and may not be replaced
    #[error("An object named '{0}' is already registered and cannot be overwritten")]
    DuplicateRegistration(String),

    /// Wrong number of arguments, or an arity change on re-registration
    #[error("Wrong number of arguments for {name}: expected {expected}, got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Callable cannot be expressed as a scalar `f64` function
    #[error("Unsupported callable: {0}")]
    UnsupportedCallable(String),

    /// Variable missing from the supplied bindings
    #[error("Variable '{0}' is not defined")]
    VariableNotDefined(String),

    /// No function registered under this name
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// No matrix registered under this name
    #[error("Unknown matrix: {0}")]
    UnknownMatrix(String),

    /// Malformed program or executor/AST mismatch
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Matrix runtime failure
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}
