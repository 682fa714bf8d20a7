//! Executor contract shared by the interpreter and the compiler

use crate::ast::Operation;
use crate::error::EvalResult;
use crate::registry::Registry;
use std::collections::HashMap;

/// A formula prepared for repeated evaluation against one registry
///
/// Bindings are taken as a `HashMap` with the default hasher. Callers holding
/// another map type can go through [`Program::run`](crate::compiler::Program::run),
/// which accepts any `BuildHasher`.
pub type Formula<'r> = Box<dyn Fn(&HashMap<String, f64>) -> EvalResult<f64> + Send + Sync + 'r>;

/// Strategy for turning an [`Operation`] tree into a number
///
/// Implementations must agree: for any tree, registry and bindings,
/// `evaluate` and the formula returned by `build` produce the same value or
/// the same error, with registered functions invoked in the same order.
pub trait Executor {
    /// Evaluate `op` once
    fn evaluate(
        &self,
        op: &Operation,
        registry: &Registry,
        variables: &HashMap<String, f64>,
    ) -> EvalResult<f64>;

    /// Evaluate `op` once with no variables bound
    fn evaluate_without_variables(&self, op: &Operation, registry: &Registry) -> EvalResult<f64> {
        self.evaluate(op, registry, &HashMap::new())
    }

    /// Prepare `op` for repeated evaluation
    ///
    /// Names are resolved against `registry` on every call of the returned
    /// formula, not while building it. The formula borrows `registry`, so it
    /// cannot outlive a later mutation; to keep one compiled form across
    /// registry changes use [`Compiler::compile`](crate::compiler::Compiler::compile)
    /// and [`Program::run`](crate::compiler::Program::run).
    fn build<'r>(&self, op: &Operation, registry: &'r Registry) -> EvalResult<Formula<'r>>;
}
