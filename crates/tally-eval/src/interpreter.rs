//! Tree-walking interpreter
//!
//! Walks the AST on every call. Suited to formulas evaluated once or rarely;
//! see [`Compiler`](crate::compiler::Compiler) for repeated evaluation.

use crate::ast::{BinaryOperator, Operation, UnaryOperator};
use crate::context::Context;
use crate::error::EvalResult;
use crate::executor::{Executor, Formula};
use crate::registry::Registry;
use std::collections::HashMap;

/// Evaluate a formula against a context
pub fn evaluate(op: &Operation, ctx: &Context<'_>) -> EvalResult<f64> {
    match op {
        Operation::IntConstant(n) => Ok(*n as f64),
        Operation::FloatConstant(n) => Ok(*n),
        Operation::Variable(name) => ctx.variable(name),

        Operation::Add(l, r) => binary(BinaryOperator::Add, l, r, ctx),
        Operation::Sub(l, r) => binary(BinaryOperator::Subtract, l, r, ctx),
        Operation::Mul(l, r) => binary(BinaryOperator::Multiply, l, r, ctx),
        Operation::Div(l, r) => binary(BinaryOperator::Divide, l, r, ctx),
        Operation::Mod(l, r) => binary(BinaryOperator::Modulo, l, r, ctx),
        Operation::Pow(l, r) => binary(BinaryOperator::Power, l, r, ctx),
        Operation::UnaryMinus(arg) => Ok(UnaryOperator::Negate.apply(evaluate(arg, ctx)?)),

        Operation::LogicalNot(arg) => Ok(UnaryOperator::Not.apply(evaluate(arg, ctx)?)),
        Operation::And(l, r) => binary(BinaryOperator::And, l, r, ctx),
        Operation::Or(l, r) => binary(BinaryOperator::Or, l, r, ctx),

        Operation::Lt(l, r) => binary(BinaryOperator::LessThan, l, r, ctx),
        Operation::Le(l, r) => binary(BinaryOperator::LessEqual, l, r, ctx),
        Operation::Gt(l, r) => binary(BinaryOperator::GreaterThan, l, r, ctx),
        Operation::Ge(l, r) => binary(BinaryOperator::GreaterEqual, l, r, ctx),
        Operation::Eq(l, r) => binary(BinaryOperator::Equal, l, r, ctx),
        Operation::Ne(l, r) => binary(BinaryOperator::NotEqual, l, r, ctx),

        Operation::Call { name, args } => evaluate_call(name, args, ctx),
        Operation::MatrixAccess { name, args } => evaluate_matrix_access(name, args, ctx),
    }
}

/// Both operands are evaluated, left first, for every operator including
/// `And` and `Or`
fn binary(
    op: BinaryOperator,
    lhs: &Operation,
    rhs: &Operation,
    ctx: &Context<'_>,
) -> EvalResult<f64> {
    let l = evaluate(lhs, ctx)?;
    let r = evaluate(rhs, ctx)?;
    Ok(op.apply(l, r))
}

fn evaluate_call(name: &str, args: &[Operation], ctx: &Context<'_>) -> EvalResult<f64> {
    let info = ctx.registry().resolve_function(name, args.len())?;

    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(evaluate(arg, ctx)?);
    }

    Ok(info.function().call(&values))
}

fn evaluate_matrix_access(name: &str, args: &[Operation], ctx: &Context<'_>) -> EvalResult<f64> {
    let info = ctx.registry().resolve_matrix(name, args.len())?;

    // resolved arity is 1 or 2
    let mut indices = [0.0; 2];
    for (slot, arg) in indices.iter_mut().zip(args) {
        *slot = evaluate(arg, ctx)?;
    }

    info.index(&indices[..args.len()])
}

/// Executor that re-walks the tree on every evaluation
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpreter;

impl Interpreter {
    pub fn new() -> Self {
        Self
    }
}

impl Executor for Interpreter {
    fn evaluate(
        &self,
        op: &Operation,
        registry: &Registry,
        variables: &HashMap<String, f64>,
    ) -> EvalResult<f64> {
        evaluate(op, &Context::new(registry, variables))
    }

    fn build<'r>(&self, op: &Operation, registry: &'r Registry) -> EvalResult<Formula<'r>> {
        let op = op.clone();
        Ok(Box::new(move |variables: &HashMap<String, f64>| {
            evaluate(&op, &Context::new(registry, variables))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tally_matrix::MatrixError;

    fn eval(op: &Operation, reg: &Registry) -> EvalResult<f64> {
        evaluate(op, &Context::empty(reg))
    }

    fn matrix_registry() -> Registry {
        let mut reg = Registry::new();
        let values: Vec<f64> = (1..=9).map(f64::from).collect();
        reg.register_matrix("M", 3, 3, values.clone(), true).unwrap();
        reg.register_matrix("N", 3, 3, values, true).unwrap();
        reg
    }

    #[test]
    fn test_evaluate_constants() {
        let reg = Registry::new();
        assert_eq!(eval(&Operation::int(42), &reg).unwrap(), 42.0);
        assert_eq!(eval(&Operation::float(2.5), &reg).unwrap(), 2.5);
        assert_eq!(
            eval(&Operation::int(9_007_199_254_740_993), &reg).unwrap(),
            9_007_199_254_740_993_i64 as f64
        );
    }

    #[test]
    fn test_evaluate_arithmetic() {
        let reg = Registry::new();
        // (2 + 3) * 4 - 10 / 4
        let op = Operation::sub(
            Operation::mul(Operation::add(2i64.into(), 3i64.into()), 4i64.into()),
            Operation::div(10i64.into(), 4i64.into()),
        );
        assert_eq!(eval(&op, &reg).unwrap(), 17.5);
        assert_eq!(
            eval(&Operation::modulo(7i64.into(), 4i64.into()), &reg).unwrap(),
            3.0
        );
        assert_eq!(
            eval(&Operation::pow(2i64.into(), 0.5.into()), &reg).unwrap(),
            2f64.sqrt()
        );
        assert_eq!(eval(&Operation::negate(3i64.into()), &reg).unwrap(), -3.0);
    }

    #[test]
    fn test_evaluate_ieee() {
        let reg = Registry::new();
        assert_eq!(
            eval(&Operation::div(1i64.into(), 0i64.into()), &reg).unwrap(),
            f64::INFINITY
        );
        assert!(eval(&Operation::pow((-8.0).into(), (1.0 / 3.0).into()), &reg)
            .unwrap()
            .is_nan());
    }

    #[test]
    fn test_evaluate_logic() {
        let reg = Registry::new();
        assert_eq!(eval(&Operation::not(0i64.into()), &reg).unwrap(), 1.0);
        assert_eq!(eval(&Operation::not(0.1.into()), &reg).unwrap(), 0.0);
        assert_eq!(
            eval(&Operation::and(1i64.into(), 2i64.into()), &reg).unwrap(),
            1.0
        );
        assert_eq!(
            eval(&Operation::or(0i64.into(), 0i64.into()), &reg).unwrap(),
            0.0
        );
        assert_eq!(
            eval(&Operation::ge(2i64.into(), 2i64.into()), &reg).unwrap(),
            1.0
        );
        assert_eq!(
            eval(&Operation::not_equal(2i64.into(), 2i64.into()), &reg).unwrap(),
            0.0
        );
    }

    #[test]
    fn test_evaluate_variables() {
        let reg = Registry::new();
        let op = Operation::var("x");

        let empty = HashMap::new();
        assert_eq!(
            Interpreter.evaluate(&op, &reg, &empty).unwrap_err(),
            EvalError::VariableNotDefined("x".into())
        );

        let mut vars = HashMap::new();
        vars.insert("x".to_string(), 2.0);
        assert_eq!(Interpreter.evaluate(&op, &reg, &vars).unwrap(), 2.0);

        let mut upper = HashMap::new();
        upper.insert("X".to_string(), 3.0);
        assert_eq!(Interpreter.evaluate(&op, &reg, &upper).unwrap(), 3.0);
    }

    #[test]
    fn test_evaluate_call() {
        let mut reg = Registry::new();
        reg.register_function("Hyp", |a: f64, b: f64| a.hypot(b), true)
            .unwrap();
        let op = Operation::call("hyp", vec![3i64.into(), 4i64.into()]);
        assert_eq!(eval(&op, &reg).unwrap(), 5.0);
    }

    #[test]
    fn test_evaluate_call_errors() {
        let mut reg = Registry::new();
        reg.register_function("f", |a: f64| a, true).unwrap();
        reg.register_matrix("m", 1, 1, vec![1.0], true).unwrap();

        assert_eq!(
            eval(&Operation::call("f", vec![]), &reg).unwrap_err(),
            EvalError::ArityMismatch {
                name: "f".into(),
                expected: 1,
                actual: 0
            }
        );
        assert_eq!(
            eval(&Operation::call("nope", vec![]), &reg).unwrap_err(),
            EvalError::UnknownFunction("nope".into())
        );
        assert_eq!(
            eval(&Operation::call("m", vec![1i64.into()]), &reg).unwrap_err(),
            EvalError::UnknownFunction("m".into())
        );
    }

    #[test]
    fn test_arity_checked_before_arguments() {
        let mut reg = Registry::new();
        reg.register_function("f", |a: f64| a, true).unwrap();
        // the undefined variable is never reached
        let op = Operation::call("f", vec![Operation::var("a"), Operation::var("b")]);
        assert!(matches!(
            eval(&op, &reg),
            Err(EvalError::ArityMismatch { .. })
        ));
    }

    #[test]
    fn test_no_short_circuit() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut reg = Registry::new();
        let seen = Arc::clone(&counter);
        reg.register_function(
            "tick",
            move || {
                seen.fetch_add(1, Ordering::SeqCst);
                1.0
            },
            true,
        )
        .unwrap();

        let and = Operation::and(Operation::call("tick", vec![]), 0i64.into());
        assert_eq!(eval(&and, &reg).unwrap(), 0.0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        let or = Operation::or(1i64.into(), Operation::call("tick", vec![]));
        assert_eq!(eval(&or, &reg).unwrap(), 1.0);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_matrix_access() {
        let reg = matrix_registry();
        let m = |args: Vec<Operation>| Operation::matrix("M", args);

        assert_eq!(eval(&m(vec![2i64.into(), 3i64.into()]), &reg).unwrap(), 6.0);
        let sum = Operation::add(1i64.into(), 2i64.into());
        assert_eq!(eval(&m(vec![1i64.into(), sum]), &reg).unwrap(), 3.0);

        let both = Operation::add(
            m(vec![1i64.into(), 2i64.into()]),
            Operation::matrix("n", vec![2i64.into(), 2i64.into()]),
        );
        assert_eq!(eval(&both, &reg).unwrap(), 7.0);
    }

    #[test]
    fn test_matrix_access_variables_truncate() {
        let reg = matrix_registry();
        let op = Operation::matrix("m", vec![Operation::var("a"), Operation::var("b")]);

        let mut vars = HashMap::new();
        vars.insert("a".to_string(), 2.0);
        vars.insert("b".to_string(), 2.9);
        assert_eq!(Interpreter.evaluate(&op, &reg, &vars).unwrap(), 5.0);
    }

    #[test]
    fn test_matrix_access_vector() {
        let mut reg = Registry::new();
        reg.register_matrix("v", 3, 1, vec![10.0, 20.0, 30.0], true)
            .unwrap();
        let op = Operation::matrix("v", vec![2i64.into()]);
        assert_eq!(eval(&op, &reg).unwrap(), 20.0);

        let two = Operation::matrix("v", vec![2i64.into(), 1i64.into()]);
        assert!(matches!(
            eval(&two, &reg),
            Err(EvalError::ArityMismatch { expected: 1, actual: 2, .. })
        ));
    }

    #[test]
    fn test_matrix_access_errors() {
        let reg = matrix_registry();
        let out = Operation::matrix("m", vec![4i64.into(), 1i64.into()]);
        assert!(matches!(
            eval(&out, &reg),
            Err(EvalError::Matrix(MatrixError::IndexOutOfBounds { .. }))
        ));

        let zero = Operation::matrix("m", vec![0i64.into(), 1i64.into()]);
        assert!(eval(&zero, &reg).is_err());

        assert_eq!(
            eval(&Operation::matrix("q", vec![1i64.into()]), &reg).unwrap_err(),
            EvalError::UnknownMatrix("q".into())
        );
    }

    #[test]
    fn test_rebuild_after_registry_change() {
        let mut reg = Registry::new();
        reg.register_function("f", |x: f64| x + 1.0, true).unwrap();
        let op = Operation::call("f", vec![Operation::var("x")]);

        let mut vars = HashMap::new();
        vars.insert("x".to_string(), 1.0);
        {
            let formula = Interpreter.build(&op, &reg).unwrap();
            assert_eq!(formula(&vars).unwrap(), 2.0);
        }

        reg.register_function("f", |x: f64| x * 10.0, true).unwrap();
        let formula = Interpreter.build(&op, &reg).unwrap();
        assert_eq!(formula(&vars).unwrap(), 10.0);
    }
}
