//! Property tests: the interpreter and the compiled program agree on every
//! tree, including which error they report.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tally::prelude::*;

const VARIABLES: &[&str] = &["x", "y", "Z", "missing"];
const FUNCTIONS: &[&str] = &["neg", "add", "tick", "unknown", "m"];
const MATRICES: &[&str] = &["m", "row", "add", "nothing"];

fn registry(calls: Arc<AtomicUsize>) -> Registry {
    let mut registry = Registry::new();
    registry.register_function("neg", |a: f64| -a, true).unwrap();
    registry
        .register_function("add", |a: f64, b: f64| a + b, true)
        .unwrap();
    registry
        .register_function(
            "tick",
            move || calls.fetch_add(1, Ordering::SeqCst) as f64,
            true,
        )
        .unwrap();
    registry
        .register_matrix("M", 3, 3, (1..=9).map(f64::from).collect(), true)
        .unwrap();
    registry
        .register_matrix("row", 1, 4, vec![0.5, -1.0, 8.0, 2.0], true)
        .unwrap();
    registry
}

fn variables() -> HashMap<String, f64> {
    let mut vars = HashMap::new();
    vars.insert("x".to_string(), 2.0);
    vars.insert("Y".to_string(), -0.5);
    vars.insert("z".to_string(), 3.0);
    vars
}

fn leaf() -> impl Strategy<Value = Operation> {
    prop_oneof![
        (-4i64..5).prop_map(Operation::int),
        prop_oneof![
            (-10.0f64..10.0),
            Just(0.0),
            Just(f64::NAN),
            Just(f64::INFINITY)
        ]
        .prop_map(Operation::float),
        prop::sample::select(VARIABLES).prop_map(|name| Operation::var(name)),
        Just(Operation::call("tick", vec![])),
    ]
}

type Binary = fn(Operation, Operation) -> Operation;

const BINARY: &[Binary] = &[
    Operation::add,
    Operation::sub,
    Operation::mul,
    Operation::div,
    Operation::modulo,
    Operation::pow,
    Operation::and,
    Operation::or,
    Operation::lt,
    Operation::le,
    Operation::gt,
    Operation::ge,
    Operation::equal,
    Operation::not_equal,
];

fn operation() -> impl Strategy<Value = Operation> {
    leaf().prop_recursive(5, 48, 3, |inner| {
        prop_oneof![
            (prop::sample::select(BINARY), inner.clone(), inner.clone())
                .prop_map(|(build, a, b)| build(a, b)),
            inner.clone().prop_map(Operation::negate),
            inner.clone().prop_map(Operation::not),
            (
                prop::sample::select(FUNCTIONS),
                prop::collection::vec(inner.clone(), 0..3)
            )
                .prop_map(|(name, args)| Operation::call(name, args)),
            (
                prop::sample::select(MATRICES),
                prop::collection::vec(inner, 1..3)
            )
                .prop_map(|(name, args)| Operation::matrix(name, args)),
        ]
    })
}

fn same(a: &EvalResult<f64>, b: &EvalResult<f64>) -> bool {
    match (a, b) {
        (Ok(x), Ok(y)) => x.to_bits() == y.to_bits() || (x.is_nan() && y.is_nan()),
        (Err(x), Err(y)) => x == y,
        _ => false,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn prop_interpreter_matches_compiler(op in operation()) {
        let vars = variables();

        let interpreted_calls = Arc::new(AtomicUsize::new(0));
        let reg = registry(Arc::clone(&interpreted_calls));
        let interpreted = Interpreter.evaluate(&op, &reg, &vars);

        let compiled_calls = Arc::new(AtomicUsize::new(0));
        let reg = registry(Arc::clone(&compiled_calls));
        let compiled = Compiler.build(&op, &reg).and_then(|formula| formula(&vars));

        prop_assert!(
            same(&interpreted, &compiled),
            "{:?}: interpreter {:?}, compiler {:?}",
            op,
            interpreted,
            compiled
        );
        prop_assert_eq!(
            interpreted_calls.load(Ordering::SeqCst),
            compiled_calls.load(Ordering::SeqCst)
        );
    }

    #[test]
    fn prop_program_is_reusable(op in operation()) {
        let vars = variables();
        let program = Compiler.compile(&op).unwrap();
        prop_assert!(program.len() <= op.node_count() * 2);

        let first = program.run(&registry(Arc::new(AtomicUsize::new(0))), &vars);
        let second = program.run(&registry(Arc::new(AtomicUsize::new(0))), &vars);
        prop_assert!(same(&first, &second), "{:?} then {:?}", first, second);
    }
}
