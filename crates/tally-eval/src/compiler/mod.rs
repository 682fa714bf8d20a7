//! Bytecode compiler
//!
//! Lowers an [`Operation`] tree once into a flat [`Program`] for a small
//! stack machine, so repeated evaluation skips the per-node dispatch of the
//! tree walk. Operands are emitted left to right and every operand of every
//! operator is evaluated, which keeps the compiled form observably identical
//! to the [`Interpreter`](crate::interpreter::Interpreter).
//!
//! Subtrees made only of constants are folded while emitting, using the same
//! operator implementations the machine would run.
//!
//! ```rust
//! use std::collections::HashMap;
//! use tally_eval::{Compiler, Operation, Registry};
//!
//! let mut registry = Registry::new();
//! registry.register_function("sq", |x: f64| x * x, true).unwrap();
//!
//! // sq(x) + 1
//! let op = Operation::add(
//!     Operation::call("sq", vec![Operation::var("x")]),
//!     Operation::int(1),
//! );
//! let program = Compiler::new().compile(&op).unwrap();
//!
//! let mut vars = HashMap::new();
//! vars.insert("x".to_string(), 3.0);
//! assert_eq!(program.run(&registry, &vars).unwrap(), 10.0);
//! ```

mod program;

pub use program::{Instr, Program};

use crate::ast::{BinaryOperator, Operation, UnaryOperator};
use crate::error::EvalResult;
use crate::executor::{Executor, Formula};
use crate::registry::Registry;
use ahash::AHashMap;
use std::collections::HashMap;

/// Executor that compiles to bytecode
#[derive(Debug, Clone, Copy, Default)]
pub struct Compiler;

impl Compiler {
    pub fn new() -> Self {
        Self
    }

    /// Lower `op` into a registry-independent program
    pub fn compile(&self, op: &Operation) -> EvalResult<Program> {
        let mut emitter = Emitter::default();
        emitter.emit(op);
        let program = Program::new(emitter.code, emitter.names)?;
        tracing::trace!(
            instructions = program.len(),
            max_stack = program.max_stack(),
            "compiled formula"
        );
        Ok(program)
    }
}

impl Executor for Compiler {
    fn evaluate(
        &self,
        op: &Operation,
        registry: &Registry,
        variables: &HashMap<String, f64>,
    ) -> EvalResult<f64> {
        self.compile(op)?.run(registry, variables)
    }

    fn build<'r>(&self, op: &Operation, registry: &'r Registry) -> EvalResult<Formula<'r>> {
        let program = self.compile(op)?;
        Ok(Box::new(move |variables: &HashMap<String, f64>| {
            program.run(registry, variables)
        }))
    }
}

#[derive(Default)]
struct Emitter {
    code: Vec<Instr>,
    names: Vec<String>,
    interned: AHashMap<String, usize>,
}

impl Emitter {
    fn emit(&mut self, op: &Operation) {
        match op {
            Operation::IntConstant(n) => self.code.push(Instr::Const(*n as f64)),
            Operation::FloatConstant(n) => self.code.push(Instr::Const(*n)),
            Operation::Variable(name) => {
                let index = self.intern(name);
                self.code.push(Instr::Load(index));
            }

            Operation::Add(l, r) => self.binary(BinaryOperator::Add, l, r),
            Operation::Sub(l, r) => self.binary(BinaryOperator::Subtract, l, r),
            Operation::Mul(l, r) => self.binary(BinaryOperator::Multiply, l, r),
            Operation::Div(l, r) => self.binary(BinaryOperator::Divide, l, r),
            Operation::Mod(l, r) => self.binary(BinaryOperator::Modulo, l, r),
            Operation::Pow(l, r) => self.binary(BinaryOperator::Power, l, r),
            Operation::UnaryMinus(arg) => self.unary(UnaryOperator::Negate, arg),

            Operation::LogicalNot(arg) => self.unary(UnaryOperator::Not, arg),
            Operation::And(l, r) => self.binary(BinaryOperator::And, l, r),
            Operation::Or(l, r) => self.binary(BinaryOperator::Or, l, r),

            Operation::Lt(l, r) => self.binary(BinaryOperator::LessThan, l, r),
            Operation::Le(l, r) => self.binary(BinaryOperator::LessEqual, l, r),
            Operation::Gt(l, r) => self.binary(BinaryOperator::GreaterThan, l, r),
            Operation::Ge(l, r) => self.binary(BinaryOperator::GreaterEqual, l, r),
            Operation::Eq(l, r) => self.binary(BinaryOperator::Equal, l, r),
            Operation::Ne(l, r) => self.binary(BinaryOperator::NotEqual, l, r),

            Operation::Call { name, args } => {
                let name = self.intern(name);
                let argc = args.len();
                self.code.push(Instr::ResolveFunction { name, argc });
                args.iter().for_each(|arg| self.emit(arg));
                self.code.push(Instr::Call { argc });
            }
            Operation::MatrixAccess { name, args } => {
                let name = self.intern(name);
                let argc = args.len();
                self.code.push(Instr::ResolveMatrix { name, argc });
                args.iter().for_each(|arg| self.emit(arg));
                self.code.push(Instr::Index { argc });
            }
        }
    }

    fn unary(&mut self, op: UnaryOperator, arg: &Operation) {
        self.emit(arg);
        if let Some(Instr::Const(a)) = self.code.last_mut() {
            *a = op.apply(*a);
            return;
        }
        self.code.push(Instr::Unary(op));
    }

    fn binary(&mut self, op: BinaryOperator, lhs: &Operation, rhs: &Operation) {
        self.emit(lhs);
        self.emit(rhs);
        if let [.., Instr::Const(a), Instr::Const(b)] = self.code[..] {
            self.code.truncate(self.code.len() - 2);
            self.code.push(Instr::Const(op.apply(a, b)));
            return;
        }
        self.code.push(Instr::Binary(op));
    }

    fn intern(&mut self, name: &str) -> usize {
        if let Some(&index) = self.interned.get(name) {
            return index;
        }
        let index = self.names.len();
        self.names.push(name.to_string());
        self.interned.insert(name.to_string(), index);
        index
    }
}
