//! Bytecode and the stack machine that runs it

use crate::ast::{BinaryOperator, UnaryOperator};
use crate::context::Context;
use crate::error::{EvalError, EvalResult};
use crate::registry::{FunctionInfo, MatrixInfo, Registry};
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;

/// One stack machine instruction
///
/// Name operands index the program's name table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instr {
    /// Push a constant
    Const(f64),
    /// Push the value of a variable
    Load(usize),
    /// Replace the top value with the operator applied to it
    Unary(UnaryOperator),
    /// Pop rhs then lhs, push the result
    Binary(BinaryOperator),
    /// Look up a function and check it takes `argc` arguments
    ResolveFunction { name: usize, argc: usize },
    /// Look up a matrix and check it takes `argc` indices
    ResolveMatrix { name: usize, argc: usize },
    /// Call the most recently resolved function on the top `argc` values
    Call { argc: usize },
    /// Index the most recently resolved matrix with the top `argc` values
    Index { argc: usize },
}

/// Registry entry resolved ahead of its arguments
enum Callee<'r> {
    Function(&'r FunctionInfo),
    Matrix(&'r MatrixInfo),
}

/// A compiled formula
///
/// Programs own their instructions and names and hold no reference to a
/// registry; [`Program::run`] resolves names against whichever registry it
/// is given.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    code: Vec<Instr>,
    names: Vec<String>,
    max_stack: usize,
    max_callees: usize,
}

fn malformed(message: impl Into<String>) -> EvalError {
    EvalError::UnsupportedOperation(message.into())
}

impl Program {
    /// Validate stack discipline and name references, sizing both stacks
    pub(crate) fn new(code: Vec<Instr>, names: Vec<String>) -> EvalResult<Self> {
        let mut depth = 0usize;
        let mut callees = 0usize;
        let mut max_stack = 0usize;
        let mut max_callees = 0usize;

        for (pc, instr) in code.iter().enumerate() {
            let (pops, pushes) = match *instr {
                Instr::Const(_) => (0, 1),
                Instr::Load(name) => {
                    check_name(&names, name, pc)?;
                    (0, 1)
                }
                Instr::Unary(_) => (1, 1),
                Instr::Binary(_) => (2, 1),
                Instr::ResolveFunction { name, .. } | Instr::ResolveMatrix { name, .. } => {
                    check_name(&names, name, pc)?;
                    callees += 1;
                    max_callees = max_callees.max(callees);
                    (0, 0)
                }
                Instr::Call { argc } | Instr::Index { argc } => {
                    callees = callees
                        .checked_sub(1)
                        .ok_or_else(|| malformed(format!("nothing resolved at {}", pc)))?;
                    (argc, 1)
                }
            };
            depth = depth
                .checked_sub(pops)
                .ok_or_else(|| malformed(format!("stack underflow at {}", pc)))?
                + pushes;
            max_stack = max_stack.max(depth);
        }

        if depth != 1 || callees != 0 {
            return Err(malformed("program must leave exactly one value"));
        }

        Ok(Self {
            code,
            names,
            max_stack,
            max_callees,
        })
    }

    pub fn instructions(&self) -> &[Instr] {
        &self.code
    }

    /// Names referenced by `Load` and resolve instructions
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Deepest value stack any run needs
    pub fn max_stack(&self) -> usize {
        self.max_stack
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Run against `registry` with the given variable bindings
    pub fn run<S: BuildHasher>(
        &self,
        registry: &Registry,
        variables: &HashMap<String, f64, S>,
    ) -> EvalResult<f64> {
        self.execute(&Context::new(registry, variables))
    }

    /// Run against a prepared context
    pub fn execute(&self, ctx: &Context<'_>) -> EvalResult<f64> {
        let registry = ctx.registry();
        let mut stack: Vec<f64> = Vec::with_capacity(self.max_stack);
        let mut callees: Vec<Callee<'_>> = Vec::with_capacity(self.max_callees);

        for instr in &self.code {
            match *instr {
                Instr::Const(v) => stack.push(v),
                Instr::Load(name) => stack.push(ctx.variable(self.name(name)?)?),
                Instr::Unary(op) => {
                    let a = pop(&mut stack)?;
                    stack.push(op.apply(a));
                }
                Instr::Binary(op) => {
                    let b = pop(&mut stack)?;
                    let a = pop(&mut stack)?;
                    stack.push(op.apply(a, b));
                }
                Instr::ResolveFunction { name, argc } => {
                    let info = registry.resolve_function(self.name(name)?, argc)?;
                    callees.push(Callee::Function(info));
                }
                Instr::ResolveMatrix { name, argc } => {
                    let info = registry.resolve_matrix(self.name(name)?, argc)?;
                    callees.push(Callee::Matrix(info));
                }
                Instr::Call { argc } => {
                    let base = args_base(&stack, argc)?;
                    let value = match callees.pop() {
                        Some(Callee::Function(info)) => info.function().call(&stack[base..]),
                        _ => return Err(malformed("call without a resolved function")),
                    };
                    stack.truncate(base);
                    stack.push(value);
                }
                Instr::Index { argc } => {
                    let base = args_base(&stack, argc)?;
                    let value = match callees.pop() {
                        Some(Callee::Matrix(info)) => info.index(&stack[base..])?,
                        _ => return Err(malformed("index without a resolved matrix")),
                    };
                    stack.truncate(base);
                    stack.push(value);
                }
            }
        }

        match (stack.pop(), stack.is_empty()) {
            (Some(value), true) => Ok(value),
            _ => Err(malformed("program did not leave exactly one value")),
        }
    }

    fn name(&self, index: usize) -> EvalResult<&str> {
        self.names
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| malformed(format!("name #{} out of range", index)))
    }
}

fn check_name(names: &[String], index: usize, pc: usize) -> EvalResult<()> {
    if index < names.len() {
        Ok(())
    } else {
        Err(malformed(format!("name #{} out of range at {}", index, pc)))
    }
}

fn pop(stack: &mut Vec<f64>) -> EvalResult<f64> {
    stack.pop().ok_or_else(|| malformed("stack underflow"))
}

fn args_base(stack: &[f64], argc: usize) -> EvalResult<usize> {
    stack
        .len()
        .checked_sub(argc)
        .ok_or_else(|| malformed("stack underflow"))
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |i: usize| self.names.get(i).map_or("?", String::as_str);
        for (pc, instr) in self.code.iter().enumerate() {
            write!(f, "{:04}  ", pc)?;
            match *instr {
                Instr::Const(v) => writeln!(f, "const    {}", v)?,
                Instr::Load(i) => writeln!(f, "load     {}", name(i))?,
                Instr::Unary(op) => writeln!(f, "{}", op.mnemonic())?,
                Instr::Binary(op) => writeln!(f, "{}", op.mnemonic())?,
                Instr::ResolveFunction { name: i, argc } => {
                    writeln!(f, "func     {}/{}", name(i), argc)?
                }
                Instr::ResolveMatrix { name: i, argc } => {
                    writeln!(f, "matrix   {}/{}", name(i), argc)?
                }
                Instr::Call { argc } => writeln!(f, "call     {}", argc)?,
                Instr::Index { argc } => writeln!(f, "index    {}", argc)?,
            }
        }
        Ok(())
    }
}
