//! Formula Abstract Syntax Tree types
//!
//! Trees are produced by an external parser and are read-only to both
//! executors.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operation {
    // === Literals ===
    /// Integer literal
    IntConstant(i64),
    /// Floating point literal
    FloatConstant(f64),

    // === References ===
    /// Variable bound by the caller at evaluation time
    Variable(String),

    // === Arithmetic ===
    Add(Box<Operation>, Box<Operation>),
    Sub(Box<Operation>, Box<Operation>),
    Mul(Box<Operation>, Box<Operation>),
    Div(Box<Operation>, Box<Operation>),
    Mod(Box<Operation>, Box<Operation>),
    Pow(Box<Operation>, Box<Operation>),
    UnaryMinus(Box<Operation>),

    // === Logical ===
    LogicalNot(Box<Operation>),
    And(Box<Operation>, Box<Operation>),
    Or(Box<Operation>, Box<Operation>),

    // === Comparison ===
    Lt(Box<Operation>, Box<Operation>),
    Le(Box<Operation>, Box<Operation>),
    Gt(Box<Operation>, Box<Operation>),
    Ge(Box<Operation>, Box<Operation>),
    Eq(Box<Operation>, Box<Operation>),
    Ne(Box<Operation>, Box<Operation>),

    // === Registry lookups ===
    /// Call of a registered function
    Call { name: String, args: Vec<Operation> },
    /// Element access on a registered matrix
    MatrixAccess { name: String, args: Vec<Operation> },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,

    // Comparison
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Equal,
    NotEqual,

    // Logical
    And,
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Not,
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

impl BinaryOperator {
    /// Apply the operator to two evaluated operands
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinaryOperator::Add => lhs + rhs,
            BinaryOperator::Subtract => lhs - rhs,
            BinaryOperator::Multiply => lhs * rhs,
            BinaryOperator::Divide => lhs / rhs,
            BinaryOperator::Modulo => lhs % rhs,
            BinaryOperator::Power => lhs.powf(rhs),
            BinaryOperator::LessThan => flag(lhs < rhs),
            BinaryOperator::LessEqual => flag(lhs <= rhs),
            BinaryOperator::GreaterThan => flag(lhs > rhs),
            BinaryOperator::GreaterEqual => flag(lhs >= rhs),
            BinaryOperator::Equal => flag(lhs == rhs),
            BinaryOperator::NotEqual => flag(lhs != rhs),
            BinaryOperator::And => flag(lhs != 0.0 && rhs != 0.0),
            BinaryOperator::Or => flag(lhs != 0.0 || rhs != 0.0),
        }
    }

    /// Mnemonic used in program listings
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinaryOperator::Add => "add",
            BinaryOperator::Subtract => "sub",
            BinaryOperator::Multiply => "mul",
            BinaryOperator::Divide => "div",
            BinaryOperator::Modulo => "mod",
            BinaryOperator::Power => "pow",
            BinaryOperator::LessThan => "lt",
            BinaryOperator::LessEqual => "le",
            BinaryOperator::GreaterThan => "gt",
            BinaryOperator::GreaterEqual => "ge",
            BinaryOperator::Equal => "eq",
            BinaryOperator::NotEqual => "ne",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        }
    }
}

impl UnaryOperator {
    /// Apply the operator to an evaluated operand
    pub fn apply(self, arg: f64) -> f64 {
        match self {
            UnaryOperator::Negate => -arg,
            UnaryOperator::Not => flag(arg == 0.0),
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            UnaryOperator::Negate => "neg",
            UnaryOperator::Not => "not",
        }
    }
}

impl Operation {
    pub fn int(value: i64) -> Self {
        Operation::IntConstant(value)
    }

    pub fn float(value: f64) -> Self {
        Operation::FloatConstant(value)
    }

    pub fn var(name: impl Into<String>) -> Self {
        Operation::Variable(name.into())
    }

    pub fn add(lhs: Operation, rhs: Operation) -> Self {
        Operation::Add(Box::new(lhs), Box::new(rhs))
    }

    pub fn sub(lhs: Operation, rhs: Operation) -> Self {
        Operation::Sub(Box::new(lhs), Box::new(rhs))
    }

    pub fn mul(lhs: Operation, rhs: Operation) -> Self {
        Operation::Mul(Box::new(lhs), Box::new(rhs))
    }

    pub fn div(lhs: Operation, rhs: Operation) -> Self {
        Operation::Div(Box::new(lhs), Box::new(rhs))
    }

    pub fn modulo(lhs: Operation, rhs: Operation) -> Self {
        Operation::Mod(Box::new(lhs), Box::new(rhs))
    }

    pub fn pow(lhs: Operation, rhs: Operation) -> Self {
        Operation::Pow(Box::new(lhs), Box::new(rhs))
    }

    pub fn negate(arg: Operation) -> Self {
        Operation::UnaryMinus(Box::new(arg))
    }

    pub fn not(arg: Operation) -> Self {
        Operation::LogicalNot(Box::new(arg))
    }

    pub fn and(lhs: Operation, rhs: Operation) -> Self {
        Operation::And(Box::new(lhs), Box::new(rhs))
    }

    pub fn or(lhs: Operation, rhs: Operation) -> Self {
        Operation::Or(Box::new(lhs), Box::new(rhs))
    }

    pub fn lt(lhs: Operation, rhs: Operation) -> Self {
        Operation::Lt(Box::new(lhs), Box::new(rhs))
    }

    pub fn le(lhs: Operation, rhs: Operation) -> Self {
        Operation::Le(Box::new(lhs), Box::new(rhs))
    }

    pub fn gt(lhs: Operation, rhs: Operation) -> Self {
        Operation::Gt(Box::new(lhs), Box::new(rhs))
    }

    pub fn ge(lhs: Operation, rhs: Operation) -> Self {
        Operation::Ge(Box::new(lhs), Box::new(rhs))
    }

    pub fn equal(lhs: Operation, rhs: Operation) -> Self {
        Operation::Eq(Box::new(lhs), Box::new(rhs))
    }

    pub fn not_equal(lhs: Operation, rhs: Operation) -> Self {
        Operation::Ne(Box::new(lhs), Box::new(rhs))
    }

    pub fn call(name: impl Into<String>, args: Vec<Operation>) -> Self {
        Operation::Call {
            name: name.into(),
            args,
        }
    }

    pub fn matrix(name: impl Into<String>, args: Vec<Operation>) -> Self {
        Operation::MatrixAccess {
            name: name.into(),
            args,
        }
    }

    /// Split a binary node into its operator and operands
    pub fn as_binary(&self) -> Option<(BinaryOperator, &Operation, &Operation)> {
        let (op, lhs, rhs) = match self {
            Operation::Add(l, r) => (BinaryOperator::Add, l, r),
            Operation::Sub(l, r) => (BinaryOperator::Subtract, l, r),
            Operation::Mul(l, r) => (BinaryOperator::Multiply, l, r),
            Operation::Div(l, r) => (BinaryOperator::Divide, l, r),
            Operation::Mod(l, r) => (BinaryOperator::Modulo, l, r),
            Operation::Pow(l, r) => (BinaryOperator::Power, l, r),
            Operation::Lt(l, r) => (BinaryOperator::LessThan, l, r),
            Operation::Le(l, r) => (BinaryOperator::LessEqual, l, r),
            Operation::Gt(l, r) => (BinaryOperator::GreaterThan, l, r),
            Operation::Ge(l, r) => (BinaryOperator::GreaterEqual, l, r),
            Operation::Eq(l, r) => (BinaryOperator::Equal, l, r),
            Operation::Ne(l, r) => (BinaryOperator::NotEqual, l, r),
            Operation::And(l, r) => (BinaryOperator::And, l, r),
            Operation::Or(l, r) => (BinaryOperator::Or, l, r),
            _ => return None,
        };
        Some((op, lhs.as_ref(), rhs.as_ref()))
    }

    /// Direct children in evaluation order
    pub fn children(&self) -> Vec<&Operation> {
        match self {
            Operation::IntConstant(_) | Operation::FloatConstant(_) | Operation::Variable(_) => {
                Vec::new()
            }
            Operation::UnaryMinus(arg) | Operation::LogicalNot(arg) => vec![arg.as_ref()],
            Operation::Call { args, .. } | Operation::MatrixAccess { args, .. } => {
                args.iter().collect()
            }
            other => match other.as_binary() {
                Some((_, lhs, rhs)) => vec![lhs, rhs],
                None => Vec::new(),
            },
        }
    }

    /// Total number of nodes in the tree
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(Operation::node_count)
            .sum::<usize>()
    }

    /// Length of the longest root-to-leaf path; a leaf has depth 1
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(Operation::depth)
            .max()
            .unwrap_or(0)
    }
}

impl From<i64> for Operation {
    fn from(value: i64) -> Self {
        Operation::IntConstant(value)
    }
}

impl From<f64> for Operation {
    fn from(value: f64) -> Self {
        Operation::FloatConstant(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_constructors() {
        let op = Operation::add(Operation::var("x"), 2i64.into());
        assert_eq!(
            op,
            Operation::Add(
                Box::new(Operation::Variable("x".into())),
                Box::new(Operation::IntConstant(2))
            )
        );
    }

    #[test]
    fn test_node_count_and_depth() {
        // f(x, 1 + 2) * -y
        let op = Operation::mul(
            Operation::call(
                "f",
                vec![
                    Operation::var("x"),
                    Operation::add(Operation::int(1), Operation::int(2)),
                ],
            ),
            Operation::negate(Operation::var("y")),
        );
        assert_eq!(op.node_count(), 8);
        assert_eq!(op.depth(), 4);
        assert_eq!(Operation::float(1.5).depth(), 1);
        assert_eq!(Operation::call("h", vec![]).node_count(), 1);
    }

    #[test]
    fn test_binary_apply() {
        assert_eq!(BinaryOperator::Modulo.apply(7.0, 3.0), 1.0);
        assert_eq!(BinaryOperator::Modulo.apply(-7.0, 3.0), -1.0);
        assert_eq!(BinaryOperator::Power.apply(2.0, 10.0), 1024.0);
        assert_eq!(BinaryOperator::LessEqual.apply(2.0, 2.0), 1.0);
        assert_eq!(BinaryOperator::And.apply(2.0, 0.0), 0.0);
        assert_eq!(BinaryOperator::Or.apply(0.0, -3.0), 1.0);
    }

    #[test]
    fn test_nan_comparisons() {
        let nan = f64::NAN;
        for op in [
            BinaryOperator::LessThan,
            BinaryOperator::LessEqual,
            BinaryOperator::GreaterThan,
            BinaryOperator::GreaterEqual,
            BinaryOperator::Equal,
        ] {
            assert_eq!(op.apply(nan, 1.0), 0.0, "{:?}", op);
        }
        assert_eq!(BinaryOperator::NotEqual.apply(nan, nan), 1.0);
    }

    #[test]
    fn test_unary_apply() {
        assert_eq!(UnaryOperator::Negate.apply(3.0), -3.0);
        assert_eq!(UnaryOperator::Not.apply(0.0), 1.0);
        assert_eq!(UnaryOperator::Not.apply(-0.5), 0.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_shape() {
        fn assert_serde<T: Serialize + for<'de> Deserialize<'de>>() {}
        assert_serde::<Operation>();
    }
}
