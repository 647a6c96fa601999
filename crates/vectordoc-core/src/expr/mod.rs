//! Expression language shared by the query builder and `DocQL`.
//!
//! An [`Expr`] is the surface-independent syntax tree. Before a scan starts
//! it is compiled against an [`OperatorRegistry`] and the query parameters
//! into a [`CompiledExpr`], which is what runs per document.
//!
//! Evaluation is three-valued: an expression yields `Some(value)` or `None`
//! (*undefined*), e.g. when a field is missing or a vector operator cannot
//! read its field. Predicates only match on `Some(Value::Bool(true))`.

mod compile;
mod operator;
mod vector_ops;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;
use crate::vector::Vector;

pub use compile::{CompileContext, CompiledExpr};
pub use operator::{NamedOperator, OperatorRegistry};
pub use vector_ops::{DimensionOperator, DistanceOperator, NearOperator};

/// Query parameters bound to `$name` placeholders.
pub type Params = HashMap<String, Value>;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    /// Equal (=)
    Eq,
    /// Not equal (!= or <>)
    NotEq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
}

impl CompareOp {
    /// SQL token for this operator.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

/// An expression in a filter, sort key or projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Constant value.
    Literal(Value),
    /// Dot-separated field path, resolved per document.
    Field(String),
    /// `$name` placeholder, resolved once per query.
    Parameter(String),
    /// Function call dispatched through the operator registry.
    Call {
        /// Function name as written.
        name: String,
        /// Arguments.
        args: Vec<Expr>,
    },
    /// Binary comparison.
    Compare {
        /// Operator.
        op: CompareOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Logical AND.
    And(Box<Expr>, Box<Expr>),
    /// Logical OR.
    Or(Box<Expr>, Box<Expr>),
    /// Logical NOT.
    Not(Box<Expr>),
    /// `IS NULL` / `IS NOT NULL`; undefined counts as null.
    IsNull {
        /// Tested expression.
        expr: Box<Expr>,
        /// True for `IS NOT NULL`.
        negated: bool,
    },
    /// Unary minus.
    Neg(Box<Expr>),
}

impl Expr {
    /// Field reference.
    #[must_use]
    pub fn field(path: impl Into<String>) -> Self {
        Self::Field(path.into())
    }

    /// Literal value.
    #[must_use]
    pub fn lit(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Parameter placeholder.
    #[must_use]
    pub fn param(name: impl Into<String>) -> Self {
        Self::Parameter(name.into())
    }

    /// Function call.
    #[must_use]
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Call {
            name: name.into(),
            args,
        }
    }

    /// `DISTANCE(field, target)` using the database default metric.
    #[must_use]
    pub fn distance(field: impl Into<String>, target: impl Into<Expr>) -> Self {
        Self::call("DISTANCE", vec![Self::field(field), target.into()])
    }

    fn compare(self, op: CompareOp, other: impl Into<Expr>) -> Self {
        Self::Compare {
            op,
            left: Box::new(self),
            right: Box::new(other.into()),
        }
    }

    /// `self = other`
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn eq(self, other: impl Into<Expr>) -> Self {
        self.compare(CompareOp::Eq, other)
    }

    /// `self != other`
    #[must_use]
    pub fn not_eq(self, other: impl Into<Expr>) -> Self {
        self.compare(CompareOp::NotEq, other)
    }

    /// `self > other`
    #[must_use]
    pub fn gt(self, other: impl Into<Expr>) -> Self {
        self.compare(CompareOp::Gt, other)
    }

    /// `self >= other`
    #[must_use]
    pub fn gte(self, other: impl Into<Expr>) -> Self {
        self.compare(CompareOp::Gte, other)
    }

    /// `self < other`
    #[must_use]
    pub fn lt(self, other: impl Into<Expr>) -> Self {
        self.compare(CompareOp::Lt, other)
    }

    /// `self <= other`
    #[must_use]
    pub fn lte(self, other: impl Into<Expr>) -> Self {
        self.compare(CompareOp::Lte, other)
    }

    /// `self AND other`
    #[must_use]
    pub fn and(self, other: Expr) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// `self OR other`
    #[must_use]
    pub fn or(self, other: Expr) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// `NOT self`
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// `self IS NULL`
    #[must_use]
    pub fn is_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    /// `self IS NOT NULL`
    #[must_use]
    pub fn is_not_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }

    /// Splits a chain of ANDs into its conjuncts, left to right.
    #[must_use]
    pub fn into_conjuncts(self) -> Vec<Expr> {
        match self {
            Self::And(left, right) => {
                let mut out = left.into_conjuncts();
                out.extend(right.into_conjuncts());
                out
            }
            other => vec![other],
        }
    }

    /// Rebuilds a left-deep AND chain; `None` for an empty list.
    #[must_use]
    pub fn conjunction(parts: Vec<Expr>) -> Option<Expr> {
        parts.into_iter().reduce(Expr::and)
    }

    /// Returns true if a call to `name` (case-insensitive) appears anywhere.
    #[must_use]
    pub fn contains_call(&self, name: &str) -> bool {
        match self {
            Self::Call { name: n, args } => {
                n.eq_ignore_ascii_case(name) || args.iter().any(|a| a.contains_call(name))
            }
            Self::Compare { left, right, .. } | Self::And(left, right) | Self::Or(left, right) => {
                left.contains_call(name) || right.contains_call(name)
            }
            Self::Not(inner) | Self::Neg(inner) | Self::IsNull { expr: inner, .. } => {
                inner.contains_call(name)
            }
            Self::Literal(_) | Self::Field(_) | Self::Parameter(_) => false,
        }
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<Vector> for Expr {
    fn from(value: Vector) -> Self {
        Self::Literal(Value::Vector(value))
    }
}

impl From<Vec<f32>> for Expr {
    fn from(value: Vec<f32>) -> Self {
        Self::Literal(Value::from(value))
    }
}

impl From<&[f32]> for Expr {
    fn from(value: &[f32]) -> Self {
        Self::Literal(Value::from(value))
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Self::Literal(Value::Double(value))
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Self::Literal(Value::Int(value))
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Self::Literal(Value::from(value))
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Self::Literal(Value::Bool(value))
    }
}
