//! Expression compilation and per-document evaluation.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::operator::{NamedOperator, OperatorRegistry};
use super::{CompareOp, Expr, Params};
use crate::document::{Document, ID_FIELD};
use crate::error::{Error, Result};
use crate::value::Value;
use crate::vector::Vector;

/// Everything an expression needs to be bound before a scan.
#[derive(Debug, Clone, Copy)]
pub struct CompileContext<'a> {
    /// Operator table.
    pub registry: &'a OperatorRegistry,
    /// Values for `$name` placeholders.
    pub params: &'a Params,
    /// Largest accepted query-vector dimension.
    pub max_dimensions: usize,
}

impl<'a> CompileContext<'a> {
    /// Creates a context.
    #[must_use]
    pub const fn new(registry: &'a OperatorRegistry, params: &'a Params, max_dimensions: usize) -> Self {
        Self {
            registry,
            params,
            max_dimensions,
        }
    }

    /// Looks up a parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParameter`] if it is not bound.
    pub fn param(&self, name: &str) -> Result<&'a Value> {
        self.params
            .get(name)
            .ok_or_else(|| Error::MissingParameter(name.to_string()))
    }

    /// Rejects query vectors above the configured dimension limit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `vector` is too large.
    pub fn check_dimension(&self, vector: &Vector) -> Result<()> {
        if vector.dimension() > self.max_dimensions {
            return Err(Error::InvalidArgument(format!(
                "query vector has {} dimensions, limit is {}",
                vector.dimension(),
                self.max_dimensions
            )));
        }
        Ok(())
    }

    /// Substitutes parameters and casts a vector target once.
    ///
    /// # Errors
    ///
    /// Propagates missing-parameter, type and dimension errors.
    pub fn bind_vector(&self, target: &Expr) -> Result<Vector> {
        let vector = match target {
            Expr::Literal(value) => Vector::try_from(value)?,
            Expr::Parameter(name) => Vector::try_from(self.param(name)?)?,
            other => {
                return Err(Error::InvalidArgument(format!(
                    "query vector must be a literal or parameter, got {other:?}"
                )))
            }
        };
        self.check_dimension(&vector)?;
        Ok(vector)
    }

    /// Compiles an expression.
    ///
    /// # Errors
    ///
    /// Fails on unknown functions, missing parameters, or constant
    /// arguments an operator rejects.
    pub fn compile(&self, expr: &Expr) -> Result<CompiledExpr> {
        Ok(match expr {
            Expr::Literal(value) => CompiledExpr::Literal(value.clone()),
            Expr::Parameter(name) => CompiledExpr::Literal(self.param(name)?.clone()),
            Expr::Field(path) if path == ID_FIELD => CompiledExpr::Id,
            Expr::Field(path) => CompiledExpr::Field(path.clone()),
            Expr::Call { name, args } => {
                let op = self.registry.resolve(name, args.len())?;
                let mut bound = args
                    .iter()
                    .map(|a| self.substitute(a))
                    .collect::<Result<Vec<_>>>()?;
                op.prepare(&mut bound, self)?;
                let args = bound
                    .iter()
                    .map(|a| self.compile(a))
                    .collect::<Result<Vec<_>>>()?;
                CompiledExpr::Call { op, args }
            }
            Expr::Compare { op, left, right } => CompiledExpr::Compare {
                op: *op,
                left: Box::new(self.compile(left)?),
                right: Box::new(self.compile(right)?),
            },
            Expr::And(left, right) => CompiledExpr::And(
                Box::new(self.compile(left)?),
                Box::new(self.compile(right)?),
            ),
            Expr::Or(left, right) => CompiledExpr::Or(
                Box::new(self.compile(left)?),
                Box::new(self.compile(right)?),
            ),
            Expr::Not(inner) => CompiledExpr::Not(Box::new(self.compile(inner)?)),
            Expr::IsNull { expr, negated } => CompiledExpr::IsNull {
                expr: Box::new(self.compile(expr)?),
                negated: *negated,
            },
            Expr::Neg(inner) => CompiledExpr::Neg(Box::new(self.compile(inner)?)),
        })
    }

    /// Replaces top-level parameters so `prepare` sees constants.
    fn substitute(&self, expr: &Expr) -> Result<Expr> {
        match expr {
            Expr::Parameter(name) => Ok(Expr::Literal(self.param(name)?.clone())),
            other => Ok(other.clone()),
        }
    }
}

/// An expression bound to operators and parameters, ready to run.
#[derive(Clone)]
pub enum CompiledExpr {
    /// Constant.
    Literal(Value),
    /// The document id.
    Id,
    /// Field path.
    Field(String),
    /// Resolved operator call.
    Call {
        /// Operator.
        op: Arc<dyn NamedOperator>,
        /// Arguments.
        args: Vec<CompiledExpr>,
    },
    /// Comparison.
    Compare {
        /// Operator.
        op: CompareOp,
        /// Left operand.
        left: Box<CompiledExpr>,
        /// Right operand.
        right: Box<CompiledExpr>,
    },
    /// Logical AND.
    And(Box<CompiledExpr>, Box<CompiledExpr>),
    /// Logical OR.
    Or(Box<CompiledExpr>, Box<CompiledExpr>),
    /// Logical NOT.
    Not(Box<CompiledExpr>),
    /// Null test.
    IsNull {
        /// Tested expression.
        expr: Box<CompiledExpr>,
        /// True for `IS NOT NULL`.
        negated: bool,
    },
    /// Unary minus.
    Neg(Box<CompiledExpr>),
}

impl fmt::Debug for CompiledExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => write!(f, "{v}"),
            Self::Id => f.write_str(ID_FIELD),
            Self::Field(p) => f.write_str(p),
            Self::Call { op, args } => f.debug_tuple(op.name()).field(args).finish(),
            Self::Compare { op, left, right } => {
                write!(f, "({left:?} {} {right:?})", op.symbol())
            }
            Self::And(l, r) => write!(f, "({l:?} AND {r:?})"),
            Self::Or(l, r) => write!(f, "({l:?} OR {r:?})"),
            Self::Not(e) => write!(f, "NOT {e:?}"),
            Self::IsNull { expr, negated } => {
                write!(f, "{expr:?} IS {}NULL", if *negated { "NOT " } else { "" })
            }
            Self::Neg(e) => write!(f, "-{e:?}"),
        }
    }
}

fn truth(value: Option<&Value>) -> Option<bool> {
    value.and_then(Value::as_bool)
}

impl CompiledExpr {
    /// Evaluates against one document. `Ok(None)` is *undefined*.
    ///
    /// # Errors
    ///
    /// Propagates operator errors (e.g. a vector dimension mismatch).
    pub fn eval<'d>(&'d self, doc: &'d Document) -> Result<Option<Cow<'d, Value>>> {
        Ok(match self {
            Self::Literal(v) => Some(Cow::Borrowed(v)),
            Self::Id => Some(Cow::Owned(Value::Int(doc.id as i64))),
            Self::Field(path) => doc.get_path(path).map(Cow::Borrowed),
            Self::Call { op, args } => {
                let values = args
                    .iter()
                    .map(|a| a.eval(doc))
                    .collect::<Result<Vec<_>>>()?;
                let refs: Vec<Option<&Value>> = values.iter().map(|v| v.as_deref()).collect();
                op.call(&refs)?.map(Cow::Owned)
            }
            Self::Compare { op, left, right } => {
                let (Some(l), Some(r)) = (left.eval(doc)?, right.eval(doc)?) else {
                    return Ok(None);
                };
                compare(*op, &l, &r).map(|b| Cow::Owned(Value::Bool(b)))
            }
            Self::And(left, right) => {
                let l = truth(left.eval(doc)?.as_deref());
                if l == Some(false) {
                    return Ok(Some(Cow::Owned(Value::Bool(false))));
                }
                match (l, truth(right.eval(doc)?.as_deref())) {
                    (_, Some(false)) => Some(Cow::Owned(Value::Bool(false))),
                    (Some(true), Some(true)) => Some(Cow::Owned(Value::Bool(true))),
                    _ => None,
                }
            }
            Self::Or(left, right) => {
                let l = truth(left.eval(doc)?.as_deref());
                if l == Some(true) {
                    return Ok(Some(Cow::Owned(Value::Bool(true))));
                }
                match (l, truth(right.eval(doc)?.as_deref())) {
                    (_, Some(true)) => Some(Cow::Owned(Value::Bool(true))),
                    (Some(false), Some(false)) => Some(Cow::Owned(Value::Bool(false))),
                    _ => None,
                }
            }
            Self::Not(inner) => {
                truth(inner.eval(doc)?.as_deref()).map(|b| Cow::Owned(Value::Bool(!b)))
            }
            Self::IsNull { expr, negated } => {
                let is_null = expr.eval(doc)?.is_none_or(|v| v.is_null());
                Some(Cow::Owned(Value::Bool(is_null != *negated)))
            }
            Self::Neg(inner) => match inner.eval(doc)?.as_deref() {
                Some(Value::Int(i)) => i.checked_neg().map(|n| Cow::Owned(Value::Int(n))),
                Some(Value::Double(d)) => Some(Cow::Owned(Value::Double(-d))),
                _ => None,
            },
        })
    }

    /// Evaluates as a predicate: only a defined `true` matches.
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors.
    pub fn matches(&self, doc: &Document) -> Result<bool> {
        Ok(matches!(
            self.eval(doc)?.as_deref(),
            Some(Value::Bool(true))
        ))
    }

    /// Evaluates and detaches the result from the document.
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors.
    pub fn eval_owned(&self, doc: &Document) -> Result<Option<Value>> {
        Ok(self.eval(doc)?.map(Cow::into_owned))
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Option<bool> {
    match op {
        CompareOp::Eq => left.loose_eq(right),
        CompareOp::NotEq => left.loose_eq(right).map(|eq| !eq),
        CompareOp::Gt => left.partial_compare(right).map(|o| o == Ordering::Greater),
        CompareOp::Gte => left.partial_compare(right).map(|o| o != Ordering::Less),
        CompareOp::Lt => left.partial_compare(right).map(|o| o == Ordering::Less),
        CompareOp::Lte => left.partial_compare(right).map(|o| o != Ordering::Greater),
    }
}
