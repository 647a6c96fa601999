//! Named operators callable from expressions.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::compile::CompileContext;
use super::vector_ops::{DimensionOperator, DistanceOperator, NearOperator};
use super::Expr;
use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::value::Value;

/// A function the expression evaluator can dispatch to by name and arity.
///
/// Implementations must be pure: the same arguments always give the same
/// result, and one instance is shared by every query running on the
/// database.
pub trait NamedOperator: Send + Sync + fmt::Debug {
    /// Name as registered (matched case-insensitively).
    fn name(&self) -> &str;

    /// Exact number of arguments.
    fn arity(&self) -> usize;

    /// Per-query argument binding, called once before the scan with
    /// parameters already substituted.
    ///
    /// Operators use it to cast constant arguments (e.g. a query vector) so
    /// the per-document [`call`](Self::call) does not redo the work, and to
    /// reject bad constants before any document is read.
    fn prepare(&self, _args: &mut [Expr], _ctx: &CompileContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Evaluates the operator. `None` arguments and results are *undefined*.
    fn call(&self, args: &[Option<&Value>]) -> Result<Option<Value>>;
}

/// Operator lookup table keyed by upper-cased name and arity.
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    operators: FxHashMap<(String, usize), Arc<dyn NamedOperator>>,
}

impl OperatorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the vector built-ins.
    ///
    /// `DISTANCE` and `NEAR` use `default_metric` unless the call names a
    /// metric as its last argument; the metric-specific variants are always
    /// available.
    #[must_use]
    pub fn with_builtins(default_metric: DistanceMetric) -> Self {
        let mut registry = Self::new();
        registry.register(DistanceOperator::new("DISTANCE", default_metric));
        registry.register(DistanceOperator::new("COSINE_DISTANCE", DistanceMetric::Cosine));
        registry.register(DistanceOperator::new(
            "EUCLIDEAN_DISTANCE",
            DistanceMetric::Euclidean,
        ));
        registry.register(DistanceOperator::new("DOT_DISTANCE", DistanceMetric::DotProduct));
        registry.register(DistanceOperator::with_metric_argument("DISTANCE", default_metric));
        registry.register(NearOperator::new(default_metric));
        registry.register(NearOperator::with_metric_argument());
        registry.register(DimensionOperator);
        registry
    }

    /// Registers an operator, replacing any previous one with the same
    /// name and arity.
    pub fn register(&mut self, operator: impl NamedOperator + 'static) {
        self.register_arc(Arc::new(operator));
    }

    /// Registers a shared operator.
    pub fn register_arc(&mut self, operator: Arc<dyn NamedOperator>) {
        let key = (operator.name().to_ascii_uppercase(), operator.arity());
        self.operators.insert(key, operator);
    }

    /// Looks up an operator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownOperator`] if nothing is registered for
    /// `name`/`arity`.
    pub fn resolve(&self, name: &str, arity: usize) -> Result<Arc<dyn NamedOperator>> {
        let upper = name.to_ascii_uppercase();
        self.operators
            .get(&(upper.clone(), arity))
            .cloned()
            .ok_or(Error::UnknownOperator { name: upper, arity })
    }

    /// Returns true if `name` is registered with any arity.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        let upper = name.to_ascii_uppercase();
        self.operators.keys().any(|(n, _)| *n == upper)
    }

    /// Number of registered (name, arity) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}
