//! Surface-independent logical plan.
//!
//! Both the fluent builder and `DocQL` produce a [`QueryPlan`]. Steps run in
//! a fixed order: scan, filter, near-filters, top-k, order-by, offset/limit,
//! projection.

use serde::{Deserialize, Serialize};

use crate::distance::DistanceMetric;
use crate::expr::Expr;
use crate::value::Value;
use crate::vector::Vector;

/// Threshold step: keep documents within `max_distance` of `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearSpec {
    /// Path of the vector field.
    pub field: String,
    /// Query vector (literal or parameter).
    pub target: Expr,
    /// Inclusive distance bound: a number literal or a parameter.
    pub max_distance: Expr,
    /// Metric override; the database default when `None`.
    pub metric: Option<DistanceMetric>,
}

/// Ranking step: keep the `k` documents nearest `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopKSpec {
    /// Path of the vector field.
    pub field: String,
    /// Query vector (literal or parameter).
    pub target: Expr,
    /// Number of results.
    pub k: usize,
    /// Metric override; the database default when `None`.
    pub metric: Option<DistanceMetric>,
}

/// One ORDER BY column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderKey {
    /// Sort key.
    pub expr: Expr,
    /// Sort descending.
    pub descending: bool,
}

/// One projected column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectItem {
    /// Projected expression.
    pub expr: Expr,
    /// Output name; derived from the expression when absent.
    pub alias: Option<String>,
}

impl SelectItem {
    /// Unaliased column.
    #[must_use]
    pub fn new(expr: impl Into<Expr>) -> Self {
        Self {
            expr: expr.into(),
            alias: None,
        }
    }

    /// Aliased column.
    #[must_use]
    pub fn aliased(expr: impl Into<Expr>, alias: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            alias: Some(alias.into()),
        }
    }

    /// Field name this column gets in the output document.
    ///
    /// A plain field keeps its path, a call is named after its function in
    /// lower case, anything else is `col{position}`.
    #[must_use]
    pub fn output_name(&self, position: usize) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        match &self.expr {
            Expr::Field(path) => path.clone(),
            Expr::Call { name, .. } => name.to_ascii_lowercase(),
            _ => format!("col{position}"),
        }
    }
}

impl From<&str> for SelectItem {
    fn from(path: &str) -> Self {
        Self::new(Expr::field(path))
    }
}

impl From<Expr> for SelectItem {
    fn from(expr: Expr) -> Self {
        Self::new(expr)
    }
}

/// What the cursor returns per document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Projection {
    /// Whole documents.
    #[default]
    All,
    /// Computed columns.
    Items(Vec<SelectItem>),
}

/// A compiled-ready query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    /// Source collection.
    pub collection: String,
    /// Residual predicate.
    pub filter: Option<Expr>,
    /// Near-filter steps, applied in order.
    pub near: Vec<NearSpec>,
    /// Top-k step.
    pub top_k: Option<TopKSpec>,
    /// Sort keys.
    pub order_by: Vec<OrderKey>,
    /// Output shape.
    pub projection: Projection,
    /// Maximum rows returned.
    pub limit: Option<usize>,
    /// Rows skipped before the first returned one.
    pub offset: usize,
}

impl QueryPlan {
    /// Full scan of `collection`.
    #[must_use]
    pub fn scan(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filter: None,
            near: Vec::new(),
            top_k: None,
            order_by: Vec::new(),
            projection: Projection::All,
            limit: None,
            offset: 0,
        }
    }

    /// Adds a predicate, AND-ed with any existing one.
    pub fn push_filter(&mut self, expr: Expr) {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(expr),
            None => expr,
        });
    }
}

/// Stores a literal query vector in native form so plans built from text
/// and from `f32` slices compare equal. Anything that does not cast is left
/// as is and reported when the plan is bound.
pub(crate) fn canonical_target(target: Expr) -> Expr {
    match target {
        Expr::Literal(value @ (Value::Array(_) | Value::String(_))) => match Vector::try_from(&value) {
            Ok(vector) => Expr::Literal(Value::Vector(vector)),
            Err(_) => Expr::Literal(value),
        },
        other => other,
    }
}

/// Stores an integer bound as a double so `NEAR(v, q, 2)` and a bound of
/// `2.0` plan identically.
pub(crate) fn canonical_bound(bound: Expr) -> Expr {
    match bound {
        Expr::Literal(Value::Int(i)) => Expr::Literal(Value::Double(i as f64)),
        other => other,
    }
}
