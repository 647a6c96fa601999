//! Fluent query construction.

use crate::distance::DistanceMetric;
use crate::document::Document;
use crate::error::Result;
use crate::expr::{Expr, Params};
use crate::store::Database;
use crate::value::Value;

use super::cursor::QueryCursor;
use super::plan::{canonical_target, NearSpec, OrderKey, Projection, QueryPlan, SelectItem, TopKSpec};

/// Builds a [`QueryPlan`] step by step.
///
/// ```
/// use vectordoc_core::{Database, Document};
///
/// let db = Database::new();
/// let docs = db.create_collection("docs")?;
/// docs.insert(Document::new(1).with("embedding", vec![1.0_f32, 0.0]))?;
/// docs.insert(Document::new(2).with("embedding", vec![0.0_f32, 1.0]))?;
/// docs.insert(Document::new(3).with("embedding", vec![1.0_f32, 1.0]))?;
///
/// let nearest = db
///     .query("docs")
///     .top_k_near("embedding", vec![1.0_f32, 0.0], 2)
///     .to_vec()?;
/// let ids: Vec<u64> = nearest.iter().map(|d| d.id).collect();
/// assert_eq!(ids, vec![1, 3]);
/// # Ok::<(), vectordoc_core::Error>(())
/// ```
#[must_use = "a query does nothing until executed"]
pub struct QueryBuilder<'db> {
    db: &'db Database,
    plan: QueryPlan,
    metric: Option<DistanceMetric>,
    params: Params,
}

impl<'db> QueryBuilder<'db> {
    pub(crate) fn new(db: &'db Database, collection: impl Into<String>) -> Self {
        Self {
            db,
            plan: QueryPlan::scan(collection),
            metric: None,
            params: Params::new(),
        }
    }

    /// Adds a predicate, AND-ed with earlier ones.
    pub fn filter(mut self, expr: Expr) -> Self {
        self.plan.push_filter(expr);
        self
    }

    /// Keeps documents whose vector at `field` is within `max_distance`
    /// (inclusive) of `target`.
    pub fn where_near(
        mut self,
        field: impl Into<String>,
        target: impl Into<Expr>,
        max_distance: f64,
    ) -> Self {
        self.plan.near.push(NearSpec {
            field: field.into(),
            target: canonical_target(target.into()),
            max_distance: Expr::from(max_distance),
            metric: None,
        });
        self
    }

    /// Keeps the `k` documents nearest `target`, closest first.
    ///
    /// A later call replaces an earlier one.
    pub fn top_k_near(mut self, field: impl Into<String>, target: impl Into<Expr>, k: usize) -> Self {
        self.plan.top_k = Some(TopKSpec {
            field: field.into(),
            target: canonical_target(target.into()),
            k,
            metric: None,
        });
        self
    }

    /// Metric for the near and top-k steps of this query. Without it they
    /// use the database default.
    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = Some(metric);
        self
    }

    /// Ascending sort key.
    pub fn order_by(mut self, expr: impl Into<Expr>) -> Self {
        self.plan.order_by.push(OrderKey {
            expr: expr.into(),
            descending: false,
        });
        self
    }

    /// Descending sort key.
    pub fn order_by_desc(mut self, expr: impl Into<Expr>) -> Self {
        self.plan.order_by.push(OrderKey {
            expr: expr.into(),
            descending: true,
        });
        self
    }

    /// Returns computed columns instead of whole documents.
    pub fn select<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectItem>,
    {
        self.plan.projection = Projection::Items(items.into_iter().map(Into::into).collect());
        self
    }

    /// Maximum number of rows.
    pub fn limit(mut self, n: usize) -> Self {
        self.plan.limit = Some(n);
        self
    }

    /// Rows to skip.
    pub fn offset(mut self, n: usize) -> Self {
        self.plan.offset = n;
        self
    }

    /// Binds a `$name` parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// The plan this builder describes.
    #[must_use]
    pub fn plan(&self) -> QueryPlan {
        let mut plan = self.plan.clone();
        if let Some(metric) = self.metric {
            for near in &mut plan.near {
                near.metric.get_or_insert(metric);
            }
            if let Some(top_k) = plan.top_k.as_mut() {
                top_k.metric.get_or_insert(metric);
            }
        }
        plan
    }

    /// Runs the query.
    ///
    /// # Errors
    ///
    /// Returns binding errors; scan errors come out of the cursor.
    pub fn execute(self) -> Result<QueryCursor> {
        self.db.execute_plan(&self.plan(), &self.params)
    }

    /// Runs the query and collects every row.
    ///
    /// # Errors
    ///
    /// Returns the first binding or scan error.
    pub fn to_vec(self) -> Result<Vec<Document>> {
        self.execute()?.collect()
    }
}
