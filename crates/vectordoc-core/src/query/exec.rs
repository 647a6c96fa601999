//! Binds a [`QueryPlan`] and assembles its streaming pipeline.

use std::sync::Arc;

use super::cursor::QueryCursor;
use super::near::NearFilter;
use super::order::{OrderBy, SortKey};
use super::plan::{Projection, QueryPlan};
use super::stages::{Filter, Paginate};
use super::topk::TopKNear;
use super::Rows;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::expr::{CompileContext, Expr, OperatorRegistry, Params};
use crate::store::Snapshot;

/// Compiles `plan` against `snapshot` and returns a lazy cursor.
///
/// Everything that can fail without reading a document fails here: unknown
/// operators, missing parameters, bad query vectors, invalid bounds.
///
/// # Errors
///
/// Returns the first binding error.
pub fn execute(
    plan: &QueryPlan,
    snapshot: Snapshot,
    registry: &OperatorRegistry,
    config: &Config,
    params: &Params,
) -> Result<QueryCursor> {
    let ctx = CompileContext::new(registry, params, config.limits.max_dimensions);
    let default_metric = config.query.default_metric;

    let filter = plan.filter.as_ref().map(|f| ctx.compile(f)).transpose()?;

    let mut near = Vec::with_capacity(plan.near.len());
    for spec in &plan.near {
        let max_distance = bind_max_distance(&ctx, &spec.field, &spec.max_distance)?;
        let target = ctx.bind_vector(&spec.target)?;
        near.push((spec, target, max_distance, spec.metric.unwrap_or(default_metric)));
    }

    let top_k = match &plan.top_k {
        Some(spec) => Some((
            spec,
            ctx.bind_vector(&spec.target)?,
            spec.metric.unwrap_or(default_metric),
        )),
        None => None,
    };

    let order_keys = plan
        .order_by
        .iter()
        .map(|key| {
            Ok(SortKey {
                expr: ctx.compile(&key.expr)?,
                descending: key.descending,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let projection = match &plan.projection {
        Projection::All => None,
        Projection::Items(items) => Some(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| Ok((item.output_name(i), ctx.compile(&item.expr)?)))
                .collect::<Result<Vec<_>>>()?,
        ),
    };

    let limit = plan.limit.map(|requested| {
        if requested > config.query.max_limit {
            tracing::debug!(
                requested,
                max_limit = config.query.max_limit,
                "limit capped"
            );
        }
        requested.min(config.query.max_limit)
    });

    tracing::debug!(
        collection = %plan.collection,
        documents = snapshot.len(),
        filter = filter.is_some(),
        near_steps = near.len(),
        top_k = plan.top_k.as_ref().map(|t| t.k),
        order_keys = order_keys.len(),
        limit,
        offset = plan.offset,
        "query plan bound"
    );

    let mut rows: Rows = Box::new(snapshot.into_iter().map(Ok));
    if let Some(predicate) = filter {
        rows = Box::new(Filter::new(rows, predicate));
    }
    for (spec, target, max_distance, metric) in near {
        rows = Box::new(NearFilter::new(
            rows,
            spec.field.clone(),
            target,
            max_distance,
            metric,
        ));
    }
    if let Some((spec, target, metric)) = top_k {
        rows = Box::new(TopKNear::new(rows, spec.field.clone(), target, spec.k, metric));
    }
    if !order_keys.is_empty() {
        let bound = limit.map(|l| l.saturating_add(plan.offset));
        rows = Box::new(OrderBy::new(rows, order_keys, bound));
    }
    if plan.offset > 0 || limit.is_some() {
        rows = Box::new(Paginate::new(rows, plan.offset, limit));
    }

    Ok(QueryCursor::new(
        Arc::from(plan.collection.as_str()),
        rows,
        projection,
    ))
}

/// Resolves a near-filter bound to a number.
fn bind_max_distance(ctx: &CompileContext<'_>, field: &str, bound: &Expr) -> Result<f64> {
    let value = match bound {
        Expr::Literal(value) => value,
        Expr::Parameter(name) => ctx.param(name)?,
        other => {
            return Err(Error::InvalidArgument(format!(
                "max distance for '{field}' must be a literal or parameter, got {other:?}"
            )))
        }
    };
    let max_distance = value.as_f64().ok_or_else(|| {
        Error::TypeMismatch(format!(
            "max distance for '{field}' must be a number, got {}",
            value.type_name()
        ))
    })?;
    if max_distance.is_nan() {
        return Err(Error::InvalidArgument(format!(
            "max distance for '{field}' is NaN"
        )));
    }
    Ok(max_distance)
}
