//! `DocQL` syntax tree and its lowering to a [`QueryPlan`].

use crate::distance::DistanceMetric;
use crate::expr::Expr;
use crate::query::{
    canonical_bound, canonical_target, top_k_count, NearSpec, OrderKey, Projection, QueryPlan,
    TopKSpec,
};
use crate::value::Value;

use super::error::ParseError;

/// A parsed SELECT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Output columns.
    pub projection: Projection,
    /// FROM collection.
    pub collection: String,
    /// WHERE condition.
    pub where_clause: Option<Expr>,
    /// ORDER BY keys.
    pub order_by: Vec<OrderKey>,
    /// LIMIT.
    pub limit: Option<usize>,
    /// OFFSET.
    pub offset: Option<usize>,
}

impl SelectStatement {
    /// Lowers the statement to a plan.
    ///
    /// Top-level WHERE conjuncts `NEAR(field, vector, max[, metric])` and
    /// `TOP_K(field, vector, k[, metric])` become near-filter and top-k
    /// steps; the remaining conjuncts form the residual filter. A `NEAR`
    /// that does not fit a near-filter step (computed arguments, a metric
    /// that is not a known name) stays an ordinary predicate call, as it
    /// does anywhere else in the condition.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` for a malformed `TOP_K`, more than one `TOP_K`,
    /// or `TOP_K` outside a top-level WHERE conjunct.
    pub fn into_plan(self) -> Result<QueryPlan, ParseError> {
        let mut plan = QueryPlan::scan(self.collection);
        plan.projection = self.projection;
        plan.order_by = self.order_by;
        plan.limit = self.limit;
        plan.offset = self.offset.unwrap_or(0);

        let conjuncts = self.where_clause.map(Expr::into_conjuncts).unwrap_or_default();
        let mut residual = Vec::with_capacity(conjuncts.len());
        for conjunct in conjuncts {
            match conjunct {
                Expr::Call { name, args } if name.eq_ignore_ascii_case("NEAR") => {
                    match lower_near(&args) {
                        Some(spec) => plan.near.push(spec),
                        None => residual.push(Expr::Call { name, args }),
                    }
                }
                Expr::Call { name, args } if name.eq_ignore_ascii_case("TOP_K") => {
                    if plan.top_k.is_some() {
                        return Err(ParseError::invalid_clause(
                            "TOP_K",
                            "Only one TOP_K clause is allowed",
                        ));
                    }
                    plan.top_k = Some(lower_top_k(args)?);
                }
                other => residual.push(other),
            }
        }
        plan.filter = Expr::conjunction(residual);

        let misplaced = plan.filter.iter().any(|f| f.contains_call("TOP_K"))
            || plan.order_by.iter().any(|k| k.expr.contains_call("TOP_K"))
            || matches!(&plan.projection, Projection::Items(items)
                if items.iter().any(|i| i.expr.contains_call("TOP_K")));
        if misplaced {
            return Err(ParseError::invalid_clause(
                "TOP_K",
                "TOP_K is only allowed as a top-level WHERE condition",
            ));
        }

        Ok(plan)
    }
}

/// Lowers a `NEAR` call whose arguments are a field path, a constant
/// vector, a constant or parameter bound and an optional metric literal.
fn lower_near(args: &[Expr]) -> Option<NearSpec> {
    let (field, target, bound, metric) = match args {
        [field, target, bound] => (field, target, bound, None),
        [field, target, bound, metric] => (field, target, bound, Some(metric)),
        _ => return None,
    };
    let Expr::Field(field) = field else {
        return None;
    };
    if !matches!(target, Expr::Literal(_) | Expr::Parameter(_)) {
        return None;
    }
    let max_distance = match bound {
        Expr::Literal(value) if value.as_f64().is_some() => canonical_bound(bound.clone()),
        Expr::Parameter(_) => bound.clone(),
        _ => return None,
    };
    let metric = match metric {
        None => None,
        Some(Expr::Literal(Value::String(name))) => Some(name.parse::<DistanceMetric>().ok()?),
        Some(_) => return None,
    };
    Some(NearSpec {
        field: field.clone(),
        target: canonical_target(target.clone()),
        max_distance,
        metric,
    })
}

/// Splits `TOP_K(field, vector, k[, metric])` into its parts.
fn split_top_k_args(
    args: Vec<Expr>,
) -> Result<(String, Expr, Value, Option<DistanceMetric>), ParseError> {
    if !(3..=4).contains(&args.len()) {
        return Err(ParseError::invalid_clause(
            "TOP_K",
            format!("TOP_K expects 3 or 4 arguments, got {}", args.len()),
        ));
    }
    let mut args = args.into_iter();
    let (Some(field), Some(target), Some(bound)) = (args.next(), args.next(), args.next()) else {
        return Err(ParseError::invalid_clause("TOP_K", "Missing arguments"));
    };

    let Expr::Field(field) = field else {
        return Err(ParseError::invalid_clause(
            "TOP_K",
            "TOP_K first argument must be a field path",
        ));
    };
    if !matches!(target, Expr::Literal(_) | Expr::Parameter(_)) {
        return Err(ParseError::invalid_clause(
            "TOP_K",
            "TOP_K vector must be a literal or a parameter",
        ));
    }
    let Expr::Literal(bound) = bound else {
        return Err(ParseError::invalid_clause(
            "TOP_K",
            "TOP_K count must be an integer",
        ));
    };
    let metric = match args.next() {
        None => None,
        Some(Expr::Literal(Value::String(name))) => Some(
            name.parse::<DistanceMetric>()
                .map_err(|e| ParseError::invalid_clause(name.clone(), e.to_string()))?,
        ),
        Some(_) => {
            return Err(ParseError::invalid_clause(
                "TOP_K",
                "TOP_K metric must be a string literal",
            ))
        }
    };
    Ok((field, canonical_target(target), bound, metric))
}

fn lower_top_k(args: Vec<Expr>) -> Result<TopKSpec, ParseError> {
    let (field, target, bound, metric) = split_top_k_args(args)?;
    let k = bound
        .as_i64()
        .map(top_k_count)
        .ok_or_else(|| ParseError::invalid_clause("TOP_K", "TOP_K count must be an integer"))?;
    Ok(TopKSpec {
        field,
        target,
        k,
        metric,
    })
}
