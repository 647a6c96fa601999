//! Vector operators: `DISTANCE`, `*_DISTANCE`, `NEAR` and `DIMENSION`.

use super::compile::CompileContext;
use super::operator::NamedOperator;
use super::Expr;
use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::value::Value;
use crate::vector::Vector;

/// Casts a constant vector argument once per query.
///
/// Non-literal arguments are left alone: they are resolved per document.
fn bind_vector_literal(arg: &mut Expr, ctx: &CompileContext<'_>) -> Result<()> {
    if let Expr::Literal(value) = arg {
        let vector = Vector::try_from(&*value)?;
        ctx.check_dimension(&vector)?;
        *value = Value::Vector(vector);
    }
    Ok(())
}

/// Lenient per-document cast: anything not vector-shaped is undefined.
#[inline]
fn vector_arg(arg: Option<&Value>) -> Option<Vector> {
    arg.and_then(Value::as_vector)
}

/// Validates a constant metric argument and stores its canonical name.
fn bind_metric_literal(arg: Option<&mut Expr>) -> Result<()> {
    if let Some(Expr::Literal(value)) = arg {
        let metric = metric_arg(value)?;
        *value = Value::String(metric.name().to_string());
    }
    Ok(())
}

/// Reads a metric name argument.
fn metric_arg(arg: &Value) -> Result<DistanceMetric> {
    match arg {
        Value::String(name) => name.parse(),
        other => Err(Error::TypeMismatch(format!(
            "distance metric must be a string, got {}",
            other.type_name()
        ))),
    }
}

/// Distance between a stored vector field and a query vector.
///
/// `NAME(field, target)` yields a double, or undefined when the field is
/// missing or not vector-shaped. Differing dimensions are an error. The
/// `NAME(field, target, metric)` form takes the metric name as a third
/// argument.
#[derive(Debug, Clone)]
pub struct DistanceOperator {
    name: String,
    metric: DistanceMetric,
    metric_argument: bool,
}

impl DistanceOperator {
    /// Creates a distance operator registered under `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, metric: DistanceMetric) -> Self {
        Self {
            name: name.into(),
            metric,
            metric_argument: false,
        }
    }

    /// Creates the three-argument form whose metric is named at the call
    /// site. `fallback` is reported by [`DistanceOperator::metric`].
    #[must_use]
    pub fn with_metric_argument(name: impl Into<String>, fallback: DistanceMetric) -> Self {
        Self {
            name: name.into(),
            metric: fallback,
            metric_argument: true,
        }
    }

    /// Metric used by this operator.
    #[must_use]
    pub const fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Distance for one document, `None` when either side is absent.
    pub(crate) fn evaluate(
        &self,
        stored: Option<&Value>,
        target: Option<&Value>,
    ) -> Result<Option<f32>> {
        evaluate_with(self.metric, stored, target)
    }
}

fn evaluate_with(
    metric: DistanceMetric,
    stored: Option<&Value>,
    target: Option<&Value>,
) -> Result<Option<f32>> {
    let (Some(stored), Some(target)) = (vector_arg(stored), vector_arg(target)) else {
        return Ok(None);
    };
    metric.distance(&target, &stored).map(Some)
}

impl NamedOperator for DistanceOperator {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        if self.metric_argument {
            3
        } else {
            2
        }
    }

    fn prepare(&self, args: &mut [Expr], ctx: &CompileContext<'_>) -> Result<()> {
        if let Some(target) = args.get_mut(1) {
            bind_vector_literal(target, ctx)?;
        }
        if self.metric_argument {
            bind_metric_literal(args.get_mut(2))?;
        }
        Ok(())
    }

    fn call(&self, args: &[Option<&Value>]) -> Result<Option<Value>> {
        let distance = match (args, self.metric_argument) {
            ([stored, target], false) => self.evaluate(*stored, *target)?,
            ([stored, target, metric], true) => match metric {
                Some(metric) => evaluate_with(metric_arg(metric)?, *stored, *target)?,
                None => None,
            },
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "{} expects {} arguments, got {}",
                    self.name,
                    self.arity(),
                    args.len()
                )))
            }
        };
        Ok(distance.map(|d| Value::Double(f64::from(d))))
    }
}

/// `NEAR(field, target, max_distance[, metric])`: true when the field vector
/// is within `max_distance` of the target.
///
/// The three-argument form uses the database default metric; the
/// four-argument form names it.
#[derive(Debug, Clone)]
pub struct NearOperator {
    metric: DistanceMetric,
    metric_argument: bool,
}

impl NearOperator {
    /// Creates the three-argument operator for `metric`.
    #[must_use]
    pub const fn new(metric: DistanceMetric) -> Self {
        Self {
            metric,
            metric_argument: false,
        }
    }

    /// Creates the four-argument operator.
    #[must_use]
    pub const fn with_metric_argument() -> Self {
        Self {
            metric: DistanceMetric::Cosine,
            metric_argument: true,
        }
    }
}

impl NamedOperator for NearOperator {
    fn name(&self) -> &str {
        "NEAR"
    }

    fn arity(&self) -> usize {
        if self.metric_argument {
            4
        } else {
            3
        }
    }

    fn prepare(&self, args: &mut [Expr], ctx: &CompileContext<'_>) -> Result<()> {
        if let Some(target) = args.get_mut(1) {
            bind_vector_literal(target, ctx)?;
        }
        if let Some(Expr::Literal(max)) = args.get(2) {
            if max.as_f64().is_none() {
                return Err(Error::TypeMismatch(format!(
                    "NEAR max distance must be a number, got {}",
                    max.type_name()
                )));
            }
        }
        if self.metric_argument {
            bind_metric_literal(args.get_mut(3))?;
        }
        Ok(())
    }

    fn call(&self, args: &[Option<&Value>]) -> Result<Option<Value>> {
        let (stored, target, max, metric) = match (args, self.metric_argument) {
            ([stored, target, max], false) => (*stored, *target, *max, self.metric),
            ([stored, target, max, Some(metric)], true) => {
                (*stored, *target, *max, metric_arg(metric)?)
            }
            ([_, _, _, None], true) => return Ok(None),
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "NEAR expects {} arguments, got {}",
                    self.arity(),
                    args.len()
                )))
            }
        };
        let Some(max) = max else {
            return Ok(None);
        };
        let max = max.as_f64().ok_or_else(|| {
            Error::TypeMismatch(format!(
                "NEAR max distance must be a number, got {}",
                max.type_name()
            ))
        })?;
        Ok(evaluate_with(metric, stored, target)?.map(|d| Value::Bool(f64::from(d) <= max)))
    }
}

/// `DIMENSION(field)`: number of components of a vector field.
#[derive(Debug, Clone, Copy, Default)]
pub struct DimensionOperator;

impl NamedOperator for DimensionOperator {
    fn name(&self) -> &str {
        "DIMENSION"
    }

    fn arity(&self) -> usize {
        1
    }

    fn call(&self, args: &[Option<&Value>]) -> Result<Option<Value>> {
        let [field] = args else {
            return Err(Error::InvalidArgument(format!(
                "DIMENSION expects 1 argument, got {}",
                args.len()
            )));
        };
        Ok(vector_arg(*field).map(|v| Value::Int(v.dimension() as i64)))
    }
}
