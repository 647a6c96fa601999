//! Expression, literal and vector parsing.

use pest::iterators::Pair;

use super::{extract_identifier, position, Rule};
use crate::docql::error::ParseError;
use crate::docql::Parser;
use crate::expr::{CompareOp, Expr};
use crate::value::Value;

impl Parser {
    pub(crate) fn parse_expr(pair: Pair<'_, Rule>) -> Result<Expr, ParseError> {
        let or_expr = pair
            .into_inner()
            .next()
            .ok_or_else(|| ParseError::syntax(0, "", "Expected expression"))?;
        Self::parse_or_expr(or_expr)
    }

    fn parse_or_expr(pair: Pair<'_, Rule>) -> Result<Expr, ParseError> {
        let mut result: Option<Expr> = None;
        for inner in pair.into_inner() {
            if inner.as_rule() == Rule::and_expr {
                let right = Self::parse_and_expr(inner)?;
                result = Some(match result {
                    Some(left) => left.or(right),
                    None => right,
                });
            }
        }
        result.ok_or_else(|| ParseError::syntax(0, "", "Expected condition"))
    }

    fn parse_and_expr(pair: Pair<'_, Rule>) -> Result<Expr, ParseError> {
        let mut result: Option<Expr> = None;
        for inner in pair.into_inner() {
            if inner.as_rule() == Rule::not_expr {
                let right = Self::parse_not_expr(inner)?;
                result = Some(match result {
                    Some(left) => left.and(right),
                    None => right,
                });
            }
        }
        result.ok_or_else(|| ParseError::syntax(0, "", "Expected condition"))
    }

    fn parse_not_expr(pair: Pair<'_, Rule>) -> Result<Expr, ParseError> {
        let mut negations = 0usize;
        let mut operand = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::kw_not => negations += 1,
                Rule::cmp_expr => operand = Some(Self::parse_cmp_expr(inner)?),
                _ => {}
            }
        }
        let mut expr = operand.ok_or_else(|| ParseError::syntax(0, "", "Expected operand"))?;
        for _ in 0..negations {
            expr = expr.not();
        }
        Ok(expr)
    }

    fn parse_cmp_expr(pair: Pair<'_, Rule>) -> Result<Expr, ParseError> {
        let mut operands = Vec::with_capacity(2);
        let mut op = None;
        let mut null_test = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::unary => operands.push(Self::parse_unary(inner)?),
                Rule::compare_op => op = Some(Self::parse_compare_op(&inner)?),
                Rule::null_test => {
                    null_test = Some(inner.into_inner().any(|p| p.as_rule() == Rule::kw_not));
                }
                _ => {}
            }
        }

        let mut operands = operands.into_iter();
        let left = operands
            .next()
            .ok_or_else(|| ParseError::syntax(0, "", "Expected operand"))?;

        if let Some(negated) = null_test {
            return Ok(Expr::IsNull {
                expr: Box::new(left),
                negated,
            });
        }
        match (op, operands.next()) {
            (Some(op), Some(right)) => Ok(Expr::Compare {
                op,
                left: Box::new(left),
                right: Box::new(right),
            }),
            (None, None) => Ok(left),
            _ => Err(ParseError::syntax(0, "", "Incomplete comparison")),
        }
    }

    fn parse_compare_op(pair: &Pair<'_, Rule>) -> Result<CompareOp, ParseError> {
        match pair.as_str() {
            "=" => Ok(CompareOp::Eq),
            "!=" | "<>" => Ok(CompareOp::NotEq),
            ">" => Ok(CompareOp::Gt),
            ">=" => Ok(CompareOp::Gte),
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::Lte),
            other => Err(ParseError::syntax(
                position(pair),
                other,
                "Unknown comparison operator",
            )),
        }
    }

    /// Unary minus folds into numeric literals so `-0.5` is a constant.
    fn parse_unary(pair: Pair<'_, Rule>) -> Result<Expr, ParseError> {
        let mut negations = 0usize;
        let mut operand = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::neg => negations += 1,
                Rule::primary => operand = Some(Self::parse_primary(inner)?),
                _ => {}
            }
        }
        let mut expr = operand.ok_or_else(|| ParseError::syntax(0, "", "Expected operand"))?;
        for _ in 0..negations {
            expr = match expr {
                Expr::Literal(Value::Int(i)) if i != i64::MIN => Expr::Literal(Value::Int(-i)),
                Expr::Literal(Value::Double(d)) => Expr::Literal(Value::Double(-d)),
                other => Expr::Neg(Box::new(other)),
            };
        }
        Ok(expr)
    }

    fn parse_primary(pair: Pair<'_, Rule>) -> Result<Expr, ParseError> {
        let inner = pair
            .into_inner()
            .next()
            .ok_or_else(|| ParseError::syntax(0, "", "Expected primary expression"))?;

        match inner.as_rule() {
            Rule::expr => Self::parse_expr(inner),
            Rule::function_call => Self::parse_function_call(inner),
            Rule::literal => Self::parse_literal(inner).map(Expr::Literal),
            Rule::parameter => Ok(Expr::Parameter(
                inner.as_str().trim_start_matches('$').to_string(),
            )),
            Rule::field_path => Ok(Expr::Field(Self::parse_field_path(&inner))),
            _ => Err(ParseError::syntax(
                position(&inner),
                inner.as_str(),
                "Unknown expression",
            )),
        }
    }

    fn parse_field_path(pair: &Pair<'_, Rule>) -> String {
        pair.clone()
            .into_inner()
            .map(|segment| extract_identifier(&segment))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn parse_function_call(pair: Pair<'_, Rule>) -> Result<Expr, ParseError> {
        let mut name = None;
        let mut args = Vec::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::identifier => name = Some(extract_identifier(&inner)),
                Rule::expr => args.push(Self::parse_expr(inner)?),
                _ => {}
            }
        }
        let name = name.ok_or_else(|| ParseError::syntax(0, "", "Expected function name"))?;
        Ok(Expr::Call { name, args })
    }

    pub(crate) fn parse_literal(pair: Pair<'_, Rule>) -> Result<Value, ParseError> {
        let inner = pair
            .into_inner()
            .next()
            .ok_or_else(|| ParseError::syntax(0, "", "Expected value"))?;

        match inner.as_rule() {
            Rule::integer => inner.as_str().parse::<i64>().map(Value::Int).map_err(|_| {
                ParseError::invalid_literal(position(&inner), inner.as_str(), "Invalid integer")
            }),
            Rule::float => Self::parse_float(&inner).map(Value::Double),
            Rule::string => {
                let s = inner.as_str();
                Ok(Value::String(s[1..s.len() - 1].replace("''", "'")))
            }
            Rule::kw_true => Ok(Value::Bool(true)),
            Rule::kw_false => Ok(Value::Bool(false)),
            Rule::kw_null => Ok(Value::Null),
            Rule::vector_literal => Self::parse_vector_literal(inner),
            _ => Err(ParseError::syntax(
                position(&inner),
                inner.as_str(),
                "Unknown value type",
            )),
        }
    }

    /// `[n, n, ...]` becomes a list of doubles, the same shape a `Vec<f32>`
    /// converts to.
    fn parse_vector_literal(pair: Pair<'_, Rule>) -> Result<Value, ParseError> {
        pair.into_inner()
            .filter(|p| p.as_rule() == Rule::number)
            .map(|n| Self::parse_float(&n).map(Value::Double))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    fn parse_float(pair: &Pair<'_, Rule>) -> Result<f64, ParseError> {
        match pair.as_str().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(ParseError::invalid_literal(
                position(pair),
                pair.as_str(),
                "Invalid number",
            )),
        }
    }
}
