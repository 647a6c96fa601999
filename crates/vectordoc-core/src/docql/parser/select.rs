//! SELECT statement and clause parsing.

use pest::iterators::Pair;

use super::{extract_identifier, position, Rule};
use crate::docql::ast::SelectStatement;
use crate::docql::error::ParseError;
use crate::docql::Parser;
use crate::query::{OrderKey, Projection, SelectItem};

impl Parser {
    pub(crate) fn parse_query(pair: Pair<'_, Rule>) -> Result<SelectStatement, ParseError> {
        let stmt = pair
            .into_inner()
            .find(|p| p.as_rule() == Rule::select_stmt)
            .ok_or_else(|| ParseError::syntax(0, "", "Expected SELECT statement"))?;
        Self::parse_select_stmt(stmt)
    }

    fn parse_select_stmt(pair: Pair<'_, Rule>) -> Result<SelectStatement, ParseError> {
        let mut projection = Projection::All;
        let mut collection = None;
        let mut where_clause = None;
        let mut order_by = Vec::new();
        let mut limit = None;
        let mut offset = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::select_list => projection = Self::parse_select_list(inner)?,
                Rule::identifier => collection = Some(extract_identifier(&inner)),
                Rule::where_clause => {
                    let expr = inner
                        .into_inner()
                        .find(|p| p.as_rule() == Rule::expr)
                        .ok_or_else(|| ParseError::syntax(0, "", "Expected condition"))?;
                    where_clause = Some(Self::parse_expr(expr)?);
                }
                Rule::order_by_clause => order_by = Self::parse_order_by(inner)?,
                Rule::limit_clause => limit = Some(Self::parse_count(inner)?),
                Rule::offset_clause => offset = Some(Self::parse_count(inner)?),
                _ => {}
            }
        }

        let collection =
            collection.ok_or_else(|| ParseError::syntax(0, "", "Expected collection name"))?;

        Ok(SelectStatement {
            projection,
            collection,
            where_clause,
            order_by,
            limit,
            offset,
        })
    }

    fn parse_select_list(pair: Pair<'_, Rule>) -> Result<Projection, ParseError> {
        let mut items = Vec::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::star => return Ok(Projection::All),
                Rule::select_item => items.push(Self::parse_select_item(inner)?),
                _ => {}
            }
        }
        Ok(Projection::Items(items))
    }

    fn parse_select_item(pair: Pair<'_, Rule>) -> Result<SelectItem, ParseError> {
        let mut expr = None;
        let mut alias = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::expr => expr = Some(Self::parse_expr(inner)?),
                Rule::identifier => alias = Some(extract_identifier(&inner)),
                _ => {}
            }
        }
        let expr = expr.ok_or_else(|| ParseError::syntax(0, "", "Expected select expression"))?;
        Ok(SelectItem { expr, alias })
    }

    fn parse_order_by(pair: Pair<'_, Rule>) -> Result<Vec<OrderKey>, ParseError> {
        pair.into_inner()
            .filter(|p| p.as_rule() == Rule::order_item)
            .map(|item| {
                let mut expr = None;
                let mut descending = false;
                for inner in item.into_inner() {
                    match inner.as_rule() {
                        Rule::expr => expr = Some(Self::parse_expr(inner)?),
                        Rule::kw_desc => descending = true,
                        _ => {}
                    }
                }
                let expr =
                    expr.ok_or_else(|| ParseError::syntax(0, "", "Expected ORDER BY expression"))?;
                Ok(OrderKey { expr, descending })
            })
            .collect()
    }

    fn parse_count(pair: Pair<'_, Rule>) -> Result<usize, ParseError> {
        let number = pair
            .into_inner()
            .find(|p| p.as_rule() == Rule::integer)
            .ok_or_else(|| ParseError::syntax(0, "", "Expected integer"))?;
        number.as_str().parse::<usize>().map_err(|_| {
            ParseError::invalid_literal(position(&number), number.as_str(), "Count out of range")
        })
    }
}
