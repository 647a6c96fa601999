//! `DocQL` parser implementation using pest.

mod expressions;
mod select;

use pest::iterators::Pair;
use pest::Parser as PestParser;
use pest_derive::Parser;

use super::ast::SelectStatement;
use super::error::{ParseError, ParseErrorKind};

#[derive(Parser)]
#[grammar = "docql/grammar.pest"]
pub(crate) struct DocQlParser;

/// Name from an `identifier` pair, backticks removed.
pub(crate) fn extract_identifier(pair: &Pair<'_, Rule>) -> String {
    match pair.as_rule() {
        Rule::identifier => pair
            .clone()
            .into_inner()
            .next()
            .map_or_else(|| pair.as_str().to_string(), |inner| extract_identifier(&inner)),
        Rule::backtick_identifier => {
            let s = pair.as_str();
            s[1..s.len() - 1].to_string()
        }
        _ => pair.as_str().to_string(),
    }
}

/// Byte offset of a pair in the statement.
pub(crate) fn position(pair: &Pair<'_, Rule>) -> usize {
    pair.as_span().start()
}

/// `DocQL` statement parser.
pub struct Parser;

impl Parser {
    /// Parses a `DocQL` statement.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the statement is invalid.
    ///
    /// # Example
    ///
    /// ```
    /// use vectordoc_core::docql::Parser;
    ///
    /// let stmt = Parser::parse("SELECT * FROM docs WHERE TOP_K(embedding, [1, 0], 5)")?;
    /// assert_eq!(stmt.collection, "docs");
    /// # Ok::<(), vectordoc_core::docql::ParseError>(())
    /// ```
    pub fn parse(input: &str) -> Result<SelectStatement, ParseError> {
        let pairs = DocQlParser::parse(Rule::query, input).map_err(|e| {
            let position = match e.location {
                pest::error::InputLocation::Pos(p) => p,
                pest::error::InputLocation::Span((s, _)) => s,
            };
            ParseError::new(
                ParseErrorKind::SyntaxError,
                position,
                input.chars().take(50).collect::<String>(),
                e.to_string(),
            )
        })?;

        let query_pair = pairs
            .into_iter()
            .next()
            .ok_or_else(|| ParseError::syntax(0, input, "Empty query"))?;

        Self::parse_query(query_pair)
    }
}
