//! `DocQL`: the textual query surface.
//!
//! A SQL-like SELECT over one collection, with two vector clauses usable as
//! top-level WHERE conditions:
//!
//! ```sql
//! SELECT title, DISTANCE(embedding, $q) AS score
//! FROM articles
//! WHERE lang = 'en' AND NEAR(embedding, $q, 0.25, 'cosine')
//! ORDER BY DISTANCE(embedding, $q)
//! LIMIT 10
//!
//! SELECT * FROM articles WHERE TOP_K(embedding, [0.1, 0.9, 0.0], 5)
//! ```
//!
//! Statements lower to the same [`QueryPlan`](crate::query::QueryPlan) the
//! fluent builder produces.

mod ast;
mod error;
mod parser;

pub use ast::SelectStatement;
pub use error::{ParseError, ParseErrorKind};
pub use parser::Parser;
