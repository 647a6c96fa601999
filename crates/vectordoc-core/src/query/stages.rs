//! Streaming stages without vector logic: predicate filter and paging.

use std::sync::Arc;

use crate::document::Document;
use crate::error::Result;
use crate::expr::CompiledExpr;

/// Keeps documents for which the predicate is defined and true.
pub struct Filter<I> {
    upstream: I,
    predicate: CompiledExpr,
    done: bool,
}

impl<I> Filter<I> {
    /// Wraps `upstream`.
    pub const fn new(upstream: I, predicate: CompiledExpr) -> Self {
        Self {
            upstream,
            predicate,
            done: false,
        }
    }
}

impl<I> Iterator for Filter<I>
where
    I: Iterator<Item = Result<Arc<Document>>>,
{
    type Item = Result<Arc<Document>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let outcome = self
                .upstream
                .next()?
                .and_then(|doc| self.predicate.matches(&doc).map(|hit| hit.then_some(doc)));
            match outcome {
                Ok(Some(doc)) => return Some(Ok(doc)),
                Ok(None) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// OFFSET / LIMIT. Errors pass through without counting as rows.
pub struct Paginate<I> {
    upstream: I,
    skip: usize,
    remaining: Option<usize>,
}

impl<I> Paginate<I> {
    /// Wraps `upstream`.
    pub const fn new(upstream: I, offset: usize, limit: Option<usize>) -> Self {
        Self {
            upstream,
            skip: offset,
            remaining: limit,
        }
    }
}

impl<I> Iterator for Paginate<I>
where
    I: Iterator<Item = Result<Arc<Document>>>,
{
    type Item = Result<Arc<Document>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == Some(0) {
            return None;
        }
        loop {
            match self.upstream.next()? {
                Ok(_) if self.skip > 0 => self.skip -= 1,
                Ok(doc) => {
                    if let Some(n) = self.remaining.as_mut() {
                        *n -= 1;
                    }
                    return Some(Ok(doc));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
