//! Threshold filter on vector distance.

use std::sync::Arc;

use crate::distance::DistanceMetric;
use crate::document::Document;
use crate::error::Result;
use crate::vector::Vector;

/// Streams the upstream documents whose vector at `field` lies within
/// `max_distance` of `target`.
///
/// Documents without a vector-shaped value at `field` are skipped. A stored
/// vector of the wrong dimension is reported once as an error, after which
/// the iterator is exhausted. Upstream order is preserved.
pub struct NearFilter<I> {
    upstream: I,
    field: String,
    target: Vector,
    max_distance: f64,
    metric: DistanceMetric,
    done: bool,
}

impl<I> NearFilter<I> {
    /// Wraps `upstream`.
    pub fn new(
        upstream: I,
        field: impl Into<String>,
        target: Vector,
        max_distance: f64,
        metric: DistanceMetric,
    ) -> Self {
        Self {
            upstream,
            field: field.into(),
            target,
            max_distance,
            metric,
            done: false,
        }
    }
}

impl<I> Iterator for NearFilter<I>
where
    I: Iterator<Item = Result<Arc<Document>>>,
{
    type Item = Result<Arc<Document>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let doc = match self.upstream.next()? {
                Ok(doc) => doc,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            let Some(stored) = Vector::try_extract(&doc, &self.field) else {
                continue;
            };
            match self.metric.distance(&self.target, &stored) {
                Ok(d) if f64::from(d) <= self.max_distance => return Some(Ok(doc)),
                Ok(_) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            (0, self.upstream.size_hint().1)
        }
    }
}
