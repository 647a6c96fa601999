//! Exact k-nearest selection over a document stream.

use std::cmp::Ordering;
use std::sync::Arc;

use super::heap::BoundedHeap;
use super::ordered_float::OrderedFloat;
use crate::distance::DistanceMetric;
use crate::document::Document;
use crate::error::Result;
use crate::vector::Vector;

/// Heap entry ordered by distance, then by scan position.
struct Candidate {
    distance: OrderedFloat,
    seq: u64,
    doc: Arc<Document>,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .cmp(&other.distance)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Yields the `k` upstream documents closest to `target`, nearest first.
///
/// Nothing is read until the first `next()`, which then consumes the whole
/// upstream. Equal distances keep scan order. With `k == 0` the upstream is
/// never touched.
pub struct TopKNear<I> {
    upstream: Option<I>,
    field: String,
    target: Vector,
    k: usize,
    metric: DistanceMetric,
    ranked: std::vec::IntoIter<Arc<Document>>,
}

impl<I> TopKNear<I> {
    /// Wraps `upstream`.
    pub fn new(
        upstream: I,
        field: impl Into<String>,
        target: Vector,
        k: usize,
        metric: DistanceMetric,
    ) -> Self {
        Self {
            upstream: Some(upstream),
            field: field.into(),
            target,
            k,
            metric,
            ranked: Vec::new().into_iter(),
        }
    }
}

impl<I> TopKNear<I>
where
    I: Iterator<Item = Result<Arc<Document>>>,
{
    fn select(&self, upstream: I) -> Result<Vec<Arc<Document>>> {
        let mut heap = BoundedHeap::new(self.k);
        let mut seq = 0u64;
        for row in upstream {
            let doc = row?;
            let Some(stored) = Vector::try_extract(&doc, &self.field) else {
                continue;
            };
            let distance = self.metric.distance(&self.target, &stored)?;
            let candidate = Candidate {
                distance: OrderedFloat(distance),
                seq,
                doc,
            };
            seq += 1;
            if let Some(out) = heap.push(candidate) {
                if out.seq + 1 != seq {
                    tracing::trace!(
                        evicted = out.doc.id,
                        distance = out.distance.0,
                        "top-k candidate evicted"
                    );
                }
            }
        }
        tracing::debug!(
            k = self.k,
            scanned = seq,
            kept = heap.len(),
            "top-k selection complete"
        );
        Ok(heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| c.doc)
            .collect())
    }
}

impl<I> Iterator for TopKNear<I>
where
    I: Iterator<Item = Result<Arc<Document>>>,
{
    type Item = Result<Arc<Document>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(upstream) = self.upstream.take() {
            if self.k == 0 {
                return None;
            }
            match self.select(upstream) {
                Ok(ranked) => self.ranked = ranked.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
        self.ranked.next().map(Ok)
    }
}

/// Converts a signed count from query text into a heap capacity.
///
/// Non-positive counts select nothing; counts beyond `usize` saturate.
#[must_use]
pub fn top_k_count(k: i64) -> usize {
    if k <= 0 {
        0
    } else {
        usize::try_from(k).unwrap_or(usize::MAX)
    }
}
