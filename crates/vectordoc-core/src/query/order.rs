//! ORDER BY execution.
//!
//! Keys are compared column by column with [`Value::sort_cmp`]. An
//! undefined key sorts after every defined one whatever the direction
//! (NULLS LAST), and full ties keep scan order. When the query has a LIMIT
//! the sort runs through a [`BoundedHeap`] of `offset + limit` rows instead
//! of materializing the whole stream.

use std::cmp::Ordering;
use std::sync::Arc;

use super::heap::BoundedHeap;
use crate::document::Document;
use crate::error::Result;
use crate::expr::CompiledExpr;
use crate::value::Value;

/// Compares two key tuples under per-column directions.
pub(crate) fn compare_keys(a: &[Option<Value>], b: &[Option<Value>], descending: &[bool]) -> Ordering {
    for ((ka, kb), desc) in a.iter().zip(b).zip(descending) {
        let ord = match (ka, kb) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(va), Some(vb)) => {
                let ord = va.sort_cmp(vb);
                if *desc {
                    ord.reverse()
                } else {
                    ord
                }
            }
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

struct SortRow {
    keys: Vec<Option<Value>>,
    seq: u64,
    doc: Arc<Document>,
    descending: Arc<[bool]>,
}

impl PartialEq for SortRow {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortRow {}

impl PartialOrd for SortRow {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortRow {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_keys(&self.keys, &other.keys, &self.descending).then(self.seq.cmp(&other.seq))
    }
}

/// One ORDER BY column, compiled.
#[derive(Debug, Clone)]
pub struct SortKey {
    /// Key expression.
    pub expr: CompiledExpr,
    /// Sort descending.
    pub descending: bool,
}

/// Sorting stage. Consumes the upstream on the first `next()`.
pub struct OrderBy<I> {
    upstream: Option<I>,
    keys: Vec<CompiledExpr>,
    descending: Arc<[bool]>,
    bound: Option<usize>,
    sorted: std::vec::IntoIter<Arc<Document>>,
}

impl<I> OrderBy<I> {
    /// Wraps `upstream`. `bound` keeps only the first `bound` rows.
    pub fn new(upstream: I, keys: Vec<SortKey>, bound: Option<usize>) -> Self {
        let descending: Arc<[bool]> = keys.iter().map(|k| k.descending).collect();
        Self {
            upstream: Some(upstream),
            keys: keys.into_iter().map(|k| k.expr).collect(),
            descending,
            bound,
            sorted: Vec::new().into_iter(),
        }
    }
}

impl<I> OrderBy<I>
where
    I: Iterator<Item = Result<Arc<Document>>>,
{
    fn row(&self, doc: Arc<Document>, seq: u64) -> Result<SortRow> {
        let keys = self
            .keys
            .iter()
            .map(|k| k.eval_owned(&doc))
            .collect::<Result<Vec<_>>>()?;
        Ok(SortRow {
            keys,
            seq,
            doc,
            descending: Arc::clone(&self.descending),
        })
    }

    fn sort(&self, upstream: I) -> Result<Vec<Arc<Document>>> {
        let rows = upstream
            .zip(0u64..)
            .map(|(row, seq)| row.and_then(|doc| self.row(doc, seq)));

        let sorted = match self.bound {
            Some(bound) => {
                let mut heap = BoundedHeap::new(bound);
                for row in rows {
                    heap.push(row?);
                }
                heap.into_sorted_vec()
            }
            None => {
                let mut all = rows.collect::<Result<Vec<_>>>()?;
                all.sort();
                all
            }
        };
        Ok(sorted.into_iter().map(|r| r.doc).collect())
    }
}

impl<I> Iterator for OrderBy<I>
where
    I: Iterator<Item = Result<Arc<Document>>>,
{
    type Item = Result<Arc<Document>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(upstream) = self.upstream.take() {
            if self.bound == Some(0) {
                return None;
            }
            match self.sort(upstream) {
                Ok(sorted) => self.sorted = sorted.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
        self.sorted.next().map(Ok)
    }
}
