//! Lazy result cursor.

use std::sync::Arc;

use super::Rows;
use crate::document::Document;
use crate::error::Result;
use crate::expr::CompiledExpr;
use crate::value::{Object, Value};

/// Lazily evaluated query results.
///
/// Each `next()` pulls just enough of the pipeline to produce one row;
/// top-k and ORDER BY stages consume their input on the first pull. After
/// an error the cursor is exhausted. Dropping it releases the snapshot.
pub struct QueryCursor {
    collection: Arc<str>,
    rows: Rows,
    projection: Option<Vec<(String, CompiledExpr)>>,
    emitted: usize,
    done: bool,
}

impl QueryCursor {
    pub(crate) fn new(
        collection: Arc<str>,
        rows: Rows,
        projection: Option<Vec<(String, CompiledExpr)>>,
    ) -> Self {
        Self {
            collection,
            rows,
            projection,
            emitted: 0,
            done: false,
        }
    }

    /// Collection the cursor reads.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Rows returned so far.
    #[must_use]
    pub const fn emitted(&self) -> usize {
        self.emitted
    }

    fn project(&self, doc: Arc<Document>) -> Result<Document> {
        let Some(columns) = &self.projection else {
            return Ok(Arc::unwrap_or_clone(doc));
        };
        let mut fields = Object::with_capacity(columns.len());
        for (name, expr) in columns {
            let value = expr.eval_owned(&doc)?.unwrap_or(Value::Null);
            fields.insert(name.clone(), value);
        }
        Ok(Document { id: doc.id, fields })
    }
}

impl Iterator for QueryCursor {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = match self.rows.next() {
            Some(row) => row.and_then(|doc| self.project(doc)),
            None => {
                self.done = true;
                tracing::debug!(
                    collection = %self.collection,
                    rows = self.emitted,
                    "cursor exhausted"
                );
                return None;
            }
        };
        match &result {
            Ok(_) => self.emitted += 1,
            Err(e) => {
                self.done = true;
                if e.is_query_fault() {
                    tracing::warn!(
                        collection = %self.collection,
                        code = e.code(),
                        error = %e,
                        "query aborted"
                    );
                }
            }
        }
        Some(result)
    }
}

impl std::fmt::Debug for QueryCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCursor")
            .field("collection", &self.collection)
            .field("emitted", &self.emitted)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
