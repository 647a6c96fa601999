//! Query planning and execution.
//!
//! A [`QueryPlan`] is bound against a collection snapshot into a chain of
//! lazy iterator stages:
//!
//! ```text
//! scan -> filter -> near* -> top-k -> order by -> offset/limit -> cursor
//! ```
//!
//! Every stage passes `Result` rows through. The first error ends the
//! stream.

mod builder;
mod cursor;
mod exec;
mod heap;
mod near;
mod order;
mod ordered_float;
mod plan;
mod stages;
mod topk;

use std::sync::Arc;

use crate::document::Document;
use crate::error::Result;

pub use builder::QueryBuilder;
pub use cursor::QueryCursor;
pub use exec::execute;
pub use heap::BoundedHeap;
pub use near::NearFilter;
pub use order::{OrderBy, SortKey};
pub use plan::{NearSpec, OrderKey, Projection, QueryPlan, SelectItem, TopKSpec};
pub use stages::{Filter, Paginate};
pub use topk::{top_k_count, TopKNear};

pub(crate) use plan::{canonical_bound, canonical_target};

/// Boxed pipeline stage.
pub(crate) type Rows = Box<dyn Iterator<Item = Result<Arc<Document>>> + Send>;
