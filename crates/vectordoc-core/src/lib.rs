//! # `vectordoc` Core
//!
//! Vector-augmented query execution for an embedded document store.
//!
//! Documents carry fixed-length `f32` embeddings next to ordinary fields.
//! Queries filter or rank them by similarity to a query vector with an
//! exact scan; there is no background index to build or keep in sync.
//!
//! ## Features
//!
//! - **3 Distance Metrics**: Cosine, Euclidean, Dot Product
//! - **Near-filter**: keep documents within a distance of a query vector
//! - **Top-k**: the k nearest documents in O(n log k) time and O(k) memory
//! - **Two surfaces**: a fluent builder and `DocQL`, lowering to one plan
//! - **Snapshot scans**: a running query never sees later writes
//!
//! ## Quick Start
//!
//! ```rust
//! use vectordoc_core::{Database, Document, Expr, Params};
//!
//! let db = Database::new();
//! let articles = db.create_collection("articles")?;
//! articles.insert(Document::new(1).with("lang", "en").with("embedding", vec![1.0_f32, 0.0]))?;
//! articles.insert(Document::new(2).with("lang", "en").with("embedding", vec![0.0_f32, 1.0]))?;
//! articles.insert(Document::new(3).with("lang", "fr").with("embedding", vec![1.0_f32, 1.0]))?;
//!
//! // Builder
//! let close = db
//!     .query("articles")
//!     .filter(Expr::field("lang").eq("en"))
//!     .where_near("embedding", vec![1.0_f32, 0.0], 0.3)
//!     .to_vec()?;
//! assert_eq!(close.len(), 1);
//!
//! // DocQL
//! let nearest: Vec<_> = db
//!     .execute("SELECT * FROM articles WHERE TOP_K(embedding, [1, 0], 2)", &Params::new())?
//!     .collect::<Result<_, _>>()?;
//! assert_eq!(nearest.iter().map(|d| d.id).collect::<Vec<_>>(), vec![1, 3]);
//! # Ok::<(), vectordoc_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::derive_partial_eq_without_eq)]
#![allow(clippy::redundant_pub_crate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_pass_by_value)]

pub mod config;
pub mod distance;
pub mod docql;
pub mod document;
pub mod error;
pub mod expr;
#[cfg(test)]
mod expr_tests;
pub mod logging;
pub mod query;
pub mod store;
pub mod value;
pub mod vector;

pub use config::{Config, ConfigError};
pub use distance::DistanceMetric;
pub use document::Document;
pub use error::{Error, Result};
pub use expr::{CompareOp, Expr, NamedOperator, OperatorRegistry, Params};
pub use query::{QueryBuilder, QueryCursor, QueryPlan, SelectItem};
pub use store::{Collection, Database, Snapshot};
pub use value::{Object, Value};
pub use vector::Vector;
