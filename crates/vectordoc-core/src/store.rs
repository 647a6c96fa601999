//! In-memory database of named collections.
//!
//! Each collection keeps its documents in an `Arc<BTreeMap>` that writers
//! replace copy-on-write. A [`Snapshot`] holds one version of that map, so
//! a running query never sees inserts, updates or deletes made after it
//! started.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::config::Config;
use crate::docql;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::expr::{NamedOperator, OperatorRegistry, Params};
use crate::query::{self, QueryBuilder, QueryCursor, QueryPlan};

type DocMap = BTreeMap<u64, Arc<Document>>;

/// Embedded document database.
pub struct Database {
    config: Config,
    registry: RwLock<Arc<OperatorRegistry>>,
    collections: RwLock<FxHashMap<String, Collection>>,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    /// Creates an empty database with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::build(Config::default())
    }

    /// Creates an empty database with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration does not validate.
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: Config) -> Self {
        let registry = OperatorRegistry::with_builtins(config.query.default_metric);
        Self {
            config,
            registry: RwLock::new(Arc::new(registry)),
            collections: RwLock::new(FxHashMap::default()),
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Registers an operator for all queries started afterwards.
    ///
    /// Replaces any operator with the same name and arity, built-ins
    /// included.
    pub fn register_operator(&self, operator: impl NamedOperator + 'static) {
        let mut guard = self.registry.write();
        Arc::make_mut(&mut guard).register(operator);
    }

    /// Current operator table.
    #[must_use]
    pub fn operators(&self) -> Arc<OperatorRegistry> {
        Arc::clone(&self.registry.read())
    }

    /// Creates a collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CollectionExists`] if the name is taken.
    pub fn create_collection(&self, name: &str) -> Result<Collection> {
        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Err(Error::CollectionExists(name.to_string()));
        }
        let collection = Collection::new(name);
        collections.insert(name.to_string(), collection.clone());
        tracing::info!(collection = name, "collection created");
        Ok(collection)
    }

    /// Looks up a collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CollectionNotFound`] if it does not exist.
    pub fn collection(&self, name: &str) -> Result<Collection> {
        self.collections
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))
    }

    /// Drops a collection. Snapshots already taken stay readable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CollectionNotFound`] if it does not exist.
    pub fn drop_collection(&self, name: &str) -> Result<()> {
        self.collections
            .write()
            .remove(name)
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))?;
        tracing::info!(collection = name, "collection dropped");
        Ok(())
    }

    /// Names of all collections, sorted.
    #[must_use]
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Starts a fluent query on `collection`.
    #[must_use]
    pub fn query(&self, collection: impl Into<String>) -> QueryBuilder<'_> {
        QueryBuilder::new(self, collection)
    }

    /// Parses and runs a `DocQL` statement.
    ///
    /// ```
    /// use vectordoc_core::{Database, Document, Params};
    ///
    /// let db = Database::new();
    /// let docs = db.create_collection("docs")?;
    /// docs.insert(Document::new(1).with("embedding", vec![1.0_f32, 0.0]))?;
    /// docs.insert(Document::new(2).with("embedding", vec![0.0_f32, 1.0]))?;
    ///
    /// let hits = db
    ///     .execute(
    ///         "SELECT * FROM docs WHERE NEAR(embedding, [1, 0], 0.3)",
    ///         &Params::new(),
    ///     )?
    ///     .collect::<Result<Vec<_>, _>>()?;
    /// assert_eq!(hits.len(), 1);
    /// assert_eq!(hits[0].id, 1);
    /// # Ok::<(), vectordoc_core::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns parse, plan and binding errors. Errors met while scanning
    /// come out of the cursor instead.
    pub fn execute(&self, sql: &str, params: &Params) -> Result<QueryCursor> {
        let plan = docql::Parser::parse(sql)?.into_plan()?;
        self.execute_plan(&plan, params)
    }

    /// Runs a plan against a fresh snapshot of its collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CollectionNotFound`] and binding errors.
    pub fn execute_plan(&self, plan: &QueryPlan, params: &Params) -> Result<QueryCursor> {
        let snapshot = self.collection(&plan.collection)?.snapshot();
        let registry = self.operators();
        query::execute(plan, snapshot, &registry, &self.config, params)
    }
}

struct CollectionInner {
    name: String,
    docs: RwLock<Arc<DocMap>>,
}

/// Handle to a collection. Cheap to clone; clones share data.
#[derive(Clone)]
pub struct Collection {
    inner: Arc<CollectionInner>,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.inner.name)
            .field("len", &self.len())
            .finish()
    }
}

impl Collection {
    fn new(name: &str) -> Self {
        Self {
            inner: Arc::new(CollectionInner {
                name: name.to_string(),
                docs: RwLock::new(Arc::new(DocMap::new())),
            }),
        }
    }

    /// Collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Inserts a new document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DocumentExists`] if the id is already present.
    pub fn insert(&self, doc: Document) -> Result<()> {
        let mut guard = self.inner.docs.write();
        if guard.contains_key(&doc.id) {
            return Err(Error::DocumentExists(doc.id));
        }
        Arc::make_mut(&mut guard).insert(doc.id, Arc::new(doc));
        Ok(())
    }

    /// Inserts or replaces a document. Returns the replaced version.
    pub fn upsert(&self, doc: Document) -> Option<Arc<Document>> {
        let mut guard = self.inner.docs.write();
        Arc::make_mut(&mut guard).insert(doc.id, Arc::new(doc))
    }

    /// Removes a document. Returns true if it existed.
    pub fn delete(&self, id: u64) -> bool {
        let mut guard = self.inner.docs.write();
        if !guard.contains_key(&id) {
            return false;
        }
        Arc::make_mut(&mut guard).remove(&id).is_some()
    }

    /// Current version of a document.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<Arc<Document>> {
        self.inner.docs.read().get(&id).cloned()
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.docs.read().len()
    }

    /// Returns true if the collection has no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.docs.read().is_empty()
    }

    /// Point-in-time view of the collection.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            docs: Arc::clone(&self.inner.docs.read()),
        }
    }
}

/// Immutable view of a collection at one point in time.
#[derive(Clone, Default)]
pub struct Snapshot {
    docs: Arc<DocMap>,
}

impl Snapshot {
    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Returns true if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Document by id.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&Arc<Document>> {
        self.docs.get(&id)
    }

    /// Documents in scan order (ascending id).
    #[must_use]
    pub fn iter(&self) -> SnapshotIter {
        self.clone().into_iter()
    }
}

impl IntoIterator for Snapshot {
    type Item = Arc<Document>;
    type IntoIter = SnapshotIter;

    fn into_iter(self) -> SnapshotIter {
        SnapshotIter {
            docs: self.docs,
            cursor: Bound::Unbounded,
        }
    }
}

/// Owning scan over a [`Snapshot`].
pub struct SnapshotIter {
    docs: Arc<DocMap>,
    cursor: Bound<u64>,
}

impl Iterator for SnapshotIter {
    type Item = Arc<Document>;

    fn next(&mut self) -> Option<Arc<Document>> {
        let (id, doc) = self.docs.range((self.cursor, Bound::Unbounded)).next()?;
        self.cursor = Bound::Excluded(*id);
        Some(Arc::clone(doc))
    }
}
