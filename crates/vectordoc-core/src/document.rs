//! Document data structure: an id plus an ordered map of fields.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::{Object, Value};

/// Reserved path that resolves to the document id in expressions.
pub const ID_FIELD: &str = "_id";

/// A document in a collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier within the collection.
    pub id: u64,

    /// Top-level fields.
    #[serde(default)]
    pub fields: Object,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            fields: Object::new(),
        }
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Creates a document from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if `json` is not an object.
    pub fn from_json(id: u64, json: serde_json::Value) -> Result<Self> {
        match Value::from(json) {
            Value::Object(fields) => Ok(Self { id, fields }),
            other => Err(Error::TypeMismatch(format!(
                "document body must be an object, got {}",
                other.type_name()
            ))),
        }
    }

    /// Sets a top-level field, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Reads a field by dot-separated path.
    ///
    /// Segments walk object keys; numeric segments index into arrays.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let top = self.fields.get(head)?;
        match rest {
            Some(rest) => top.get_path(rest),
            None => Some(top),
        }
    }

    /// JSON view of the body, with the id under `_id`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(self.fields.len() + 1);
        map.insert(ID_FIELD.to_string(), serde_json::Value::from(self.id));
        for (k, v) in &self.fields {
            map.insert(k.clone(), v.to_json());
        }
        serde_json::Value::Object(map)
    }
}
