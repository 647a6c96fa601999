//! Fixed-length embedding value.
//!
//! A [`Vector`] is an immutable, non-empty sequence of finite `f32`
//! components. It is cheap to clone (the buffer is shared) and compares and
//! hashes by its component bits, so it can live inside a document value tree
//! or be bound once as a query target.
//!
//! Three input shapes are accepted wherever a vector is read:
//! - a native `Vector` (`Value::Vector`),
//! - a generic list of numbers (`Value::Array` / JSON array),
//! - a JSON-style bracketed text such as `"[0.1, 0.2]"`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::value::Value;

/// Immutable embedding vector.
#[derive(Clone)]
pub struct Vector {
    components: Arc<[f32]>,
}

impl Vector {
    /// Creates a vector from raw components.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyVector`] if `components` is empty.
    /// - [`Error::TypeMismatch`] if a component is NaN or infinite.
    pub fn new(components: impl Into<Vec<f32>>) -> Result<Self> {
        let components = components.into();
        if components.is_empty() {
            return Err(Error::EmptyVector);
        }
        if let Some(pos) = components.iter().position(|c| !c.is_finite()) {
            return Err(Error::TypeMismatch(format!(
                "vector component {pos} is not a finite number"
            )));
        }
        Ok(Self {
            components: components.into(),
        })
    }

    /// Casts a generic list of values into a vector.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyVector`] if `values` is empty.
    /// - [`Error::TypeMismatch`] if any element is not numeric or does not
    ///   fit in a finite `f32`.
    pub fn from_values(values: &[Value]) -> Result<Self> {
        let components = values
            .iter()
            .enumerate()
            .map(|(pos, value)| match value {
                Value::Int(i) => Ok(*i as f32),
                Value::Double(d) => narrow(*d, pos),
                other => Err(Error::TypeMismatch(format!(
                    "vector component {pos} is {}, expected a number",
                    other.type_name()
                ))),
            })
            .collect::<Result<Vec<f32>>>()?;
        Self::new(components)
    }

    /// Casts a JSON value (numeric array or bracketed text) into a vector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for any other JSON shape or a
    /// non-numeric element, [`Error::EmptyVector`] for `[]`.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Array(items) => {
                let components = items
                    .iter()
                    .enumerate()
                    .map(|(pos, item)| {
                        item.as_f64().map_or_else(
                            || {
                                Err(Error::TypeMismatch(format!(
                                    "vector component {pos} is not a number: {item}"
                                )))
                            },
                            |f| narrow(f, pos),
                        )
                    })
                    .collect::<Result<Vec<f32>>>()?;
                Self::new(components)
            }
            serde_json::Value::String(text) => Self::parse_bracketed(text),
            other => Err(Error::TypeMismatch(format!(
                "expected a numeric array, got {other}"
            ))),
        }
    }

    /// Parses a JSON-style bracketed numeric array, e.g. `"[1.0, 0.0]"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the text is not a bracketed array
    /// of numbers.
    pub fn parse_bracketed(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if !(trimmed.starts_with('[') && trimmed.ends_with(']')) {
            return Err(Error::TypeMismatch(format!(
                "'{trimmed}' is not a bracketed numeric array"
            )));
        }
        let json: serde_json::Value = serde_json::from_str(trimmed)
            .map_err(|e| Error::TypeMismatch(format!("invalid vector literal: {e}")))?;
        Self::from_json(&json)
    }

    /// Reads `path` from `document` and casts it to a vector.
    ///
    /// Returns `None` when the field is missing or not vector-shaped, so bulk
    /// operators can skip the document instead of failing the scan.
    #[must_use]
    pub fn try_extract(document: &Document, path: &str) -> Option<Self> {
        document.get_path(path).and_then(Value::as_vector)
    }

    /// Number of components.
    #[must_use]
    #[inline]
    pub fn dimension(&self) -> usize {
        self.components.len()
    }

    /// Components as a slice.
    #[must_use]
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.components
    }

    /// Copies the components out. Inverse of [`Vector::new`].
    #[must_use]
    pub fn to_array(&self) -> Vec<f32> {
        self.components.to_vec()
    }

    /// Generic array representation (`Value::Array` of doubles).
    ///
    /// Every `f32` is exactly representable as `f64`, so
    /// `Vector::from_values` on the result yields an equal vector.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.components
                .iter()
                .map(|c| Value::Double(f64::from(*c)))
                .collect(),
        )
    }

    /// Squared L2 norm, accumulated in `f64`.
    #[must_use]
    pub fn norm_squared(&self) -> f64 {
        self.components
            .iter()
            .map(|c| f64::from(*c) * f64::from(*c))
            .sum()
    }
}

/// Narrows a JSON/double number to `f32`, rejecting values `f32` cannot hold.
fn narrow(value: f64, pos: usize) -> Result<f32> {
    if value.is_finite() && value.abs() <= f64::from(f32::MAX) {
        #[allow(clippy::cast_possible_truncation)]
        Ok(value as f32)
    } else {
        Err(Error::TypeMismatch(format!(
            "vector component {pos} ({value}) is out of f32 range"
        )))
    }
}

impl PartialEq for Vector {
    fn eq(&self, other: &Self) -> bool {
        // Bitwise, to stay consistent with Hash.
        self.components.len() == other.components.len()
            && self
                .components
                .iter()
                .zip(other.components.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Eq for Vector {}

impl Hash for Vector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.components.len().hash(state);
        for c in self.components.iter() {
            c.to_bits().hash(state);
        }
    }
}

impl fmt::Debug for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Vector").field(&self.as_slice()).finish()
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, c) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{c:?}")?;
        }
        f.write_str("]")
    }
}

impl AsRef<[f32]> for Vector {
    fn as_ref(&self) -> &[f32] {
        self.as_slice()
    }
}

impl TryFrom<Vec<f32>> for Vector {
    type Error = Error;

    fn try_from(components: Vec<f32>) -> Result<Self> {
        Self::new(components)
    }
}

impl TryFrom<&[f32]> for Vector {
    type Error = Error;

    fn try_from(components: &[f32]) -> Result<Self> {
        Self::new(components.to_vec())
    }
}

impl TryFrom<&Value> for Vector {
    type Error = Error;

    /// Strict cast used when binding a query target: unlike
    /// [`Value::as_vector`], the reason for a failure is kept.
    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::Vector(v) => Ok(v.clone()),
            Value::Array(items) => Self::from_values(items),
            Value::String(text) => Self::parse_bracketed(text),
            other => Err(Error::TypeMismatch(format!(
                "expected a vector, got {}",
                other.type_name()
            ))),
        }
    }
}

impl TryFrom<&serde_json::Value> for Vector {
    type Error = Error;

    fn try_from(json: &serde_json::Value) -> Result<Self> {
        Self::from_json(json)
    }
}

impl Serialize for Vector {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Vector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let components = Vec::<f32>::deserialize(deserializer)?;
        Self::new(components).map_err(serde::de::Error::custom)
    }
}
