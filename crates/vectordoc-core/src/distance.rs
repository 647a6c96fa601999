//! Distance metrics for vector similarity calculations.
//!
//! Every metric is expressed as a *distance*: lower means closer, so all
//! retrieval operators sort ascending regardless of the metric chosen.
//!
//! | Metric       | Value                          | Range          |
//! |--------------|--------------------------------|----------------|
//! | `Cosine`     | `1 - dot(a,b) / (|a| * |b|)`   | `[0, 2]`       |
//! | `Euclidean`  | `sqrt(sum((a_i - b_i)^2))`     | `[0, inf)`     |
//! | `DotProduct` | `-dot(a,b)`                    | `(-inf, inf)`  |
//!
//! All metrics accumulate in `f64` in a single pass over the components and
//! return `f32`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vector::Vector;

/// Cosine distance reported when either vector has zero norm.
///
/// The direction of a zero vector is undefined, so it is treated as
/// maximally distant instead of producing NaN.
pub const ZERO_NORM_COSINE_DISTANCE: f32 = 2.0;

/// Distance metric for vector similarity calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Cosine distance (`1 - cosine_similarity`).
    /// Best for text embeddings where magnitude carries no meaning.
    #[default]
    Cosine,

    /// Euclidean distance (L2 norm of the difference).
    /// Best for spatial data and when magnitude matters.
    Euclidean,

    /// Negated inner product.
    /// Best for maximum inner product search over pre-normalized vectors.
    DotProduct,
}

impl DistanceMetric {
    /// All supported metrics.
    pub const ALL: [Self; 3] = [Self::Cosine, Self::Euclidean, Self::DotProduct];

    /// Calculates the distance between two vectors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the dimensions differ; `a` is
    /// taken as the expected (query) side.
    #[inline]
    pub fn distance(&self, a: &Vector, b: &Vector) -> Result<f32> {
        self.distance_slices(a.as_slice(), b.as_slice())
    }

    /// Slice form of [`DistanceMetric::distance`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the lengths differ.
    pub fn distance_slices(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        if a.len() != b.len() {
            return Err(Error::DimensionMismatch {
                expected: a.len(),
                actual: b.len(),
            });
        }
        Ok(match self {
            Self::Cosine => cosine_distance(a, b),
            Self::Euclidean => euclidean_distance(a, b),
            Self::DotProduct => dot_distance(a, b),
        })
    }

    /// Canonical lower-case name (`"cosine"`, `"euclidean"`, `"dot_product"`).
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::DotProduct => "dot_product",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistanceMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" | "cos" => Ok(Self::Cosine),
            "euclidean" | "l2" => Ok(Self::Euclidean),
            "dot" | "dot_product" | "dotproduct" | "inner_product" | "ip" => Ok(Self::DotProduct),
            other => Err(Error::InvalidArgument(format!(
                "unknown distance metric '{other}' (expected cosine, euclidean or dot_product)"
            ))),
        }
    }
}

/// Single pass over both vectors: dot product and both squared norms.
#[inline]
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return ZERO_NORM_COSINE_DISTANCE;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    #[allow(clippy::cast_possible_truncation)]
    let distance = (1.0 - similarity).clamp(0.0, 2.0) as f32;
    distance
}

#[inline]
fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum();
    #[allow(clippy::cast_possible_truncation)]
    let distance = sum.sqrt() as f32;
    distance
}

#[inline]
fn dot_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    #[allow(clippy::cast_possible_truncation)]
    let distance = -dot as f32;
    distance
}
