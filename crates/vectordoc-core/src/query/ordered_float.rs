//! Ordered float wrapper for use in `BinaryHeap`.
//!
//! Uses `f32::total_cmp`: -NaN < -inf < ... < -0 < +0 < ... < +inf < +NaN.

use std::cmp::Ordering;

/// `f32` with a total order, so distances can key a heap.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OrderedFloat(pub f32);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        // Bit comparison agrees with total_cmp (NaN == NaN, -0.0 != +0.0).
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for OrderedFloat {}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
