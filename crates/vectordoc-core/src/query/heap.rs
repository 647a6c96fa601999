//! Bounded max-heap shared by top-k selection and `ORDER BY ... LIMIT`.

use std::collections::BinaryHeap;

/// Keeps the `capacity` smallest items pushed into it.
///
/// The heap root is the worst item kept so far. A new item displaces it
/// only when strictly smaller, so among equal items the earliest pushed
/// wins. Callers that need stable ties put a scan sequence number in the
/// item's ordering.
#[derive(Debug)]
pub struct BoundedHeap<T: Ord> {
    capacity: usize,
    heap: BinaryHeap<T>,
}

impl<T: Ord> BoundedHeap<T> {
    /// Creates an empty heap. Allocation is capped so a huge `capacity`
    /// does not reserve memory up front.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity.min(1024)),
        }
    }

    /// Maximum number of items kept.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of items currently kept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true if nothing is kept.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Worst item kept so far.
    #[must_use]
    pub fn peek_worst(&self) -> Option<&T> {
        self.heap.peek()
    }

    /// Offers an item. Returns whichever item did not make it: the evicted
    /// previous worst, the rejected `item` itself, or `None` while the heap
    /// is still filling.
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.capacity == 0 {
            return Some(item);
        }
        if self.heap.len() < self.capacity {
            self.heap.push(item);
            return None;
        }
        match self.heap.peek_mut() {
            Some(mut worst) if item < *worst => Some(std::mem::replace(&mut *worst, item)),
            _ => Some(item),
        }
    }

    /// Consumes the heap, returning the kept items in ascending order.
    #[must_use]
    pub fn into_sorted_vec(self) -> Vec<T> {
        self.heap.into_sorted_vec()
    }
}
