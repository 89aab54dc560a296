//! Priority queues for graph search.
//!
//! - `MaxHeap`: bounded result set, evicts the largest distance
//! - `MinHeap`: candidate frontier, yields the smallest distance first

use crate::types::{IdType, VectorElement};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Upper bound on the entries reserved up front; heaps grow past it on demand.
const MAX_PREALLOCATED: usize = 4096;

/// An entry in the priority queue containing an ID and distance.
#[derive(Debug, Clone, Copy)]
pub struct HeapEntry<D: VectorElement> {
    pub id: IdType,
    pub distance: D,
}

impl<D: VectorElement> HeapEntry<D> {
    #[inline]
    pub fn new(id: IdType, distance: D) -> Self {
        Self { id, distance }
    }
}

#[inline]
fn cmp_distance<D: VectorElement>(a: D, b: D) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Wrapper for max-heap ordering (largest distance at top).
#[derive(Debug, Clone, Copy)]
struct MaxHeapEntry<D: VectorElement>(HeapEntry<D>);

impl<D: VectorElement> PartialEq for MaxHeapEntry<D> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<D: VectorElement> Eq for MaxHeapEntry<D> {}

impl<D: VectorElement> PartialOrd for MaxHeapEntry<D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<D: VectorElement> Ord for MaxHeapEntry<D> {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_distance(self.0.distance, other.0.distance).then(self.0.id.cmp(&other.0.id))
    }
}

/// Wrapper for min-heap ordering (smallest distance at top).
#[derive(Debug, Clone, Copy)]
struct MinHeapEntry<D: VectorElement>(HeapEntry<D>);

impl<D: VectorElement> PartialEq for MinHeapEntry<D> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<D: VectorElement> Eq for MinHeapEntry<D> {}

impl<D: VectorElement> PartialOrd for MinHeapEntry<D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<D: VectorElement> Ord for MinHeapEntry<D> {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_distance(other.0.distance, self.0.distance).then(other.0.id.cmp(&self.0.id))
    }
}

/// A max-heap that keeps the `capacity` smallest elements by evicting the largest.
#[derive(Debug)]
pub struct MaxHeap<D: VectorElement> {
    heap: BinaryHeap<MaxHeapEntry<D>>,
    capacity: usize,
}

impl<D: VectorElement> MaxHeap<D> {
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity.saturating_add(1).min(MAX_PREALLOCATED)),
            capacity,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// Get the largest distance in the heap (top element).
    #[inline]
    pub fn top_distance(&self) -> Option<D> {
        self.heap.peek().map(|e| e.0.distance)
    }

    /// Insert if there is room or if `distance` beats the current maximum.
    #[inline]
    pub fn try_insert(&mut self, id: IdType, distance: D) -> bool {
        if self.heap.len() < self.capacity {
            self.heap.push(MaxHeapEntry(HeapEntry::new(id, distance)));
            true
        } else if let Some(mut top) = self.heap.peek_mut() {
            if distance < top.0.distance {
                *top = MaxHeapEntry(HeapEntry::new(id, distance));
                true
            } else {
                false
            }
        } else {
            false
        }
    }

    /// Pop the largest element.
    #[inline]
    pub fn pop(&mut self) -> Option<HeapEntry<D>> {
        self.heap.pop().map(|e| e.0)
    }

    /// Convert to a vector sorted by ascending distance.
    pub fn into_sorted_vec(self) -> Vec<HeapEntry<D>> {
        self.heap.into_sorted_vec().into_iter().map(|e| e.0).collect()
    }
}

/// A min-heap used as the exploration frontier.
#[derive(Debug, Default)]
pub struct MinHeap<D: VectorElement> {
    heap: BinaryHeap<MinHeapEntry<D>>,
}

impl<D: VectorElement> MinHeap<D> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity.min(MAX_PREALLOCATED)),
        }
    }

    #[inline]
    pub fn push(&mut self, id: IdType, distance: D) {
        self.heap.push(MinHeapEntry(HeapEntry::new(id, distance)));
    }

    #[inline]
    pub fn pop(&mut self) -> Option<HeapEntry<D>> {
        self.heap.pop().map(|e| e.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
