//! Query result types.

use crate::types::{LabelType, VectorElement};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A single query result containing a label and its distance to the query.
#[derive(Debug, Clone, Copy)]
pub struct QueryResult<D: VectorElement> {
    /// The external label of the matching vector.
    pub label: LabelType,
    /// The distance from the query vector to this result.
    pub distance: D,
}

impl<D: VectorElement> QueryResult<D> {
    #[inline]
    pub fn new(label: LabelType, distance: D) -> Self {
        Self { label, distance }
    }
}

impl<D: VectorElement> PartialEq for QueryResult<D> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<D: VectorElement> Eq for QueryResult<D> {}

impl<D: VectorElement> PartialOrd for QueryResult<D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<D: VectorElement> Ord for QueryResult<D> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Compare by distance first, then by label for tie-breaking
        match self.distance.partial_cmp(&other.distance) {
            Some(Ordering::Equal) | None => self.label.cmp(&other.label),
            Some(ord) => ord,
        }
    }
}

/// Max-heap of results: the farthest of the k nearest is on top.
pub type KnnHeap<D> = BinaryHeap<QueryResult<D>>;
