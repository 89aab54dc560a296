//! Utility types used by the graph search.
//!
//! - Priority queues (max-heap and min-heap) for KNN search

pub mod heap;

pub use heap::{HeapEntry, MaxHeap, MinHeap};
