//! annindex - approximate nearest neighbor search over HNSW graphs.
//!
//! This crate provides a single-value HNSW index: one vector per label,
//! soft deletion through tombstones, optional reuse of tombstoned slots,
//! filtered k-NN search and binary snapshots.
//!
//! # Distance Metrics
//!
//! - **L2**: Squared Euclidean distance. Lower values = more similar.
//! - **Inner Product**: `1 - <a, b>`.
//! - **Cosine**: Inner product over vectors normalized on insertion.
//!
//! # Examples
//!
//! ```rust
//! use annindex::prelude::*;
//!
//! let space = create_distance_function::<f32>(Metric::L2, 4);
//! let params = HnswParams::new(4, Metric::L2)
//!     .with_max_elements(16)
//!     .with_m(16)
//!     .with_ef_construction(200);
//! let mut index = HnswIndex::new(space, params).unwrap();
//!
//! index.add_vector(&[1.0, 0.0, 0.0, 0.0], 1, false).unwrap();
//! index.add_vector(&[0.0, 1.0, 0.0, 0.0], 2, false).unwrap();
//! index.add_vector(&[0.0, 0.0, 1.0, 0.0], 3, false).unwrap();
//!
//! // Farthest of the k nearest is on top of the heap.
//! let results = index.search_knn(&[1.0, 0.1, 0.0, 0.0], 2, None).unwrap();
//! let nearest = results.into_sorted_vec();
//! assert_eq!(nearest[0].label, 1);
//! ```
//!
//! ## Filtered search
//!
//! ```rust
//! use annindex::prelude::*;
//!
//! let space = create_distance_function::<f32>(Metric::L2, 1);
//! let params = HnswParams::new(1, Metric::L2).with_max_elements(8);
//! let mut index = HnswIndex::new(space, params).unwrap();
//! for label in 0..8u64 {
//!     index.add_vector(&[label as f32], label, false).unwrap();
//! }
//!
//! let odd = |label: LabelType| label % 2 == 1;
//! let results = index.search_knn(&[4.0], 1, Some(&odd)).unwrap();
//! assert!(results.peek().is_some_and(|r| r.label % 2 == 1));
//! ```

pub mod distance;
pub mod index;
pub mod query;
pub mod serialization;
pub mod types;
pub mod utils;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::distance::{
        create_distance_function, DistanceFunction, Metric, Space, SpaceRejection,
    };
    pub use crate::index::{HnswIndex, HnswParams, IndexError};
    pub use crate::query::{AllowAll, KnnHeap, LabelFilter, QueryResult};
    pub use crate::serialization::{SerializationError, SerializationResult};
    pub use crate::types::{IdType, LabelType, VectorElement, INVALID_ID};
}
