//! Index implementations.
//!
//! - `hnsw`: the HNSW graph index, the only index type
//! - `error`: errors shared by index operations

pub mod error;
pub mod hnsw;

pub use error::IndexError;
pub use hnsw::{HnswIndex, HnswParams};
