//! Query result types and search-time filtering.

pub mod filter;
pub mod results;

pub use filter::{AllowAll, LabelFilter};
pub use results::{KnnHeap, QueryResult};
