//! Exact-count k-NN queries written into flat output arrays.

use crate::error::HandleError;
use crate::types::idType;
use annindex::index::HnswIndex;
use annindex::query::LabelFilter;

/// Runs one k-NN query against an engine.
pub struct QueryExecutor<'a> {
    engine: &'a HnswIndex<f32>,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(engine: &'a HnswIndex<f32>) -> Self {
        Self { engine }
    }

    /// Find the `ids.len()` nearest live elements, nearest first.
    ///
    /// Either every slot of `ids` and `distances` is written or, on error,
    /// none is. Fewer qualifying elements than requested is an error.
    pub fn knn(
        &self,
        query: &[f32],
        filter: Option<&dyn LabelFilter>,
        ids: &mut [idType],
        distances: &mut [f32],
    ) -> Result<(), HandleError> {
        let k = ids.len();
        if distances.len() != k {
            return Err(HandleError::InvalidArgument(format!(
                "{} ids but {} distances requested",
                k,
                distances.len()
            )));
        }

        let mut heap = self.engine.search_knn(query, k, filter)?;
        if heap.len() < k {
            return Err(HandleError::QueryCannotReturn {
                requested: k,
                found: heap.len(),
            });
        }

        // The heap pops farthest first.
        let mut slot = k;
        while let Some(result) = heap.pop() {
            slot -= 1;
            ids[slot] = result.label as idType;
            distances[slot] = result.distance;
        }
        Ok(())
    }
}
