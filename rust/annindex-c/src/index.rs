//! The index handle behind the opaque `AnnIndex` pointer.

use crate::capacity;
use crate::error::HandleError;
use crate::logging;
use crate::query::QueryExecutor;
use crate::state::Lifecycle;
use crate::types::{idType, AnnIndexSpace, AnnIndexState, AUTO_ID};
use annindex::distance::create_distance_function;
use annindex::index::{HnswIndex, HnswParams, IndexError};
use annindex::query::LabelFilter;
use annindex::types::LabelType;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

/// One index instance: its space, dimension, lifecycle and auto-id counter.
pub struct IndexHandle {
    space: AnnIndexSpace,
    dim: usize,
    lifecycle: Lifecycle<HnswIndex<f32>>,
    next_id: AtomicI64,
}

impl IndexHandle {
    pub fn new(space: AnnIndexSpace, dim: usize) -> Self {
        Self {
            space,
            dim,
            lifecycle: Lifecycle::Uninitialized,
            next_id: AtomicI64::new(0),
        }
    }

    pub fn space(&self) -> AnnIndexSpace {
        self.space
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn state(&self) -> AnnIndexState {
        self.lifecycle.state()
    }

    /// Fail unless the handle holds an engine.
    pub fn ensure_initialized(&self) -> Result<(), HandleError> {
        self.lifecycle.engine().map(|_| ())
    }

    /// Fail once the handle is cleared.
    pub fn ensure_live(&self) -> Result<(), HandleError> {
        self.lifecycle.ensure_live()
    }

    /// Take the next automatic id. Concurrent callers never get the same id.
    pub fn next_auto_id(&self) -> idType {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Read a value from the engine.
    pub fn with_engine<R>(&self, read: impl FnOnce(&HnswIndex<f32>) -> R) -> Result<R, HandleError> {
        self.lifecycle.engine().map(read)
    }

    pub fn init(
        &mut self,
        max_elements: usize,
        m: usize,
        ef_construction: usize,
        seed: u64,
        allow_replace_deleted: bool,
    ) -> Result<(), HandleError> {
        let metric = self.space.to_metric();
        let dim = self.dim;
        self.lifecycle.initialize(|| {
            let params = HnswParams::new(dim, metric)
                .with_max_elements(max_elements)
                .with_m(m)
                .with_ef_construction(ef_construction)
                .with_seed(seed)
                .with_allow_replace_deleted(allow_replace_deleted);
            Ok(HnswIndex::new(create_distance_function(metric, dim), params)?)
        })?;
        tracing::debug!(dim, %metric, max_elements, m, ef_construction, "index initialized");
        Ok(())
    }

    /// Release the engine and its space. The handle stays cleared for good.
    pub fn clear(&mut self) -> Result<(), HandleError> {
        let engine = self.lifecycle.clear()?;
        tracing::debug!(had_engine = engine.is_some(), "index cleared");
        Ok(())
    }

    /// Insert `vector` under `id`, or under the next automatic id for [`AUTO_ID`].
    ///
    /// Capacity grows first when the engine is full. Returns the id used.
    pub fn add_item(
        &mut self,
        vector: &[f32],
        id: idType,
        replace_deleted: bool,
    ) -> Result<idType, HandleError> {
        let engine = self.lifecycle.engine_mut()?;
        let id = match id {
            AUTO_ID => self.next_id.fetch_add(1, Ordering::Relaxed),
            id if id >= 0 => id,
            other => {
                return Err(HandleError::InvalidArgument(format!("invalid id {other}")));
            }
        };
        capacity::ensure_room(engine)?;
        engine.add_vector(vector, id as LabelType, replace_deleted)?;
        Ok(id)
    }

    pub fn mark_deleted(&mut self, id: idType) -> Result<(), HandleError> {
        let engine = self.lifecycle.engine_mut()?;
        let label = to_label(id)?;
        engine.mark_deleted(label).map_err(|e| id_error(id, e))
    }

    pub fn unmark_deleted(&mut self, id: idType) -> Result<(), HandleError> {
        let engine = self.lifecycle.engine_mut()?;
        let label = to_label(id)?;
        engine.unmark_deleted(label).map_err(|e| id_error(id, e))
    }

    pub fn resize(&mut self, new_capacity: usize) -> Result<(), HandleError> {
        let engine = self.lifecycle.engine_mut()?;
        engine.resize(new_capacity)?;
        Ok(())
    }

    pub fn set_ef(&mut self, ef: usize) -> Result<(), HandleError> {
        self.lifecycle.engine_mut()?.set_ef_runtime(ef);
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), HandleError> {
        self.lifecycle.engine()?.save_to_file(path)?;
        Ok(())
    }

    /// Point the handle at a snapshot, replacing any current engine.
    ///
    /// The snapshot is read in full before anything is replaced, so a failed
    /// load leaves the handle as it was.
    pub fn load(&mut self, path: &Path, max_elements: usize) -> Result<(), HandleError> {
        let metric = self.space.to_metric();
        let engine =
            HnswIndex::load_from_file(path, create_distance_function(metric, self.dim), max_elements)?;

        if let Some(next) = engine
            .max_label()
            .and_then(|label| idType::try_from(label).ok())
            .and_then(|label| label.checked_add(1))
        {
            self.next_id.fetch_max(next, Ordering::Relaxed);
        }

        if self.lifecycle.replace(engine)?.is_some() {
            logging::warn(&format!(
                "replacing existing index engine with snapshot {}",
                path.display()
            ));
        }
        Ok(())
    }

    pub fn has_id(&self, id: idType) -> Result<(), HandleError> {
        let engine = self.lifecycle.engine()?;
        let label = to_label(id)?;
        if engine.contains(label) {
            Ok(())
        } else {
            Err(HandleError::IdNotInIndex(id))
        }
    }

    /// Copy the vector stored under `id` into `out`, which must hold `dim` values.
    pub fn get_data(&self, id: idType, out: &mut [f32]) -> Result<(), HandleError> {
        let engine = self.lifecycle.engine()?;
        if out.len() != self.dim {
            return Err(HandleError::DataRetrievalFailed(format!(
                "buffer holds {} values, index dimension is {}",
                out.len(),
                self.dim
            )));
        }
        let label = to_label(id)?;
        let stored = engine.get_vector(label).ok_or(HandleError::IdNotInIndex(id))?;
        out.copy_from_slice(stored);
        Ok(())
    }

    pub fn compute_similarity(&self, a: &[f32], b: &[f32]) -> Result<f32, HandleError> {
        Ok(self.lifecycle.engine()?.distance(a, b)?)
    }

    pub fn knn_query(
        &self,
        query: &[f32],
        filter: Option<&dyn LabelFilter>,
        ids: &mut [idType],
        distances: &mut [f32],
    ) -> Result<(), HandleError> {
        let engine = self.lifecycle.engine()?;
        QueryExecutor::new(engine).knn(query, filter, ids, distances)
    }
}

impl Drop for IndexHandle {
    fn drop(&mut self) {
        if !self.lifecycle.is_cleared() {
            let _ = self.clear();
        }
    }
}

fn to_label(id: idType) -> Result<LabelType, HandleError> {
    LabelType::try_from(id).map_err(|_| HandleError::IdNotInIndex(id))
}

fn id_error(id: idType, err: IndexError) -> HandleError {
    match err {
        IndexError::LabelNotFound(_) | IndexError::AlreadyDeleted(_) | IndexError::NotDeleted(_) => {
            HandleError::IdNotInIndex(id)
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn initialized(dim: usize, max_elements: usize) -> IndexHandle {
        let mut handle = IndexHandle::new(AnnIndexSpace::AnnIndexSpace_L2, dim);
        handle.init(max_elements, 16, 200, 100, false).unwrap();
        handle
    }

    #[test]
    fn test_auto_ids_are_sequential() {
        let mut handle = initialized(2, 1);
        assert_eq!(handle.add_item(&[0.0, 0.0], AUTO_ID, false).unwrap(), 0);
        assert_eq!(handle.add_item(&[1.0, 0.0], AUTO_ID, false).unwrap(), 1);
        assert_eq!(handle.add_item(&[2.0, 0.0], 50, false).unwrap(), 50);
        assert_eq!(handle.add_item(&[3.0, 0.0], AUTO_ID, false).unwrap(), 2);
        assert_eq!(handle.with_engine(|e| e.current_count()).unwrap(), 4);
    }

    #[test]
    fn test_auto_ids_unique_across_threads() {
        let handle = IndexHandle::new(AnnIndexSpace::AnnIndexSpace_L2, 2);
        let mut ids: Vec<idType> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..4)
                .map(|_| s.spawn(|| (0..250).map(|_| handle.next_auto_id()).collect::<Vec<_>>()))
                .collect();
            workers.into_iter().flat_map(|w| w.join().unwrap()).collect()
        });
        ids.sort_unstable();
        assert_eq!(ids, (0..1000).collect::<Vec<idType>>());
    }

    #[test]
    fn test_load_on_cleared_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleared.anni");
        let mut source = initialized(2, 4);
        source.add_item(&[0.0, 0.0], 1, false).unwrap();
        source.save(&path).unwrap();

        let mut handle = initialized(2, 4);
        handle.clear().unwrap();
        assert!(matches!(handle.ensure_live(), Err(HandleError::AlreadyCleared)));
        assert!(matches!(handle.load(&path, 4), Err(HandleError::AlreadyCleared)));
        assert_eq!(handle.state(), AnnIndexState::AnnIndexState_Cleared);
    }

    #[test]
    fn test_negative_ids() {
        let mut handle = initialized(2, 4);
        assert!(matches!(
            handle.add_item(&[0.0, 0.0], -5, false),
            Err(HandleError::InvalidArgument(_))
        ));
        assert!(matches!(handle.has_id(-5), Err(HandleError::IdNotInIndex(-5))));
        assert!(matches!(handle.mark_deleted(-2), Err(HandleError::IdNotInIndex(-2))));
    }

    #[test]
    fn test_get_data_checks_buffer_length() {
        let mut handle = initialized(3, 4);
        handle.add_item(&[1.0, 2.0, 3.0], 9, false).unwrap();

        let mut out = [0f32; 3];
        handle.get_data(9, &mut out).unwrap();
        assert_eq!(out, [1.0, 2.0, 3.0]);

        let mut short = [0f32; 2];
        assert!(matches!(
            handle.get_data(9, &mut short),
            Err(HandleError::DataRetrievalFailed(_))
        ));
        assert!(matches!(handle.get_data(8, &mut out), Err(HandleError::IdNotInIndex(8))));
    }

    #[test]
    fn test_load_bumps_auto_id_counter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bump.anni");

        let mut source = initialized(2, 4);
        source.add_item(&[0.0, 0.0], 41, false).unwrap();
        source.save(&path).unwrap();

        let mut target = IndexHandle::new(AnnIndexSpace::AnnIndexSpace_L2, 2);
        target.load(&path, 4).unwrap();
        assert_eq!(target.state(), AnnIndexState::AnnIndexState_Initialized);
        assert_eq!(target.add_item(&[1.0, 1.0], AUTO_ID, false).unwrap(), 42);
    }

    #[test]
    fn test_failed_load_keeps_engine() {
        let dir = tempfile::tempdir().unwrap();
        let mut handle = initialized(2, 4);
        handle.add_item(&[0.0, 0.0], 1, false).unwrap();

        assert!(handle.load(&dir.path().join("missing.anni"), 4).is_err());
        assert!(handle.has_id(1).is_ok());
    }

    #[test]
    fn test_drop_clears() {
        let mut handle = initialized(2, 4);
        handle.add_item(&[0.0, 0.0], 1, false).unwrap();
        drop(handle);

        let mut cleared = initialized(2, 4);
        cleared.clear().unwrap();
        assert_eq!(cleared.state(), AnnIndexState::AnnIndexState_Cleared);
        drop(cleared);
    }
}
