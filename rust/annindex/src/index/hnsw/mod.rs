//! HNSW (Hierarchical Navigable Small World) index implementation.
//!
//! HNSW is an approximate nearest neighbor algorithm that provides
//! logarithmic query complexity with high recall. It constructs a
//! multi-layer graph where each layer is a proximity graph.
//!
//! Key parameters:
//! - `M`: Maximum number of connections per element per layer
//! - `ef_construction`: Size of dynamic candidate list during construction
//! - `ef_runtime`: Size of dynamic candidate list during search (runtime)
//!
//! Deletion is soft: a tombstoned element keeps its slot, its vector and its
//! links, is still traversed by searches, and is never returned.

pub mod graph;
mod persist;
pub mod search;
pub mod visited;

pub use graph::{ElementGraphData, ElementMetaData, DEFAULT_M};
pub use search::{GraphView, SearchResult};
pub use visited::{VisitedNodesHandler, VisitedNodesHandlerPool};

use crate::distance::{Metric, Space};
use crate::index::IndexError;
use crate::query::{KnnHeap, LabelFilter, QueryResult};
use crate::types::{IdType, LabelType, VectorElement, INVALID_ID};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeSet, HashMap, TryReserveError};

/// Default size of the candidate list during construction.
pub const DEFAULT_EF_CONSTRUCTION: usize = 200;
/// Default size of the candidate list during search.
pub const DEFAULT_EF_RUNTIME: usize = 10;
/// Default seed for level generation.
pub const DEFAULT_SEED: u64 = 100;

const MAX_LEVEL: u8 = 32;

/// Parameters for creating an HNSW index.
#[derive(Debug, Clone)]
pub struct HnswParams {
    /// Vector dimension.
    pub dim: usize,
    /// Distance metric.
    pub metric: Metric,
    /// Number of elements the index can hold before it must be resized.
    pub max_elements: usize,
    /// Maximum number of connections per element (default: 16).
    pub m: usize,
    /// Maximum connections at level 0 (default: 2*M).
    pub m_max_0: usize,
    /// Size of dynamic candidate list during construction.
    pub ef_construction: usize,
    /// Size of dynamic candidate list during search (default value).
    pub ef_runtime: usize,
    /// Seed for reproducible level generation.
    pub seed: u64,
    /// Allow new elements to take over tombstoned slots.
    pub allow_replace_deleted: bool,
}

impl HnswParams {
    /// Create new parameters with required fields.
    pub fn new(dim: usize, metric: Metric) -> Self {
        Self {
            dim,
            metric,
            max_elements: 0,
            m: DEFAULT_M,
            m_max_0: DEFAULT_M * 2,
            ef_construction: DEFAULT_EF_CONSTRUCTION,
            ef_runtime: DEFAULT_EF_RUNTIME,
            seed: DEFAULT_SEED,
            allow_replace_deleted: false,
        }
    }

    pub fn with_max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = max_elements;
        self
    }

    /// Set M; level 0 gets twice as many connections.
    pub fn with_m(mut self, m: usize) -> Self {
        self.m = m;
        self.m_max_0 = m.saturating_mul(2);
        self
    }

    pub fn with_ef_construction(mut self, ef: usize) -> Self {
        self.ef_construction = ef;
        self
    }

    pub fn with_ef_runtime(mut self, ef: usize) -> Self {
        self.ef_runtime = ef;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_allow_replace_deleted(mut self, allow: bool) -> Self {
        self.allow_replace_deleted = allow;
        self
    }
}

/// Single-value HNSW index: one vector per label.
pub struct HnswIndex<T: VectorElement> {
    params: HnswParams,
    space: Space<T>,
    /// Graph structure, indexed by internal id.
    graph: Vec<ElementGraphData>,
    /// Vector storage, `dim` components per internal id.
    data: Vec<T>,
    label_lookup: HashMap<LabelType, IdType>,
    /// Tombstoned slots available for reuse; tracked only when replacement is allowed.
    deleted_slots: BTreeSet<IdType>,
    num_deleted: usize,
    entry_point: IdType,
    max_level: usize,
    visited_pool: VisitedNodesHandlerPool,
    /// Multiplier for random level generation (1/ln(M)).
    level_mult: f64,
    rng: Mutex<StdRng>,
}

impl<T: VectorElement> HnswIndex<T> {
    /// Create an empty index over `space`.
    ///
    /// `ef_construction` is raised to at least `m`.
    pub fn new(space: Space<T>, mut params: HnswParams) -> Result<Self, IndexError> {
        if space.dim() != params.dim {
            return Err(IndexError::DimensionMismatch {
                expected: params.dim,
                got: space.dim(),
            });
        }
        if space.metric() != params.metric {
            return Err(IndexError::InvalidParameter(format!(
                "space metric {} does not match requested metric {}",
                space.metric(),
                params.metric
            )));
        }
        if params.dim == 0 {
            return Err(IndexError::InvalidParameter("dimension must be positive".into()));
        }
        if params.m == 0 {
            return Err(IndexError::InvalidParameter("M must be positive".into()));
        }
        params.ef_construction = params.ef_construction.max(params.m);

        let level_mult = 1.0 / (params.m.max(2) as f64).ln();
        let capacity = params.max_elements;

        tracing::debug!(
            dim = params.dim,
            metric = %params.metric,
            max_elements = capacity,
            m = params.m,
            ef_construction = params.ef_construction,
            "created hnsw index"
        );

        let mut index = Self {
            data: Vec::new(),
            graph: Vec::new(),
            label_lookup: HashMap::new(),
            deleted_slots: BTreeSet::new(),
            num_deleted: 0,
            entry_point: INVALID_ID,
            max_level: 0,
            visited_pool: VisitedNodesHandlerPool::new(),
            level_mult,
            rng: Mutex::new(StdRng::seed_from_u64(params.seed)),
            space,
            params,
        };
        index.reserve_slots(capacity)?;
        Ok(index)
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.params.dim
    }

    #[inline]
    pub fn metric(&self) -> Metric {
        self.params.metric
    }

    pub fn space(&self) -> &Space<T> {
        &self.space
    }

    /// Number of occupied slots, tombstones included.
    #[inline]
    pub fn current_count(&self) -> usize {
        self.graph.len()
    }

    #[inline]
    pub fn deleted_count(&self) -> usize {
        self.num_deleted
    }

    #[inline]
    pub fn max_elements(&self) -> usize {
        self.params.max_elements
    }

    #[inline]
    pub fn m(&self) -> usize {
        self.params.m
    }

    #[inline]
    pub fn ef_construction(&self) -> usize {
        self.params.ef_construction
    }

    #[inline]
    pub fn ef_runtime(&self) -> usize {
        self.params.ef_runtime
    }

    pub fn set_ef_runtime(&mut self, ef: usize) {
        self.params.ef_runtime = ef;
    }

    pub fn allow_replace_deleted(&self) -> bool {
        self.params.allow_replace_deleted
    }

    /// Largest label ever stored, tombstones included.
    pub fn max_label(&self) -> Option<LabelType> {
        self.label_lookup.keys().copied().max()
    }

    /// True if `label` is stored and not tombstoned.
    pub fn contains(&self, label: LabelType) -> bool {
        self.live_id(label).is_some()
    }

    /// True if `label` is stored and tombstoned.
    pub fn is_marked_deleted(&self, label: LabelType) -> bool {
        self.label_lookup
            .get(&label)
            .is_some_and(|&id| self.graph[id as usize].meta.deleted)
    }

    /// Stored vector for a live label, as preprocessed by the space.
    pub fn get_vector(&self, label: LabelType) -> Option<&[T]> {
        self.live_id(label).map(|id| self.vector(id))
    }

    /// Distance between two caller vectors under this index's space.
    pub fn distance(&self, a: &[T], b: &[T]) -> Result<T, IndexError> {
        let a = self.prepare(a)?;
        let b = self.prepare(b)?;
        Ok(self.space.compute(&a, &b))
    }

    /// Insert or update the vector stored under `label`.
    ///
    /// An existing label, tombstoned or not, is updated in place and revived.
    /// With `replace_deleted` a new label takes over a tombstoned slot when
    /// one exists; otherwise it needs free capacity.
    pub fn add_vector(
        &mut self,
        vector: &[T],
        label: LabelType,
        replace_deleted: bool,
    ) -> Result<IdType, IndexError> {
        if replace_deleted && !self.params.allow_replace_deleted {
            return Err(IndexError::ReplaceDeletedNotAllowed);
        }
        let processed = self.prepare(vector)?;

        if let Some(&id) = self.label_lookup.get(&label) {
            if self.graph[id as usize].meta.deleted {
                self.revive(id);
            }
            self.update_element(id, &processed);
            return Ok(id);
        }

        if replace_deleted {
            if let Some(id) = self.deleted_slots.pop_first() {
                let old_label = self.graph[id as usize].meta.label;
                self.label_lookup.remove(&old_label);
                self.label_lookup.insert(label, id);
                let meta = &mut self.graph[id as usize].meta;
                meta.label = label;
                meta.deleted = false;
                self.num_deleted -= 1;
                tracing::trace!(id, old_label, label, "reusing deleted slot");
                self.update_element(id, &processed);
                return Ok(id);
            }
        }

        if self.graph.len() >= self.params.max_elements {
            return Err(IndexError::CapacityExceeded {
                capacity: self.params.max_elements,
            });
        }

        Ok(self.insert_element(&processed, label))
    }

    /// Tombstone the element stored under `label`.
    pub fn mark_deleted(&mut self, label: LabelType) -> Result<(), IndexError> {
        let id = *self
            .label_lookup
            .get(&label)
            .ok_or(IndexError::LabelNotFound(label))?;
        let meta = &mut self.graph[id as usize].meta;
        if meta.deleted {
            return Err(IndexError::AlreadyDeleted(label));
        }
        meta.deleted = true;
        self.num_deleted += 1;
        if self.params.allow_replace_deleted {
            self.deleted_slots.insert(id);
        }
        Ok(())
    }

    /// Clear the tombstone of the element stored under `label`.
    pub fn unmark_deleted(&mut self, label: LabelType) -> Result<(), IndexError> {
        let id = *self
            .label_lookup
            .get(&label)
            .ok_or(IndexError::LabelNotFound(label))?;
        if !self.graph[id as usize].meta.deleted {
            return Err(IndexError::NotDeleted(label));
        }
        self.revive(id);
        Ok(())
    }

    /// Change the capacity. Shrinking below the number of occupied slots fails.
    pub fn resize(&mut self, new_max_elements: usize) -> Result<(), IndexError> {
        if new_max_elements < self.graph.len() {
            return Err(IndexError::InvalidParameter(format!(
                "cannot resize to {} below current count {}",
                new_max_elements,
                self.graph.len()
            )));
        }
        self.reserve_slots(new_max_elements - self.graph.len())?;
        self.params.max_elements = new_max_elements;
        Ok(())
    }

    /// Search for the `k` nearest live elements accepted by `filter`.
    ///
    /// The returned heap holds at most `k` results with the farthest on top;
    /// fewer are returned when not enough elements qualify.
    pub fn search_knn(
        &self,
        query: &[T],
        k: usize,
        filter: Option<&dyn LabelFilter>,
    ) -> Result<KnnHeap<T>, IndexError> {
        let query = self.prepare(query)?;
        let mut heap = KnnHeap::with_capacity(k.min(self.graph.len()));
        if k == 0 || self.entry_point == INVALID_ID {
            return Ok(heap);
        }

        let view = self.view();
        let mut current = self.entry_point;
        for level in (1..=self.max_level).rev() {
            current = search::greedy_search(&view, current, &query, level).0;
        }

        let ef = self.params.ef_runtime.max(k);
        let visited = self.visited_pool.get(self.graph.len());
        let results = search::search_layer(&view, current, &query, 0, ef, &visited, |e| {
            !e.meta.deleted && filter.is_none_or(|f| f.allows(e.meta.label))
        });

        for (id, dist) in results.into_iter().take(k) {
            heap.push(QueryResult::new(self.graph[id as usize].meta.label, dist));
        }
        Ok(heap)
    }

    /// Reserve storage for `additional` elements beyond those stored.
    ///
    /// Allocation failure is reported instead of aborting, and leaves the
    /// index usable at its previous capacity.
    fn reserve_slots(&mut self, additional: usize) -> Result<(), IndexError> {
        let exhausted = |_: TryReserveError| IndexError::MemoryExhausted(additional);
        let components = additional
            .checked_mul(self.params.dim)
            .ok_or(IndexError::MemoryExhausted(additional))?;
        self.graph.try_reserve_exact(additional).map_err(exhausted)?;
        self.data.try_reserve_exact(components).map_err(exhausted)?;
        self.label_lookup.try_reserve(additional).map_err(exhausted)?;
        Ok(())
    }

    fn prepare(&self, vector: &[T]) -> Result<Vec<T>, IndexError> {
        if vector.len() != self.params.dim {
            return Err(IndexError::DimensionMismatch {
                expected: self.params.dim,
                got: vector.len(),
            });
        }
        self.space.validate(vector)?;
        Ok(self.space.preprocess(vector))
    }

    fn live_id(&self, label: LabelType) -> Option<IdType> {
        self.label_lookup
            .get(&label)
            .copied()
            .filter(|&id| !self.graph[id as usize].meta.deleted)
    }

    fn revive(&mut self, id: IdType) {
        self.graph[id as usize].meta.deleted = false;
        self.num_deleted -= 1;
        self.deleted_slots.remove(&id);
    }

    #[inline]
    fn vector(&self, id: IdType) -> &[T] {
        let start = id as usize * self.params.dim;
        &self.data[start..start + self.params.dim]
    }

    fn view(&self) -> GraphView<'_, T> {
        GraphView {
            graph: &self.graph,
            data: &self.data,
            dim: self.params.dim,
            dist_fn: self.space.as_ref(),
        }
    }

    fn generate_random_level(&self) -> u8 {
        let r: f64 = 1.0 - self.rng.lock().gen::<f64>();
        let level = (-r.ln() * self.level_mult).floor();
        if level >= MAX_LEVEL as f64 {
            MAX_LEVEL
        } else {
            level as u8
        }
    }

    fn insert_element(&mut self, vector: &[T], label: LabelType) -> IdType {
        let id = self.graph.len() as IdType;
        let level = self.generate_random_level();

        self.graph.push(ElementGraphData::new(
            label,
            level,
            self.params.m_max_0,
            self.params.m,
        ));
        self.data.extend_from_slice(vector);
        self.label_lookup.insert(label, id);

        if self.entry_point == INVALID_ID {
            self.entry_point = id;
            self.max_level = level as usize;
            return id;
        }

        self.link_element(id);

        if level as usize > self.max_level {
            tracing::trace!(id, level, "new entry point");
            self.entry_point = id;
            self.max_level = level as usize;
        }
        id
    }

    fn update_element(&mut self, id: IdType, vector: &[T]) {
        let start = id as usize * self.params.dim;
        self.data[start..start + self.params.dim].copy_from_slice(vector);
        self.link_element(id);
    }

    /// (Re)compute the outgoing links of `id` and connect them back.
    fn link_element(&mut self, id: IdType) {
        let element_level = self.graph[id as usize].meta.level as usize;
        let query = self.vector(id).to_vec();

        let mut current = self.entry_point;
        for level in (element_level + 1..=self.max_level).rev() {
            current = search::greedy_search(&self.view(), current, &query, level).0;
        }

        for level in (0..=element_level.min(self.max_level)).rev() {
            let max_links = self.max_links(level);
            let (candidates, selected) = {
                let view = self.view();
                let visited = self.visited_pool.get(self.graph.len());
                let mut candidates = search::search_layer(
                    &view,
                    current,
                    &query,
                    level,
                    self.params.ef_construction,
                    &visited,
                    |e| !e.meta.deleted,
                );
                candidates.retain(|&(c, _)| c != id);
                let selected = search::select_neighbors_heuristic(&view, &candidates, self.params.m);
                (candidates, selected)
            };

            self.graph[id as usize].set_neighbors(level, &selected);
            for &neighbor in &selected {
                self.add_link(neighbor, id, level, max_links);
            }
            if let Some(&(closest, _)) = candidates.first() {
                current = closest;
            }
        }
    }

    /// Link `from -> to`, pruning `from`'s list with the heuristic when full.
    fn add_link(&mut self, from: IdType, to: IdType, level: usize, max_links: usize) {
        let links = self.graph[from as usize].neighbors(level);
        if links.contains(&to) {
            return;
        }
        if links.len() < max_links {
            self.graph[from as usize].push_neighbor(level, to);
            return;
        }

        let selected = {
            let view = self.view();
            let candidates: Vec<(IdType, T)> = links
                .iter()
                .copied()
                .chain(std::iter::once(to))
                .map(|n| (n, view.distance_between(from, n)))
                .collect();
            search::select_neighbors_heuristic(&view, &candidates, max_links)
        };
        self.graph[from as usize].set_neighbors(level, &selected);
    }

    #[inline]
    fn max_links(&self, level: usize) -> usize {
        if level == 0 {
            self.params.m_max_0
        } else {
            self.params.m
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::create_distance_function;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn new_index(dim: usize, metric: Metric, max_elements: usize) -> HnswIndex<f32> {
        let params = HnswParams::new(dim, metric).with_max_elements(max_elements);
        HnswIndex::new(create_distance_function(metric, dim), params).unwrap()
    }

    fn sorted_labels(heap: KnnHeap<f32>) -> Vec<LabelType> {
        heap.into_sorted_vec().into_iter().map(|r| r.label).collect()
    }

    #[test]
    fn test_hnsw_basic() {
        let mut index = new_index(4, Metric::L2, 10);
        index.add_vector(&[1.0, 0.0, 0.0, 0.0], 1, false).unwrap();
        index.add_vector(&[0.0, 1.0, 0.0, 0.0], 2, false).unwrap();
        index.add_vector(&[0.0, 0.0, 1.0, 0.0], 3, false).unwrap();
        index.add_vector(&[0.0, 0.0, 0.0, 1.0], 4, false).unwrap();
        assert_eq!(index.current_count(), 4);

        let heap = index.search_knn(&[1.0, 0.1, 0.0, 0.0], 2, None).unwrap();
        assert_eq!(heap.len(), 2);
        assert_eq!(sorted_labels(heap)[0], 1);
    }

    #[test]
    fn test_search_empty_index() {
        let index = new_index(3, Metric::L2, 4);
        let heap = index.search_knn(&[0.0, 0.0, 0.0], 5, None).unwrap();
        assert!(heap.is_empty());
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut index = new_index(4, Metric::L2, 4);
        assert_eq!(
            index.add_vector(&[1.0, 2.0], 1, false),
            Err(IndexError::DimensionMismatch { expected: 4, got: 2 })
        );
        assert!(matches!(
            index.search_knn(&[1.0], 1, None),
            Err(IndexError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_new_rejects_mismatched_space() {
        let params = HnswParams::new(4, Metric::L2);
        let space = create_distance_function::<f32>(Metric::Cosine, 4);
        assert!(HnswIndex::new(space, params).is_err());

        let params = HnswParams::new(4, Metric::L2).with_m(0);
        let space = create_distance_function::<f32>(Metric::L2, 4);
        assert!(HnswIndex::new(space, params).is_err());
    }

    #[test]
    fn test_ef_construction_at_least_m() {
        let params = HnswParams::new(2, Metric::L2).with_m(32).with_ef_construction(4);
        let index = HnswIndex::<f32>::new(create_distance_function(Metric::L2, 2), params).unwrap();
        assert_eq!(index.ef_construction(), 32);
        assert_eq!(index.m(), 32);
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut index = new_index(2, Metric::L2, 1);
        index.add_vector(&[0.0, 0.0], 1, false).unwrap();
        assert_eq!(
            index.add_vector(&[1.0, 1.0], 2, false),
            Err(IndexError::CapacityExceeded { capacity: 1 })
        );

        index.resize(2).unwrap();
        index.add_vector(&[1.0, 1.0], 2, false).unwrap();
        assert_eq!(index.current_count(), 2);
        assert!(index.resize(1).is_err());
    }

    #[test]
    fn test_unallocatable_capacity_is_an_error() {
        let params = HnswParams::new(4, Metric::L2).with_max_elements(1 << 42);
        let result = HnswIndex::<f32>::new(create_distance_function(Metric::L2, 4), params);
        assert!(matches!(result, Err(IndexError::MemoryExhausted(_))));

        let params = HnswParams::new(4, Metric::L2).with_max_elements(usize::MAX / 2);
        let result = HnswIndex::<f32>::new(create_distance_function(Metric::L2, 4), params);
        assert!(matches!(result, Err(IndexError::MemoryExhausted(_))));

        let mut index = new_index(4, Metric::L2, 2);
        index.add_vector(&[1.0, 0.0, 0.0, 0.0], 1, false).unwrap();
        assert!(matches!(index.resize(1 << 42), Err(IndexError::MemoryExhausted(_))));
        assert_eq!(index.max_elements(), 2);
        index.add_vector(&[0.0, 1.0, 0.0, 0.0], 2, false).unwrap();
        assert_eq!(sorted_labels(index.search_knn(&[0.0, 1.0, 0.0, 0.0], 1, None).unwrap()), vec![2]);
    }

    #[test]
    fn test_huge_breadth_parameters() {
        let params = HnswParams::new(2, Metric::L2)
            .with_max_elements(8)
            .with_m(1 << 40)
            .with_ef_runtime(usize::MAX);
        let mut index =
            HnswIndex::<f32>::new(create_distance_function(Metric::L2, 2), params).unwrap();
        for i in 0..8u64 {
            index.add_vector(&[i as f32, 0.0], i, false).unwrap();
        }
        let heap = index.search_knn(&[2.2, 0.0], usize::MAX, None).unwrap();
        assert_eq!(heap.len(), 8);
        assert_eq!(sorted_labels(heap)[0], 2);
    }

    #[test]
    fn test_update_existing_label() {
        let mut index = new_index(2, Metric::L2, 4);
        let first = index.add_vector(&[0.0, 0.0], 7, false).unwrap();
        index.add_vector(&[5.0, 5.0], 8, false).unwrap();
        let second = index.add_vector(&[9.0, 9.0], 7, false).unwrap();

        assert_eq!(first, second);
        assert_eq!(index.current_count(), 2);
        assert_eq!(index.get_vector(7), Some(&[9.0f32, 9.0][..]));

        let heap = index.search_knn(&[9.0, 9.0], 1, None).unwrap();
        assert_eq!(sorted_labels(heap), vec![7]);
    }

    #[test]
    fn test_mark_and_unmark_deleted() {
        let mut index = new_index(2, Metric::L2, 4);
        index.add_vector(&[0.0, 0.0], 1, false).unwrap();
        index.add_vector(&[1.0, 1.0], 2, false).unwrap();

        index.mark_deleted(1).unwrap();
        assert!(!index.contains(1));
        assert!(index.is_marked_deleted(1));
        assert!(index.get_vector(1).is_none());
        assert_eq!(index.deleted_count(), 1);
        assert_eq!(index.current_count(), 2);
        assert_eq!(index.mark_deleted(1), Err(IndexError::AlreadyDeleted(1)));
        assert_eq!(index.mark_deleted(9), Err(IndexError::LabelNotFound(9)));

        let heap = index.search_knn(&[0.0, 0.0], 2, None).unwrap();
        assert_eq!(sorted_labels(heap), vec![2]);

        index.unmark_deleted(1).unwrap();
        assert!(index.contains(1));
        assert_eq!(index.deleted_count(), 0);
        assert_eq!(index.unmark_deleted(1), Err(IndexError::NotDeleted(1)));
    }

    #[test]
    fn test_re_adding_deleted_label_revives_it() {
        let mut index = new_index(2, Metric::L2, 2);
        index.add_vector(&[0.0, 0.0], 1, false).unwrap();
        index.mark_deleted(1).unwrap();
        index.add_vector(&[3.0, 3.0], 1, false).unwrap();

        assert!(index.contains(1));
        assert_eq!(index.deleted_count(), 0);
        assert_eq!(index.current_count(), 1);
    }

    #[test]
    fn test_replace_deleted() {
        let params = HnswParams::new(2, Metric::L2)
            .with_max_elements(2)
            .with_allow_replace_deleted(true);
        let mut index =
            HnswIndex::<f32>::new(create_distance_function(Metric::L2, 2), params).unwrap();
        index.add_vector(&[0.0, 0.0], 1, false).unwrap();
        index.add_vector(&[1.0, 1.0], 2, false).unwrap();
        index.mark_deleted(1).unwrap();

        let id = index.add_vector(&[2.0, 2.0], 3, true).unwrap();
        assert_eq!(id, 0);
        assert_eq!(index.current_count(), 2);
        assert_eq!(index.deleted_count(), 0);
        assert!(!index.contains(1));
        assert!(!index.is_marked_deleted(1));
        assert!(index.contains(3));

        // No tombstone left to reuse and no free capacity.
        assert!(matches!(
            index.add_vector(&[4.0, 4.0], 4, true),
            Err(IndexError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_replace_deleted_requires_opt_in() {
        let mut index = new_index(2, Metric::L2, 2);
        assert_eq!(
            index.add_vector(&[0.0, 0.0], 1, true),
            Err(IndexError::ReplaceDeletedNotAllowed)
        );
    }

    #[test]
    fn test_rejected_vectors() {
        let mut index = new_index(2, Metric::Cosine, 4);
        assert!(matches!(
            index.add_vector(&[0.0, 0.0], 1, false),
            Err(IndexError::Rejected(_))
        ));
        assert!(matches!(
            index.add_vector(&[f32::NAN, 1.0], 1, false),
            Err(IndexError::Rejected(_))
        ));
        assert_eq!(index.current_count(), 0);
    }

    #[test]
    fn test_cosine_stores_normalized() {
        let mut index = new_index(2, Metric::Cosine, 4);
        index.add_vector(&[3.0, 4.0], 1, false).unwrap();
        let stored = index.get_vector(1).unwrap();
        assert!((stored[0] - 0.6).abs() < 1e-6);
        assert!((stored[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_search_with_filter() {
        let mut index = new_index(1, Metric::L2, 20);
        for i in 0..20u64 {
            index.add_vector(&[i as f32], i, false).unwrap();
        }

        let even = |label: LabelType| label % 2 == 0;
        let heap = index.search_knn(&[5.0], 3, Some(&even)).unwrap();
        assert_eq!(sorted_labels(heap), vec![4, 6, 2]);

        let none = |_: LabelType| false;
        assert!(index.search_knn(&[5.0], 3, Some(&none)).unwrap().is_empty());
    }

    #[test]
    fn test_distance() {
        let index = new_index(3, Metric::L2, 1);
        let v = [1.0, 2.0, 3.0];
        assert_eq!(index.distance(&v, &v).unwrap(), 0.0);
        assert_eq!(index.distance(&[0.0; 3], &[1.0, 0.0, 0.0]).unwrap(), 1.0);
        assert!(index.distance(&v, &[1.0]).is_err());
    }

    #[test]
    fn test_max_label() {
        let mut index = new_index(1, Metric::L2, 4);
        assert_eq!(index.max_label(), None);
        index.add_vector(&[0.0], 3, false).unwrap();
        index.add_vector(&[1.0], 11, false).unwrap();
        index.mark_deleted(11).unwrap();
        assert_eq!(index.max_label(), Some(11));
    }

    #[test]
    fn test_recall_random_vectors() {
        let dim = 16;
        let n = 500;
        let mut rng = StdRng::seed_from_u64(42);
        let vectors: Vec<Vec<f32>> = (0..n)
            .map(|_| (0..dim).map(|_| rng.gen::<f32>()).collect())
            .collect();

        let params = HnswParams::new(dim, Metric::L2)
            .with_max_elements(n)
            .with_ef_runtime(64);
        let mut index =
            HnswIndex::<f32>::new(create_distance_function(Metric::L2, dim), params).unwrap();
        for (label, v) in vectors.iter().enumerate() {
            index.add_vector(v, label as LabelType, false).unwrap();
        }

        let mut hits = 0;
        for (label, v) in vectors.iter().enumerate().take(50) {
            let heap = index.search_knn(v, 1, None).unwrap();
            if sorted_labels(heap) == vec![label as LabelType] {
                hits += 1;
            }
        }
        assert!(hits >= 48, "self-recall too low: {hits}/50");
    }
}
