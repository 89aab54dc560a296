//! Search algorithms for HNSW graph traversal.
//!
//! - `greedy_search`: single closest element on an upper layer
//! - `search_layer`: best-first exploration returning up to `ef` results
//! - `select_neighbors_heuristic`: diverse neighbor selection

use super::graph::ElementGraphData;
use super::visited::VisitedNodesHandler;
use crate::distance::DistanceFunction;
use crate::types::{IdType, VectorElement};
use crate::utils::{MaxHeap, MinHeap};

/// Result of a layer search: (id, distance) pairs sorted by ascending distance.
pub type SearchResult<D> = Vec<(IdType, D)>;

/// Read-only view of the graph and its vectors.
pub struct GraphView<'a, T: VectorElement> {
    pub graph: &'a [ElementGraphData],
    pub data: &'a [T],
    pub dim: usize,
    pub dist_fn: &'a dyn DistanceFunction<T>,
}

impl<T: VectorElement> GraphView<'_, T> {
    #[inline]
    pub fn vector(&self, id: IdType) -> &[T] {
        let start = id as usize * self.dim;
        &self.data[start..start + self.dim]
    }

    #[inline]
    pub fn distance_to(&self, id: IdType, query: &[T]) -> T {
        self.dist_fn.compute(self.vector(id), query)
    }

    #[inline]
    pub fn distance_between(&self, a: IdType, b: IdType) -> T {
        self.dist_fn.compute(self.vector(a), self.vector(b))
    }
}

/// Greedy search to find the single closest element at a given layer.
///
/// Tombstoned elements are valid hops here; the upper layers only route.
pub fn greedy_search<T: VectorElement>(
    view: &GraphView<'_, T>,
    entry_point: IdType,
    query: &[T],
    level: usize,
) -> (IdType, T) {
    let mut current = entry_point;
    let mut current_dist = view.distance_to(entry_point, query);

    loop {
        let mut changed = false;
        for &neighbor in view.graph[current as usize].neighbors(level) {
            let dist = view.distance_to(neighbor, query);
            if dist < current_dist {
                current = neighbor;
                current_dist = dist;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    (current, current_dist)
}

/// Search a layer to find the `ef` closest accepted elements.
///
/// Every reachable element is explored, but only those for which `accept`
/// returns true enter the result set. While the result set is not full the
/// search keeps expanding, so tombstones and filtered labels never cut a
/// traversal short.
pub fn search_layer<T, A>(
    view: &GraphView<'_, T>,
    entry_point: IdType,
    query: &[T],
    level: usize,
    ef: usize,
    visited: &VisitedNodesHandler,
    accept: A,
) -> SearchResult<T>
where
    T: VectorElement,
    A: Fn(&ElementGraphData) -> bool,
{
    let mut candidates = MinHeap::<T>::with_capacity(ef.saturating_mul(2));
    let mut results = MaxHeap::<T>::new(ef);

    let entry_dist = view.distance_to(entry_point, query);
    visited.visit(entry_point);
    candidates.push(entry_point, entry_dist);
    if accept(&view.graph[entry_point as usize]) {
        results.try_insert(entry_point, entry_dist);
    }

    while let Some(candidate) = candidates.pop() {
        if results.is_full() {
            if let Some(worst) = results.top_distance() {
                if candidate.distance > worst {
                    break;
                }
            }
        }

        for &neighbor in view.graph[candidate.id as usize].neighbors(level) {
            if visited.visit(neighbor) {
                continue;
            }

            let dist = view.distance_to(neighbor, query);
            let dominated = results.is_full() && results.top_distance().is_some_and(|w| dist >= w);
            if dominated {
                continue;
            }

            candidates.push(neighbor, dist);
            if accept(&view.graph[neighbor as usize]) {
                results.try_insert(neighbor, dist);
            }
        }
    }

    results
        .into_sorted_vec()
        .into_iter()
        .map(|e| (e.id, e.distance))
        .collect()
}

/// Select up to `m` neighbors using the heuristic from the HNSW paper.
///
/// A candidate is kept if it is closer to the target than to any neighbor
/// already selected. Pruned candidates back-fill the list when the
/// heuristic alone selects fewer than `m`.
pub fn select_neighbors_heuristic<T: VectorElement>(
    view: &GraphView<'_, T>,
    candidates: &[(IdType, T)],
    m: usize,
) -> Vec<IdType> {
    let mut working = candidates.to_vec();
    working.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut selected: Vec<IdType> = Vec::with_capacity(m.min(candidates.len()));
    let mut pruned: Vec<IdType> = Vec::new();

    for (candidate_id, candidate_dist) in working {
        if selected.len() >= m {
            break;
        }
        let diverse = selected
            .iter()
            .all(|&s| view.distance_between(candidate_id, s) >= candidate_dist);
        if diverse {
            selected.push(candidate_id);
        } else {
            pruned.push(candidate_id);
        }
    }

    for id in pruned {
        if selected.len() >= m {
            break;
        }
        selected.push(id);
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::l2::L2Distance;

    /// Four points on a line, chained 0-1-2-3 on level 0.
    fn line_graph() -> (Vec<ElementGraphData>, Vec<f32>) {
        let mut graph: Vec<ElementGraphData> =
            (0..4).map(|i| ElementGraphData::new(i as u64 + 100, 0, 4, 2)).collect();
        graph[0].set_neighbors(0, &[1]);
        graph[1].set_neighbors(0, &[0, 2]);
        graph[2].set_neighbors(0, &[1, 3]);
        graph[3].set_neighbors(0, &[2]);
        (graph, vec![0.0, 1.0, 2.0, 3.0])
    }

    #[test]
    fn test_greedy_search_walks_line() {
        let (graph, data) = line_graph();
        let dist_fn = L2Distance::<f32>::new(1);
        let view = GraphView { graph: &graph, data: &data, dim: 1, dist_fn: &dist_fn };

        let (id, dist) = greedy_search(&view, 0, &[2.9], 0);
        assert_eq!(id, 3);
        assert!(dist < 0.02);
    }

    #[test]
    fn test_search_layer_skips_rejected_but_traverses_them() {
        let (mut graph, data) = line_graph();
        graph[1].meta.deleted = true;
        graph[2].meta.deleted = true;
        let dist_fn = L2Distance::<f32>::new(1);
        let view = GraphView { graph: &graph, data: &data, dim: 1, dist_fn: &dist_fn };
        let visited = VisitedNodesHandler::new(4);

        let results = search_layer(&view, 0, &[1.5], 0, 2, &visited, |e| !e.meta.deleted);
        let ids: Vec<_> = results.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![0, 3]);
    }

    #[test]
    fn test_heuristic_prefers_diverse_neighbors() {
        let graph: Vec<ElementGraphData> =
            (0..3).map(|i| ElementGraphData::new(i, 0, 4, 2)).collect();
        // Target at 0.0; candidates at 1.0, 1.1 and -1.0.
        let data = vec![1.0f32, 1.1, -1.0];
        let dist_fn = L2Distance::<f32>::new(1);
        let view = GraphView { graph: &graph, data: &data, dim: 1, dist_fn: &dist_fn };

        let candidates = vec![(0, 1.0f32), (1, 1.21), (2, 1.0)];
        let selected = select_neighbors_heuristic(&view, &candidates, 2);
        assert_eq!(selected.len(), 2);
        assert!(selected.contains(&0));
        assert!(selected.contains(&2));

        let all = select_neighbors_heuristic(&view, &candidates, 3);
        assert_eq!(all.len(), 3);
    }
}
