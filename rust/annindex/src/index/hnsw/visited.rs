//! Visited nodes tracking for HNSW graph traversal.
//!
//! - `VisitedNodesHandler`: tag-based visited set, reset in O(1)
//! - `VisitedNodesHandlerPool`: handlers shared by concurrent readers

use crate::types::IdType;
use parking_lot::Mutex;
use std::cell::Cell;

/// Tracks visited nodes during one graph traversal.
///
/// Instead of clearing the array between searches the current tag is
/// incremented; a node is visited if its stored tag matches.
pub struct VisitedNodesHandler {
    tags: Vec<Cell<u32>>,
    current_tag: u32,
}

impl VisitedNodesHandler {
    pub fn new(capacity: usize) -> Self {
        Self {
            tags: vec![Cell::new(0); capacity],
            current_tag: 1,
        }
    }

    /// Reset for a new search.
    #[inline]
    pub fn reset(&mut self) {
        self.current_tag = self.current_tag.wrapping_add(1);
        if self.current_tag == 0 {
            for tag in &self.tags {
                tag.set(0);
            }
            self.current_tag = 1;
        }
    }

    /// Mark a node as visited. Returns true if it was already visited.
    ///
    /// Ids beyond the capacity are reported as already visited so that a
    /// stale handler can never make a traversal revisit nodes forever.
    #[inline]
    pub fn visit(&self, id: IdType) -> bool {
        match self.tags.get(id as usize) {
            Some(tag) => tag.replace(self.current_tag) == self.current_tag,
            None => true,
        }
    }

    #[inline]
    pub fn is_visited(&self, id: IdType) -> bool {
        self.tags
            .get(id as usize)
            .is_some_and(|tag| tag.get() == self.current_tag)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.tags.len()
    }

    pub fn resize(&mut self, new_capacity: usize) {
        if new_capacity > self.tags.len() {
            self.tags.resize(new_capacity, Cell::new(0));
        }
    }
}

/// Pool of visited handlers so that read-only searches can run side by side.
///
/// Handlers grow with the graph rather than with its capacity, so a large
/// reserved capacity costs nothing until elements arrive.
#[derive(Default)]
pub struct VisitedNodesHandlerPool {
    handlers: Mutex<Vec<VisitedNodesHandler>>,
}

impl VisitedNodesHandlerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check out a reset handler covering ids `0..num_nodes`.
    pub fn get(&self, num_nodes: usize) -> PooledHandler<'_> {
        let mut handler = self
            .handlers
            .lock()
            .pop()
            .unwrap_or_else(|| VisitedNodesHandler::new(num_nodes));
        handler.resize(num_nodes);
        handler.reset();
        PooledHandler {
            handler: Some(handler),
            pool: self,
        }
    }

    /// Number of handlers waiting in the pool.
    pub fn idle(&self) -> usize {
        self.handlers.lock().len()
    }
}

/// A handler checked out from the pool; returned on drop.
pub struct PooledHandler<'a> {
    handler: Option<VisitedNodesHandler>,
    pool: &'a VisitedNodesHandlerPool,
}

impl std::ops::Deref for PooledHandler<'_> {
    type Target = VisitedNodesHandler;

    fn deref(&self) -> &Self::Target {
        // Only taken in drop.
        self.handler.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledHandler<'_> {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            self.pool.handlers.lock().push(handler);
        }
    }
}
