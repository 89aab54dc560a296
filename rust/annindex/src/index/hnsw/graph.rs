//! Graph data structures for the HNSW index.
//!
//! - `ElementMetaData`: label, top level and tombstone of one element
//! - `ElementGraphData`: the element's neighbor lists, one per level

use crate::types::{IdType, LabelType};

/// Default number of connections per element on levels above 0.
pub const DEFAULT_M: usize = 16;

/// Links reserved per level when an element is created.
pub const MAX_RESERVED_LINKS: usize = 128;

/// Metadata for a single element in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementMetaData {
    /// External label.
    pub label: LabelType,
    /// Highest level this element appears in.
    pub level: u8,
    /// Tombstone set by soft deletion.
    pub deleted: bool,
}

impl ElementMetaData {
    pub fn new(label: LabelType, level: u8) -> Self {
        Self {
            label,
            level,
            deleted: false,
        }
    }
}

/// Graph data for an element across all of its levels.
#[derive(Debug, Clone)]
pub struct ElementGraphData {
    pub meta: ElementMetaData,
    /// `levels[l]` holds the neighbor ids at level `l`.
    levels: Vec<Vec<IdType>>,
}

impl ElementGraphData {
    /// Create an element with empty neighbor lists for levels `0..=level`.
    ///
    /// Level 0 reserves room for `m_max_0` links, the upper levels for `m`,
    /// up to [`MAX_RESERVED_LINKS`] per level.
    pub fn new(label: LabelType, level: u8, m_max_0: usize, m: usize) -> Self {
        let levels = (0..=level as usize)
            .map(|l| {
                let max_links = if l == 0 { m_max_0 } else { m };
                Vec::with_capacity(max_links.min(MAX_RESERVED_LINKS))
            })
            .collect();
        Self {
            meta: ElementMetaData::new(label, level),
            levels,
        }
    }

    /// Number of levels (top level + 1).
    #[inline]
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Neighbors at a level; empty above the element's top level.
    #[inline]
    pub fn neighbors(&self, level: usize) -> &[IdType] {
        self.levels.get(level).map_or(&[], |links| links.as_slice())
    }

    pub fn set_neighbors(&mut self, level: usize, neighbors: &[IdType]) {
        if let Some(links) = self.levels.get_mut(level) {
            links.clear();
            links.extend_from_slice(neighbors);
        }
    }

    /// Append a neighbor unless it is already linked.
    ///
    /// Returns false when the level does not exist or the link is present.
    pub fn push_neighbor(&mut self, level: usize, neighbor: IdType) -> bool {
        match self.levels.get_mut(level) {
            Some(links) if !links.contains(&neighbor) => {
                links.push(neighbor);
                true
            }
            _ => false,
        }
    }
}
