//! Automatic capacity growth on insert.

use annindex::index::{HnswIndex, IndexError};
use annindex::types::VectorElement;

/// Below this capacity growth doubles; at or above it grows by half.
pub const GROWTH_THRESHOLD: usize = (1 << 23) - 1;

/// Capacity to grow to from `current`. Always strictly greater than `current`.
pub fn next_capacity(current: usize) -> usize {
    if current < GROWTH_THRESHOLD {
        (current * 2).max(1)
    } else {
        current.saturating_add(current / 2)
    }
}

/// Grow the engine once when the element about to be inserted fills it.
///
/// The count checked includes that element, so an index initialized for two
/// elements has grown to four once the second one is in. Returns the new
/// capacity when a resize happened.
pub fn ensure_room<T: VectorElement>(engine: &mut HnswIndex<T>) -> Result<Option<usize>, IndexError> {
    let count = engine.current_count().saturating_add(1);
    let capacity = engine.max_elements();
    if count < capacity {
        return Ok(None);
    }
    let grown = next_capacity(capacity);
    engine.resize(grown)?;
    tracing::debug!(count, from = capacity, to = grown, "grew index capacity");
    Ok(Some(grown))
}
