//! Adapter from a C predicate to the engine's label filter.

use crate::types::idType;
use annindex::query::LabelFilter;
use annindex::types::LabelType;

/// A caller-supplied predicate, valid for the duration of one query.
pub struct ForeignFilter {
    func: unsafe extern "C" fn(id: idType) -> bool,
}

impl ForeignFilter {
    /// # Safety
    /// `func` must be safe to call with any id stored in the index.
    pub unsafe fn new(func: unsafe extern "C" fn(id: idType) -> bool) -> Self {
        Self { func }
    }
}

impl LabelFilter for ForeignFilter {
    #[inline]
    fn allows(&self, label: LabelType) -> bool {
        // SAFETY: upheld by the caller of `ForeignFilter::new`.
        unsafe { (self.func)(label as idType) }
    }
}
