//! Label predicates consulted while searching.

use crate::types::LabelType;

/// Predicate deciding whether a label may appear in search results.
///
/// The search calls [`LabelFilter::allows`] once per candidate it considers
/// for the result set. Rejected candidates are still traversed, so a strict
/// filter costs recall breadth but never disconnects the graph.
pub trait LabelFilter {
    fn allows(&self, label: LabelType) -> bool;
}

impl<F> LabelFilter for F
where
    F: Fn(LabelType) -> bool,
{
    #[inline]
    fn allows(&self, label: LabelType) -> bool {
        self(label)
    }
}

/// Filter that accepts every label.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl LabelFilter for AllowAll {
    #[inline]
    fn allows(&self, _label: LabelType) -> bool {
        true
    }
}
