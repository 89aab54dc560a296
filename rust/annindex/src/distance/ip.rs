//! Inner product distance implementation.
//!
//! Reported as `1 - sum(a[i] * b[i])` so that lower values mean closer,
//! consistent with the other metrics. For unit vectors this is the cosine
//! distance.

use super::{dot, DistanceFunction, Metric};
use crate::types::VectorElement;
use std::marker::PhantomData;

/// Inner product distance calculator.
pub struct InnerProductDistance<T: VectorElement> {
    dim: usize,
    _phantom: PhantomData<T>,
}

impl<T: VectorElement> InnerProductDistance<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            _phantom: PhantomData,
        }
    }
}

impl<T: VectorElement> DistanceFunction<T> for InnerProductDistance<T> {
    #[inline]
    fn compute(&self, a: &[T], b: &[T]) -> T {
        debug_assert_eq!(a.len(), self.dim);
        debug_assert_eq!(b.len(), self.dim);
        T::from_f64_lossy(1.0 - dot(a, b))
    }

    fn metric(&self) -> Metric {
        Metric::InnerProduct
    }

    fn dim(&self) -> usize {
        self.dim
    }
}
