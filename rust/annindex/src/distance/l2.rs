//! L2 (Euclidean) squared distance implementation.
//!
//! The square root is skipped: ordering is preserved and a vector's
//! distance to itself is exactly zero.

use super::{DistanceFunction, Metric};
use crate::types::VectorElement;
use std::marker::PhantomData;

/// L2 (Euclidean) squared distance calculator.
pub struct L2Distance<T: VectorElement> {
    dim: usize,
    _phantom: PhantomData<T>,
}

impl<T: VectorElement> L2Distance<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            _phantom: PhantomData,
        }
    }
}

impl<T: VectorElement> DistanceFunction<T> for L2Distance<T> {
    #[inline]
    fn compute(&self, a: &[T], b: &[T]) -> T {
        debug_assert_eq!(a.len(), self.dim);
        debug_assert_eq!(b.len(), self.dim);
        T::from_f64_lossy(l2_squared(a, b))
    }

    fn metric(&self) -> Metric {
        Metric::L2
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

/// Squared L2 distance with four independent accumulators.
#[inline]
pub fn l2_squared<T: VectorElement>(a: &[T], b: &[T]) -> f64 {
    let dim = a.len().min(b.len());
    let mut sum = [0.0f64; 4];

    let unroll = dim / 4 * 4;
    let mut i = 0;
    while i < unroll {
        for lane in 0..4 {
            let d = a[i + lane].as_f64() - b[i + lane].as_f64();
            sum[lane] += d * d;
        }
        i += 4;
    }

    // Handle remaining elements
    while i < dim {
        let d = a[i].as_f64() - b[i].as_f64();
        sum[0] += d * d;
        i += 1;
    }

    sum.iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_identity_is_zero() {
        let dist = L2Distance::<f32>::new(5);
        let v = [0.3f32, -1.5, 2.0, 7.25, 0.0];
        assert_eq!(dist.compute(&v, &v), 0.0);
    }

    #[test]
    fn test_l2_known_values() {
        let dist = L2Distance::<f32>::new(4);
        assert_eq!(dist.compute(&[0.0, 0.0, 0.0, 0.0], &[1.0, 0.0, 0.0, 0.0]), 1.0);
        assert_eq!(dist.compute(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0]), 30.0);
    }

    #[test]
    fn test_l2_odd_dimension() {
        let dist = L2Distance::<f64>::new(7);
        let a = [1.0f64; 7];
        let b = [0.0f64; 7];
        assert_eq!(dist.compute(&a, &b), 7.0);
    }
}
