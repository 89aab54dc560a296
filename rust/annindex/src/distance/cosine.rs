//! Cosine distance implementation.
//!
//! Vectors are normalized to unit length by [`DistanceFunction::preprocess`]
//! before they are stored or searched, so the distance itself is the inner
//! product distance `1 - <a, b>` over unit vectors.

use super::{check_finite, dot, DistanceFunction, Metric, SpaceRejection};
use crate::types::VectorElement;
use std::marker::PhantomData;

/// Cosine distance calculator.
pub struct CosineDistance<T: VectorElement> {
    dim: usize,
    _phantom: PhantomData<T>,
}

impl<T: VectorElement> CosineDistance<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            _phantom: PhantomData,
        }
    }
}

impl<T: VectorElement> DistanceFunction<T> for CosineDistance<T> {
    #[inline]
    fn compute(&self, a: &[T], b: &[T]) -> T {
        debug_assert_eq!(a.len(), self.dim);
        debug_assert_eq!(b.len(), self.dim);
        T::from_f64_lossy(1.0 - dot(a, b))
    }

    fn metric(&self) -> Metric {
        Metric::Cosine
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn preprocess(&self, vector: &[T]) -> Vec<T> {
        normalize_vector(vector)
    }

    fn validate(&self, vector: &[T]) -> Result<(), SpaceRejection> {
        check_finite(vector)?;
        if compute_norm(vector) == 0.0 {
            return Err(SpaceRejection::ZeroNorm);
        }
        Ok(())
    }
}

/// L2 norm of a vector.
pub fn compute_norm<T: VectorElement>(vector: &[T]) -> f64 {
    dot(vector, vector).sqrt()
}

/// Return a unit-length copy of `vector`. Zero vectors are returned unchanged.
pub fn normalize_vector<T: VectorElement>(vector: &[T]) -> Vec<T> {
    let norm = compute_norm(vector);
    if norm == 0.0 {
        return vector.to_vec();
    }
    vector
        .iter()
        .map(|&v| T::from_f64_lossy(v.as_f64() / norm))
        .collect()
}
