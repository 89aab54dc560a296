//! Distance spaces for vector similarity.
//!
//! This module provides the metrics an index can be built over:
//! - L2 (squared Euclidean) distance
//! - Inner product distance (`1 - <a, b>`)
//! - Cosine distance (inner product over normalized vectors)
//!
//! A space is created once per index with [`create_distance_function`] and
//! shared between the index and whoever owns it.

pub mod cosine;
pub mod ip;
pub mod l2;

use crate::types::VectorElement;
use std::sync::Arc;
use thiserror::Error;

/// Distance metric types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// L2 (Euclidean) squared distance.
    L2,
    /// Inner product, reported as `1 - <a, b>` so that lower is closer.
    InnerProduct,
    /// Cosine distance. Vectors are normalized before storage and search.
    Cosine,
}

impl Metric {
    /// Get a human-readable name for the metric.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::L2 => "L2",
            Metric::InnerProduct => "IP",
            Metric::Cosine => "Cosine",
        }
    }

    /// Stable numeric id used in snapshot headers.
    pub fn to_u8(self) -> u8 {
        match self {
            Metric::L2 => 1,
            Metric::InnerProduct => 2,
            Metric::Cosine => 3,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Metric::L2),
            2 => Some(Metric::InnerProduct),
            3 => Some(Metric::Cosine),
            _ => None,
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Reasons a space refuses to accept a vector.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpaceRejection {
    #[error("component {index} is not a finite number")]
    NonFinite { index: usize },

    #[error("zero vector cannot be normalized")]
    ZeroNorm,
}

/// Trait for distance computation functions.
pub trait DistanceFunction<T: VectorElement>: Send + Sync {
    /// Compute the distance between two vectors of the space's dimension.
    fn compute(&self, a: &[T], b: &[T]) -> T;

    /// Get the metric type.
    fn metric(&self) -> Metric;

    /// Vector dimension this space was created for.
    fn dim(&self) -> usize;

    /// Pre-process a vector before storage or search (e.g., normalize for cosine).
    fn preprocess(&self, vector: &[T]) -> Vec<T> {
        vector.to_vec()
    }

    /// Check that the space can represent this vector.
    fn validate(&self, vector: &[T]) -> Result<(), SpaceRejection> {
        check_finite(vector)
    }
}

/// Shared handle to a distance space.
pub type Space<T> = Arc<dyn DistanceFunction<T>>;

/// Create a distance space for the given metric and element type.
pub fn create_distance_function<T: VectorElement>(metric: Metric, dim: usize) -> Space<T> {
    match metric {
        Metric::L2 => Arc::new(l2::L2Distance::<T>::new(dim)),
        Metric::InnerProduct => Arc::new(ip::InnerProductDistance::<T>::new(dim)),
        Metric::Cosine => Arc::new(cosine::CosineDistance::<T>::new(dim)),
    }
}

pub(crate) fn check_finite<T: VectorElement>(vector: &[T]) -> Result<(), SpaceRejection> {
    match vector.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(SpaceRejection::NonFinite { index }),
        None => Ok(()),
    }
}

/// Dot product accumulated in f64.
#[inline]
pub(crate) fn dot<T: VectorElement>(a: &[T], b: &[T]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| x.as_f64() * y.as_f64())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_ids_roundtrip() {
        for metric in [Metric::L2, Metric::InnerProduct, Metric::Cosine] {
            assert_eq!(Metric::from_u8(metric.to_u8()), Some(metric));
        }
        assert_eq!(Metric::from_u8(0), None);
    }

    #[test]
    fn test_create_distance_functions() {
        let l2: Space<f32> = create_distance_function(Metric::L2, 8);
        assert_eq!(l2.metric(), Metric::L2);
        assert_eq!(l2.dim(), 8);

        let ip: Space<f32> = create_distance_function(Metric::InnerProduct, 8);
        assert_eq!(ip.metric(), Metric::InnerProduct);

        let cos: Space<f64> = create_distance_function(Metric::Cosine, 8);
        assert_eq!(cos.metric(), Metric::Cosine);
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let l2: Space<f32> = create_distance_function(Metric::L2, 3);
        assert!(l2.validate(&[1.0, 2.0, 3.0]).is_ok());
        assert_eq!(
            l2.validate(&[1.0, f32::NAN, 3.0]),
            Err(SpaceRejection::NonFinite { index: 1 })
        );
        assert_eq!(
            l2.validate(&[f32::INFINITY, 0.0, 0.0]),
            Err(SpaceRejection::NonFinite { index: 0 })
        );
    }
}
