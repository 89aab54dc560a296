//! Errors raised by index operations.

use crate::distance::SpaceRejection;
use crate::types::LabelType;
use thiserror::Error;

/// Errors that can occur during index operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("Vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Index is at capacity ({capacity})")]
    CapacityExceeded { capacity: usize },

    #[error("Label {0} not found in index")]
    LabelNotFound(LabelType),

    #[error("Label {0} is already marked deleted")]
    AlreadyDeleted(LabelType),

    #[error("Label {0} is not marked deleted")]
    NotDeleted(LabelType),

    #[error("Replacement of deleted elements is disabled for this index")]
    ReplaceDeletedNotAllowed,

    #[error("Vector rejected by the distance space: {0}")]
    Rejected(#[from] SpaceRejection),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Memory allocation failed for {0} elements")]
    MemoryExhausted(usize),
}
