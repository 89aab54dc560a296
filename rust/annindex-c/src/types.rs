//! C-compatible type definitions for the annindex FFI.

use annindex::distance::Metric;
use std::ffi::c_char;

/// Result code returned by every fallible boundary call.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnIndexErrorCode {
    AnnIndex_Success = 0,
    /// An internal failure was caught at the boundary.
    AnnIndex_ExceptionThrown = 1,
    AnnIndex_AlreadyInitialized = 2,
    /// Fewer than `k` results qualified for a query.
    AnnIndex_QueryCannotReturn = 3,
    /// The distance space rejected a vector.
    AnnIndex_ItemRejected = 4,
    /// The handle was cleared and is permanently unusable.
    AnnIndex_AlreadyCleared = 5,
    AnnIndex_DataRetrievalFailed = 6,
    /// The id is absent or tombstoned.
    AnnIndex_IdNotInIndex = 7,
    AnnIndex_NotInitialized = 8,
}

/// Distance space of an index.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnIndexSpace {
    AnnIndexSpace_L2 = 0,
    AnnIndexSpace_IP = 1,
    AnnIndexSpace_Cosine = 2,
}

impl AnnIndexSpace {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::AnnIndexSpace_L2),
            1 => Some(Self::AnnIndexSpace_IP),
            2 => Some(Self::AnnIndexSpace_Cosine),
            _ => None,
        }
    }

    pub fn to_metric(self) -> Metric {
        match self {
            Self::AnnIndexSpace_L2 => Metric::L2,
            Self::AnnIndexSpace_IP => Metric::InnerProduct,
            Self::AnnIndexSpace_Cosine => Metric::Cosine,
        }
    }
}

/// Lifecycle state reported by `AnnIndex_GetState`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnIndexState {
    AnnIndexState_Uninitialized = 0,
    AnnIndexState_Initialized = 1,
    AnnIndexState_Cleared = 2,
}

/// Caller-visible id type. Non-negative ids are labels.
pub type idType = i64;

/// Id value asking the handle to assign the next automatic id.
pub const AUTO_ID: idType = -1;

/// Per-query predicate: return true to keep an id in the results.
pub type filterFunction = Option<unsafe extern "C" fn(id: idType) -> bool>;

/// Log callback function type.
pub type logCallbackFunction =
    Option<unsafe extern "C" fn(level: *const c_char, message: *const c_char)>;

/// Opaque index handle.
#[repr(C)]
pub struct AnnIndex {
    _private: [u8; 0],
}
