//! Internal failures of the boundary layer and their fixed result codes.

use crate::types::{idType, AnnIndexErrorCode};
use annindex::distance::SpaceRejection;
use annindex::index::IndexError;
use annindex::serialization::SerializationError;
use thiserror::Error;

/// Everything that can go wrong inside an exported call.
///
/// Never crosses the boundary: [`crate::boundary::guard`] turns it into an
/// [`AnnIndexErrorCode`].
#[derive(Error, Debug)]
pub enum HandleError {
    #[error("index is already initialized")]
    AlreadyInitialized,

    #[error("index is not initialized")]
    NotInitialized,

    #[error("index was cleared")]
    AlreadyCleared,

    #[error("query asked for {requested} results but only {found} qualified")]
    QueryCannotReturn { requested: usize, found: usize },

    #[error("id {0} is not in the index")]
    IdNotInIndex(idType),

    #[error("vector rejected: {0}")]
    ItemRejected(SpaceRejection),

    #[error("data retrieval failed: {0}")]
    DataRetrievalFailed(String),

    #[error("null pointer passed for {0}")]
    NullPointer(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Engine(#[from] IndexError),

    #[error("snapshot error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("panic: {0}")]
    Panic(String),
}

impl From<&HandleError> for AnnIndexErrorCode {
    fn from(err: &HandleError) -> Self {
        use AnnIndexErrorCode::*;
        match err {
            HandleError::AlreadyInitialized => AnnIndex_AlreadyInitialized,
            HandleError::NotInitialized => AnnIndex_NotInitialized,
            HandleError::AlreadyCleared => AnnIndex_AlreadyCleared,
            HandleError::QueryCannotReturn { .. } => AnnIndex_QueryCannotReturn,
            HandleError::IdNotInIndex(_) => AnnIndex_IdNotInIndex,
            HandleError::ItemRejected(_) => AnnIndex_ItemRejected,
            HandleError::DataRetrievalFailed(_) => AnnIndex_DataRetrievalFailed,
            HandleError::Engine(IndexError::Rejected(_)) => AnnIndex_ItemRejected,
            HandleError::Engine(
                IndexError::LabelNotFound(_) | IndexError::AlreadyDeleted(_) | IndexError::NotDeleted(_),
            ) => AnnIndex_IdNotInIndex,
            HandleError::Engine(_)
            | HandleError::NullPointer(_)
            | HandleError::InvalidArgument(_)
            | HandleError::Serialization(_)
            | HandleError::Panic(_) => AnnIndex_ExceptionThrown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn code(err: HandleError) -> AnnIndexErrorCode {
        AnnIndexErrorCode::from(&err)
    }

    #[test]
    fn test_lifecycle_codes() {
        assert_eq!(code(HandleError::AlreadyInitialized), AnnIndexErrorCode::AnnIndex_AlreadyInitialized);
        assert_eq!(code(HandleError::NotInitialized), AnnIndexErrorCode::AnnIndex_NotInitialized);
        assert_eq!(code(HandleError::AlreadyCleared), AnnIndexErrorCode::AnnIndex_AlreadyCleared);
    }

    #[test]
    fn test_engine_errors_are_translated() {
        assert_eq!(
            code(IndexError::Rejected(SpaceRejection::ZeroNorm).into()),
            AnnIndexErrorCode::AnnIndex_ItemRejected
        );
        assert_eq!(
            code(IndexError::AlreadyDeleted(3).into()),
            AnnIndexErrorCode::AnnIndex_IdNotInIndex
        );
        assert_eq!(
            code(IndexError::CapacityExceeded { capacity: 1 }.into()),
            AnnIndexErrorCode::AnnIndex_ExceptionThrown
        );
        assert_eq!(
            code(IndexError::ReplaceDeletedNotAllowed.into()),
            AnnIndexErrorCode::AnnIndex_ExceptionThrown
        );
    }

    #[test]
    fn test_catch_all_codes() {
        let io_err = SerializationError::Io(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(code(io_err.into()), AnnIndexErrorCode::AnnIndex_ExceptionThrown);
        assert_eq!(code(HandleError::NullPointer("vector")), AnnIndexErrorCode::AnnIndex_ExceptionThrown);
        assert_eq!(code(HandleError::Panic("boom".into())), AnnIndexErrorCode::AnnIndex_ExceptionThrown);
        assert_eq!(
            code(HandleError::QueryCannotReturn { requested: 3, found: 1 }),
            AnnIndexErrorCode::AnnIndex_QueryCannotReturn
        );
    }
}
