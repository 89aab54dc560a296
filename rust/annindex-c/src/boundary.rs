//! Error and panic containment for exported functions.

use crate::error::HandleError;
use crate::types::AnnIndexErrorCode;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Run an exported call body and translate its outcome into a result code.
///
/// Errors and panics are both contained; nothing unwinds into the caller.
pub(crate) fn guard<F>(op: &'static str, body: F) -> AnnIndexErrorCode
where
    F: FnOnce() -> Result<(), HandleError>,
{
    match run(op, body) {
        Ok(()) => AnnIndexErrorCode::AnnIndex_Success,
        Err(err) => AnnIndexErrorCode::from(&err),
    }
}

/// Like [`guard`], for calls whose only output channel is a value.
///
/// Any failure yields `fallback`.
pub(crate) fn guard_value<T, F>(op: &'static str, fallback: T, body: F) -> T
where
    F: FnOnce() -> Result<T, HandleError>,
{
    run(op, body).unwrap_or(fallback)
}

fn run<T, F>(op: &'static str, body: F) -> Result<T, HandleError>
where
    F: FnOnce() -> Result<T, HandleError>,
{
    let result = panic::catch_unwind(AssertUnwindSafe(body))
        .unwrap_or_else(|payload| Err(HandleError::Panic(panic_message(payload.as_ref()))));
    if let Err(err) = &result {
        match err {
            HandleError::Panic(_) => tracing::error!(op, error = %err, "call panicked"),
            _ => tracing::debug!(op, error = %err, "call failed"),
        }
    }
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_success_and_error() {
        assert_eq!(guard("ok", || Ok(())), AnnIndexErrorCode::AnnIndex_Success);
        assert_eq!(
            guard("fail", || Err(HandleError::NotInitialized)),
            AnnIndexErrorCode::AnnIndex_NotInitialized
        );
    }

    #[test]
    fn test_guard_contains_panics() {
        let code = guard("panics", || panic!("engine invariant broken"));
        assert_eq!(code, AnnIndexErrorCode::AnnIndex_ExceptionThrown);

        let value = guard_value("panics", f32::NAN, || -> Result<f32, HandleError> {
            panic!("boom")
        });
        assert!(value.is_nan());
    }

    #[test]
    fn test_guard_value_passes_through() {
        assert_eq!(guard_value("ok", 0usize, || Ok(7)), 7);
        assert_eq!(guard_value("fail", 0usize, || Err(HandleError::AlreadyCleared)), 0);
    }
}
