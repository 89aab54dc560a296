//! Log forwarding to a caller-registered C callback.
//!
//! Events always go through `tracing`; warnings are additionally handed to
//! the callback set with `AnnIndex_SetLogCallback`, if any.

use crate::types::logCallbackFunction;
use std::ffi::CString;
use std::sync::RwLock;

/// Global log callback function.
static GLOBAL_LOG_CALLBACK: RwLock<logCallbackFunction> = RwLock::new(None);

pub(crate) fn set_log_callback(callback: logCallbackFunction) {
    if let Ok(mut guard) = GLOBAL_LOG_CALLBACK.write() {
        *guard = callback;
    }
}

/// Emit a warning through `tracing` and the registered callback.
pub(crate) fn warn(message: &str) {
    tracing::warn!("{message}");
    forward("warning", message);
}

fn forward(level: &str, message: &str) {
    let callback = GLOBAL_LOG_CALLBACK.read().ok().and_then(|g| *g);
    let Some(callback) = callback else {
        return;
    };
    let (Ok(level), Ok(message)) = (CString::new(level), CString::new(message.replace('\0', " ")))
    else {
        return;
    };
    // SAFETY: the caller registered a callback that accepts two
    // NUL-terminated strings valid for the duration of the call.
    unsafe { callback(level.as_ptr(), message.as_ptr()) };
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::ffi::{c_char, CStr};
    use std::sync::Mutex;

    /// Messages captured by [`capture`]; shared by every test in the crate.
    pub(crate) static CAPTURED: Mutex<Vec<(String, String)>> = Mutex::new(Vec::new());

    pub(crate) unsafe extern "C" fn capture(level: *const c_char, message: *const c_char) {
        let level = CStr::from_ptr(level).to_string_lossy().into_owned();
        let message = CStr::from_ptr(message).to_string_lossy().into_owned();
        CAPTURED.lock().unwrap().push((level, message));
    }

    #[test]
    fn test_warning_reaches_callback() {
        set_log_callback(Some(capture));
        warn("log forwarding check");

        let captured = CAPTURED.lock().unwrap();
        assert!(captured
            .iter()
            .any(|(level, msg)| level == "warning" && msg == "log forwarding check"));
    }
}
