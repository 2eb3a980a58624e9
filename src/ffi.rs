//! FFI bindings for livecheck
//!
//! This module provides C-compatible functions so host applications (the
//! camera/UI layer is typically not Rust) can drive a verification session.
//! All functions use C strings (null-terminated) and return allocated memory
//! that must be freed by the caller using `livecheck_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::pipeline::{frames_to_reports, LivenessProcessor};
use crate::ENGINE_VERSION;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Process a JSON array of frame inputs and return a JSON array of reports.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with
///   `livecheck_free_string`.
/// - Returns NULL on error; call `livecheck_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn livecheck_frames_to_reports(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match frames_to_reports(&json_str) {
        Ok(reports) => {
            let elements: Vec<&str> = reports.iter().map(|s| s.as_str()).collect();
            string_to_cstr(&format!("[{}]", elements.join(",")))
        }
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful session API
// ============================================================================

/// Create a new verification session.
///
/// # Safety
/// The returned pointer must be freed with `livecheck_session_free`.
#[no_mangle]
pub extern "C" fn livecheck_session_new() -> *mut LivenessProcessor {
    Box::into_raw(Box::new(LivenessProcessor::new()))
}

/// Free a session created with `livecheck_session_new`.
///
/// # Safety
/// `session` must be a pointer returned by `livecheck_session_new` that has
/// not already been freed. NULL is a no-op.
#[no_mangle]
pub unsafe extern "C" fn livecheck_session_free(session: *mut LivenessProcessor) {
    if !session.is_null() {
        drop(Box::from_raw(session));
    }
}

/// Discard a session's state and start over.
///
/// # Safety
/// `session` must be a valid pointer from `livecheck_session_new`.
#[no_mangle]
pub unsafe extern "C" fn livecheck_session_reset(session: *mut LivenessProcessor) {
    if let Some(processor) = session.as_mut() {
        processor.reset();
    }
}

/// Process one frame (JSON) through a session and return the report JSON.
///
/// # Safety
/// - `session` must be a valid pointer from `livecheck_session_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with
///   `livecheck_free_string`.
/// - Returns NULL on error; call `livecheck_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn livecheck_process_frame(
    session: *mut LivenessProcessor,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let processor = match session.as_mut() {
        Some(p) => p,
        None => {
            set_last_error("NULL session pointer");
            return ptr::null_mut();
        }
    };

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match processor.process_json(&json_str) {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Return the last error message, or NULL if none.
///
/// # Safety
/// The returned string must be freed with `livecheck_free_string`.
#[no_mangle]
pub extern "C" fn livecheck_last_error() -> *mut c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(msg) => string_to_cstr(msg.to_str().unwrap_or("Invalid error message")),
        None => ptr::null_mut(),
    })
}

/// Return the engine version string.
///
/// # Safety
/// The returned string must be freed with `livecheck_free_string`.
#[no_mangle]
pub extern "C" fn livecheck_version() -> *mut c_char {
    string_to_cstr(ENGINE_VERSION)
}

/// Free a string allocated by this library.
///
/// # Safety
/// `s` must be a pointer returned by a livecheck function that has not
/// already been freed. NULL is a no-op.
#[no_mangle]
pub unsafe extern "C" fn livecheck_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_cstring(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        livecheck_free_string(ptr);
        s
    }

    #[test]
    fn test_session_lifecycle() {
        unsafe {
            let session = livecheck_session_new();
            let input = to_cstring(r#"{"face": null}"#);

            let report = livecheck_process_frame(session, input.as_ptr());
            let report = take_string(report);
            let value: serde_json::Value = serde_json::from_str(&report).unwrap();
            assert_eq!(value["face_detected"], false);
            assert_eq!(value["provenance"]["frame_seq"], 1);

            livecheck_session_reset(session);
            let report = livecheck_process_frame(session, input.as_ptr());
            let report = take_string(report);
            let value: serde_json::Value = serde_json::from_str(&report).unwrap();
            assert_eq!(value["provenance"]["frame_seq"], 1);

            livecheck_session_free(session);
        }
    }

    #[test]
    fn test_invalid_json_sets_last_error() {
        unsafe {
            let session = livecheck_session_new();
            let input = to_cstring("not json");

            let report = livecheck_process_frame(session, input.as_ptr());
            assert!(report.is_null());

            let error = livecheck_last_error();
            let error = take_string(error);
            assert!(error.contains("parse"));

            livecheck_session_free(session);
        }
    }

    #[test]
    fn test_stateless_batch() {
        unsafe {
            let input = to_cstring(r#"[{"face": null}, {"face": null}]"#);
            let output = livecheck_frames_to_reports(input.as_ptr());
            let output = take_string(output);
            let value: serde_json::Value = serde_json::from_str(&output).unwrap();
            assert_eq!(value.as_array().unwrap().len(), 2);
        }
    }

    #[test]
    fn test_null_pointers_are_safe() {
        unsafe {
            assert!(livecheck_process_frame(ptr::null_mut(), ptr::null()).is_null());
            livecheck_session_free(ptr::null_mut());
            livecheck_free_string(ptr::null_mut());
        }
    }
}
