//! FFI bindings for mental-health-score
//!
//! This module provides C-compatible functions for calling the predictor from
//! other languages. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using `mhs_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_double};
use std::ptr;

use crate::artifacts::ArtifactPaths;
use crate::pipeline::respond;
use crate::recommender::recommend;
use crate::types::RiskLevel;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

static VERSION_CSTR: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

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

/// Run a prediction request and return the response JSON.
///
/// The response is either a recommendation or the failure record; failures
/// inside the pipeline do not return NULL.
///
/// # Safety
/// - `request_json` must be a valid null-terminated C string.
/// - `model_dir` must be a valid null-terminated C string or NULL for the default directory.
/// - Returns a newly allocated string that must be freed with `mhs_free_string`.
/// - Returns NULL only if `request_json` is NULL or either string is not UTF-8;
///   call `mhs_last_error` for details.
#[no_mangle]
pub unsafe extern "C" fn mhs_predict(
    request_json: *const c_char,
    model_dir: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let request = match cstr_to_string(request_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid request string pointer");
            return ptr::null_mut();
        }
    };

    let paths = if model_dir.is_null() {
        ArtifactPaths::default()
    } else {
        match cstr_to_string(model_dir) {
            Some(dir) => ArtifactPaths::new(dir),
            None => {
                set_last_error("Model directory is not valid UTF-8");
                return ptr::null_mut();
            }
        }
    };

    string_to_cstr(&respond(&request, &paths).to_json())
}

/// Run the recommendation selector directly and return the Recommendation JSON.
///
/// # Safety
/// - `risk` must be a valid null-terminated C string, "High" or "Low" (case-insensitive).
/// - `activities_json` must be a JSON array of strings, or NULL for the default pool.
/// - Returns a newly allocated string that must be freed with `mhs_free_string`.
/// - Returns NULL on error; call `mhs_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn mhs_recommend(
    risk: *const c_char,
    anxiety: c_double,
    stress: c_double,
    depression: c_double,
    activities_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let risk = match cstr_to_string(risk).map(|s| s.to_lowercase()).as_deref() {
        Some("high") => RiskLevel::High,
        Some("low") => RiskLevel::Low,
        _ => {
            set_last_error("Risk must be \"High\" or \"Low\"");
            return ptr::null_mut();
        }
    };

    let activities: Option<Vec<String>> = match cstr_to_string(activities_json) {
        Some(json) => match serde_json::from_str(&json) {
            Ok(list) => Some(list),
            Err(e) => {
                set_last_error(&format!("Invalid activities JSON: {e}"));
                return ptr::null_mut();
            }
        },
        None => None,
    };

    let recommendation = recommend(risk, anxiety, stress, depression, activities.as_deref());
    match serde_json::to_string(&recommendation) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a string returned by an `mhs_` function.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an `mhs_` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn mhs_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next `mhs_` call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn mhs_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free it.
#[no_mangle]
pub unsafe extern "C" fn mhs_version() -> *const c_char {
    VERSION_CSTR.as_ptr() as *const c_char
}
