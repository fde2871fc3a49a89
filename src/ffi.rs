//! C FFI exports for .NET P/Invoke.
//!
//! These functions provide a C-compatible interface for calling Rust functions from C#.
//! All functions use JSON strings for input/output to simplify marshalling.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use crate::domain::normalize_domain;
use crate::grouper::group_duplicates_json;
use crate::record_merge::merge_group_json;

/// Extract the registrable domain from a URL.
///
/// # Safety
///
/// - `url` must be a valid null-terminated C string
/// - The returned pointer must be freed by calling `free_string`
///
/// # Returns
///
/// A null-terminated C string containing `{"success":true,"domain":"..."}`,
/// or an error response. Returns null on null input.
#[no_mangle]
pub unsafe extern "C" fn normalize_domain_ffi(url: *const c_char) -> *mut c_char {
    let Some(url) = c_str_arg(url) else {
        return ptr::null_mut();
    };

    match normalize_domain(url) {
        Ok(domain) => {
            let response = serde_json::json!({ "success": true, "domain": domain });
            string_to_c_char(response.to_string())
        }
        Err(e) => create_error_response(&e.to_string()),
    }
}

/// Group a JSON array of records into duplicate groups.
///
/// # Safety
///
/// - `input_json` must be a valid null-terminated C string
/// - The returned pointer must be freed by calling `free_string`
///
/// # Returns
///
/// A null-terminated C string containing the JSON result (GroupingOutput).
/// Returns null on null input.
#[no_mangle]
pub unsafe extern "C" fn group_duplicates_ffi(input_json: *const c_char) -> *mut c_char {
    let Some(input) = c_str_arg(input_json) else {
        return ptr::null_mut();
    };

    match group_duplicates_json(input) {
        Ok(json) => string_to_c_char(json),
        Err(e) => create_error_response(&format!("Grouping failed: {}", e)),
    }
}

/// Merge one duplicate group (JSON array of records).
///
/// # Safety
///
/// - `input_json` must be a valid null-terminated C string
/// - The returned pointer must be freed by calling `free_string`
///
/// # Returns
///
/// A null-terminated C string containing the JSON result (GroupMergePlan).
/// Returns null on null input.
#[no_mangle]
pub unsafe extern "C" fn merge_group_ffi(input_json: *const c_char) -> *mut c_char {
    let Some(input) = c_str_arg(input_json) else {
        return ptr::null_mut();
    };

    match merge_group_json(input) {
        Ok(json) => string_to_c_char(json),
        Err(e) => create_error_response(&format!("Merge failed: {}", e)),
    }
}

/// Free a string that was allocated by Rust.
///
/// # Safety
///
/// - `s` must be a pointer that was returned by one of the FFI functions
/// - This function must only be called once per pointer
/// - After calling this function, the pointer is invalid
#[no_mangle]
pub unsafe extern "C" fn free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Borrow a C string argument, or `None` for null / non-UTF-8 input.
unsafe fn c_str_arg<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    CStr::from_ptr(s).to_str().ok()
}

/// Convert a Rust string to a C string pointer.
fn string_to_c_char(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c_string) => c_string.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Create an error response JSON string.
fn create_error_response(message: &str) -> *mut c_char {
    let response = serde_json::json!({ "success": false, "error": message });
    string_to_c_char(response.to_string())
}
