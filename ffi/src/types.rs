//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Results cross the boundary as a single envelope: a C enum error code, the
//! HTTP status when there was one, and a heap-allocated C string holding the
//! rendered text. Conversion functions live here to keep `lib.rs` focused on
//! the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use hass_core::ErrorKind;
use hass_tools::{Failure, ToolError, ToolResult};

/// Opaque handle to a `HassClient` and the runtime that drives it. C callers
/// receive a pointer to this and pass it back into every FFI function.
pub struct FfiHassClient {
    pub(crate) runtime: tokio::runtime::Runtime,
    pub(crate) inner: hass_core::HassClient,
}

/// Outcome category of an invocation.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Authentication = 1,
    NotFound = 2,
    Timeout = 3,
    Network = 4,
    Decode = 5,
    Unclassified = 6,
    Validation = 7,
    UnknownTool = 8,
    NullArg = 9,
    Panic = 10,
}

impl From<ErrorKind> for FfiErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Authentication => FfiErrorCode::Authentication,
            ErrorKind::NotFound => FfiErrorCode::NotFound,
            ErrorKind::Timeout => FfiErrorCode::Timeout,
            ErrorKind::Network => FfiErrorCode::Network,
            ErrorKind::Decode => FfiErrorCode::Decode,
            ErrorKind::Unclassified => FfiErrorCode::Unclassified,
        }
    }
}

/// Result envelope returned by `hass_tool_invoke`.
///
/// `text` is always non-null and owned by the envelope; free the whole
/// result with `hass_free_result`.
#[repr(C)]
pub struct FfiToolResult {
    pub error_code: FfiErrorCode,
    /// HTTP status for API failures (408 for the deadline, 0 without a
    /// response); 0 otherwise.
    pub http_status: u16,
    pub text: *mut c_char,
}

/// Copy `s` into a C string, dropping interior NUL bytes.
pub(crate) fn to_c_string(s: &str) -> *mut c_char {
    CString::new(s.replace('\0', ""))
        .unwrap_or_default()
        .into_raw()
}

impl FfiToolResult {
    fn boxed(error_code: FfiErrorCode, http_status: u16, text: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiToolResult {
            error_code,
            http_status,
            text: to_c_string(text),
        }))
    }

    pub(crate) fn from_tool_result(result: ToolResult) -> *mut Self {
        let (code, status) = match &result.failure {
            None => (FfiErrorCode::Ok, 0),
            Some(Failure::Api { kind, status }) => ((*kind).into(), *status),
            Some(Failure::Validation(ToolError::UnknownTool(_))) => (FfiErrorCode::UnknownTool, 0),
            Some(Failure::Validation(_)) => (FfiErrorCode::Validation, 0),
        };
        Self::boxed(code, status, &result.text)
    }

    /// Parameters that are not JSON at all.
    pub(crate) fn malformed_params(reason: &str) -> *mut Self {
        let text = serde_json::json!({
            "error": true,
            "message": format!("Tool parameters must be valid JSON: {reason}"),
        });
        Self::boxed(FfiErrorCode::Validation, 0, &format!("{text:#}"))
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::NullArg, 0, &format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, 0, msg)
    }
}
