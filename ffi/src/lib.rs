//! C-ABI wrapper around `hass-tools`.
//!
//! # Overview
//! Lets a host written in any language with a C FFI list the available
//! Home Assistant tools and invoke them by name with a JSON parameter string.
//! The client handle owns a multi-threaded tokio runtime; each invocation
//! blocks the calling host thread on it, so host threads calling in
//! concurrently get independent HTTP exchanges.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - A single `FfiToolResult` envelope conveys success text and errors
//!   uniformly; the text is rendered by `hass-tools` either way.
//! - The C caller owns all returned pointers and must call the matching
//!   `hass_free_*` function to release them.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use hass_core::{ClientConfig, HassClient};
use serde_json::Value;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use types::*;

/// Borrow a C string as `&str`. `None` for null or non-UTF-8 input.
fn borrow_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install a `tracing` subscriber writing to stderr, filtered by `RUST_LOG`
/// (default `info`). Returns false if a subscriber was already installed.
#[unsafe(no_mangle)]
pub extern "C" fn hass_init_logging() -> bool {
    catch_unwind(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    })
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client for the server at `base_url` using `token`.
///
/// `timeout_ms` of 0 selects the default deadline. Returns null if an
/// argument is null, the configuration is invalid, or an internal panic
/// occurs. The caller must free the returned pointer with `hass_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn hass_client_new(
    base_url: *const c_char,
    token: *const c_char,
    timeout_ms: u64,
    validate_tls: bool,
) -> *mut FfiHassClient {
    catch_unwind(|| {
        let (Some(base_url), Some(token)) = (borrow_str(base_url), borrow_str(token)) else {
            return std::ptr::null_mut();
        };

        let mut config = ClientConfig::new(base_url, token).with_tls_validation(validate_tls);
        if timeout_ms > 0 {
            config = config.with_timeout(Duration::from_millis(timeout_ms));
        }
        into_handle(config)
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Create a client from the `HASS_URL`, `HASS_TOKEN`, `HASS_TIMEOUT_MS` and
/// `HASS_VALIDATE_SSL` environment variables.
///
/// Returns null if `HASS_TOKEN` is unset, a variable is malformed, or the
/// resulting configuration is invalid. Free with `hass_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn hass_client_from_env() -> *mut FfiHassClient {
    catch_unwind(|| match ClientConfig::from_env() {
        Ok(config) => into_handle(config),
        Err(err) => {
            warn!(error = %err, "rejecting client configuration from environment");
            std::ptr::null_mut()
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

fn into_handle(config: ClientConfig) -> *mut FfiHassClient {
    if let Err(err) = config.validate() {
        warn!(error = %err, "rejecting client configuration");
        return std::ptr::null_mut();
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(err) => {
            warn!(error = %err, "failed to start runtime");
            return std::ptr::null_mut();
        }
    };
    let inner = match HassClient::new(config) {
        Ok(client) => client,
        Err(err) => {
            warn!(error = %err, "failed to create client");
            return std::ptr::null_mut();
        }
    };
    Box::into_raw(Box::new(FfiHassClient { runtime, inner }))
}

/// Free a client created by `hass_client_new` or `hass_client_from_env`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hass_client_free(client: *mut FfiHassClient) {
    if !client.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(client) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

/// JSON array describing every tool (name, displayName, description,
/// inputSchema, requiresConfirmation).
///
/// Returns null on internal panic. Free with `hass_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn hass_tool_list() -> *mut c_char {
    catch_unwind(|| match serde_json::to_string(&hass_tools::all_tools()) {
        Ok(json) => to_c_string(&json),
        Err(_) => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Invoke tool `name` with `params_json` (a JSON object, or null for none).
///
/// Always returns a result; free it with `hass_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn hass_tool_invoke(
    client: *const FfiHassClient,
    name: *const c_char,
    params_json: *const c_char,
) -> *mut FfiToolResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiToolResult::null_arg("client");
        }
        let Some(name) = borrow_str(name) else {
            return FfiToolResult::null_arg("name");
        };
        let params = if params_json.is_null() {
            Value::Null
        } else {
            let Some(raw) = borrow_str(params_json) else {
                return FfiToolResult::malformed_params("not valid UTF-8");
            };
            match serde_json::from_str(raw) {
                Ok(value) => value,
                Err(err) => return FfiToolResult::malformed_params(&err.to_string()),
            }
        };

        let client = unsafe { &*client };
        let result = client
            .runtime
            .block_on(hass_tools::invoke(&client.inner, name, &params));
        FfiToolResult::from_tool_result(result)
    }))
    .unwrap_or_else(|_| FfiToolResult::panic("panic in hass_tool_invoke"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiToolResult` returned by `hass_tool_invoke`. Safe to call with
/// null.
#[unsafe(no_mangle)]
pub extern "C" fn hass_free_result(result: *mut FfiToolResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        hass_free_string(result.text);
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hass_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { std::ffi::CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
