//! C-ABI wrapper around `fetch-core`.
//!
//! # Overview
//! Exposes the per-transaction call surface to an embedding engine written
//! in C. The engine creates one pool, then passes `(pool, txn, ...)` into
//! every function; `txn` carries the session slot and transaction id.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Nothing returns an error: transport failures are read back with
//!   `fetch_status` / `fetch_error`, exactly like the Rust surface.
//! - Returned strings are owned by the caller and must be released with
//!   `fetch_free_string`. A null pool or null string argument turns the call
//!   into a no-op (or a null/zero result).

pub mod types;

use std::ffi::CString;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use fetch_core::{FetchConfig, Fetcher, Session, UreqTransport};

use types::*;

/// Run `f` against the session for `txn`, returning `default` when `pool` is
/// null or `f` panics.
fn with_session<R>(
    pool: *const FfiFetcher,
    txn: FfiTxn,
    name: &str,
    default: R,
    f: impl FnOnce(&Session<'_, UreqTransport>) -> R,
) -> R {
    if pool.is_null() {
        return default;
    }
    catch_unwind(AssertUnwindSafe(|| {
        let pool = unsafe { &*pool };
        f(&pool.session(txn))
    }))
    .unwrap_or_else(|_| {
        tracing::error!(
            function = name,
            slot = txn.slot,
            xid = txn.xid,
            "panic caught at ffi boundary"
        );
        default
    })
}

// ---------------------------------------------------------------------------
// Pool lifecycle
// ---------------------------------------------------------------------------

/// Create a pool with `initial_slots` pre-allocated slots (at least one).
///
/// The caller must free the returned pointer with `fetch_pool_free`.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_pool_new(initial_slots: u32) -> *mut FfiFetcher {
    catch_unwind(|| {
        let mut config = FetchConfig::default();
        config.initial_slots = (initial_slots as usize).max(1);
        Box::into_raw(Box::new(FfiFetcher {
            inner: Fetcher::from_config(&config),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Create a pool from a TOML configuration file.
///
/// Returns null if `path` is null or the file cannot be loaded.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_pool_from_config(path: *const c_char) -> *mut FfiFetcher {
    catch_unwind(|| {
        let Some(path) = str_arg(path) else {
            return std::ptr::null_mut();
        };
        match FetchConfig::load(Path::new(path)) {
            Ok(config) => Box::into_raw(Box::new(FfiFetcher {
                inner: Fetcher::from_config(&config),
            })),
            Err(e) => {
                tracing::warn!(path, error = %e, "failed to load fetch config");
                std::ptr::null_mut()
            }
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a pool created by `fetch_pool_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_pool_free(pool: *mut FfiFetcher) {
    if !pool.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(pool) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

/// GET `url` and capture the result into the transaction's slot.
/// A null `url` is sent as an empty URL and fails at execution.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_get(pool: *const FfiFetcher, txn: FfiTxn, url: *const c_char) {
    with_session(pool, txn, "fetch_get", (), |s| s.get(str_arg(url).unwrap_or("")));
}

#[unsafe(no_mangle)]
pub extern "C" fn fetch_head(pool: *const FfiFetcher, txn: FfiTxn, url: *const c_char) {
    with_session(pool, txn, "fetch_head", (), |s| s.head(str_arg(url).unwrap_or("")));
}

/// POST `body` to `url`. A null `body` posts an empty entity.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_post(
    pool: *const FfiFetcher,
    txn: FfiTxn,
    url: *const c_char,
    body: *const c_char,
) {
    with_session(pool, txn, "fetch_post", (), |s| {
        s.post(str_arg(url).unwrap_or(""), str_arg(body).unwrap_or(""))
    });
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Override the HTTP verb of the next call only.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_set_method(pool: *const FfiFetcher, txn: FfiTxn, name: *const c_char) {
    with_session(pool, txn, "fetch_set_method", (), |s| {
        if let Some(name) = str_arg(name) {
            s.set_method(name);
        }
    });
}

/// Whole-transfer timeout in milliseconds; non-positive uses the default.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_set_timeout(pool: *const FfiFetcher, txn: FfiTxn, ms: i64) {
    with_session(pool, txn, "fetch_set_timeout", (), |s| s.set_timeout(ms));
}

#[unsafe(no_mangle)]
pub extern "C" fn fetch_set_connect_timeout(pool: *const FfiFetcher, txn: FfiTxn, ms: i64) {
    with_session(pool, txn, "fetch_set_connect_timeout", (), |s| {
        s.set_connect_timeout(ms)
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn fetch_set_ssl_verify_peer(pool: *const FfiFetcher, txn: FfiTxn, verify: bool) {
    with_session(pool, txn, "fetch_set_ssl_verify_peer", (), |s| {
        s.set_ssl_verify_peer(verify)
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn fetch_set_ssl_verify_host(pool: *const FfiFetcher, txn: FfiTxn, verify: bool) {
    with_session(pool, txn, "fetch_set_ssl_verify_host", (), |s| {
        s.set_ssl_verify_host(verify)
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn fetch_set_ssl_cafile(pool: *const FfiFetcher, txn: FfiTxn, path: *const c_char) {
    with_session(pool, txn, "fetch_set_ssl_cafile", (), |s| {
        if let Some(path) = str_arg(path) {
            s.set_ssl_cafile(path);
        }
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn fetch_set_ssl_capath(pool: *const FfiFetcher, txn: FfiTxn, path: *const c_char) {
    with_session(pool, txn, "fetch_set_ssl_capath", (), |s| {
        if let Some(path) = str_arg(path) {
            s.set_ssl_capath(path);
        }
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn fetch_set_proxy(pool: *const FfiFetcher, txn: FfiTxn, url: *const c_char) {
    with_session(pool, txn, "fetch_set_proxy", (), |s| {
        if let Some(url) = str_arg(url) {
            s.set_proxy(url);
        }
    });
}

/// Queue a raw `Name: Value` header line for the next call.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_header_add(pool: *const FfiFetcher, txn: FfiTxn, line: *const c_char) {
    with_session(pool, txn, "fetch_header_add", (), |s| {
        if let Some(line) = str_arg(line) {
            s.header_add(line);
        }
    });
}

/// Remove every queued header line named `name`, ignoring case.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_header_remove(pool: *const FfiFetcher, txn: FfiTxn, name: *const c_char) {
    with_session(pool, txn, "fetch_header_remove", (), |s| {
        if let Some(name) = str_arg(name) {
            s.header_remove(name);
        }
    });
}

/// Clear the slot immediately.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_reset(pool: *const FfiFetcher, txn: FfiTxn) {
    with_session(pool, txn, "fetch_reset", (), |s| s.reset());
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Status of the latest call, 0 if none completed.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_status(pool: *const FfiFetcher, txn: FfiTxn) -> i32 {
    with_session(pool, txn, "fetch_status", 0, |s| i32::from(s.status()))
}

/// Transport error of the latest call, or null when there is none or a
/// status was obtained.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_error(pool: *const FfiFetcher, txn: FfiTxn) -> *mut c_char {
    with_session(pool, txn, "fetch_error", std::ptr::null_mut(), |s| {
        s.error().map_or(std::ptr::null_mut(), into_c_string)
    })
}

/// Value of response header `name`, or null when absent.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_header(
    pool: *const FfiFetcher,
    txn: FfiTxn,
    name: *const c_char,
) -> *mut c_char {
    with_session(pool, txn, "fetch_header", std::ptr::null_mut(), |s| {
        str_arg(name)
            .and_then(|name| s.header(name))
            .map_or(std::ptr::null_mut(), into_c_string)
    })
}

/// Response body of the latest call, truncated at the first NUL byte.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_body(pool: *const FfiFetcher, txn: FfiTxn) -> *mut c_char {
    with_session(pool, txn, "fetch_body", std::ptr::null_mut(), |s| {
        into_c_string(s.body())
    })
}

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

/// Percent-encode the bytes of `s`, which need not be UTF-8. Returns null if
/// `s` is null.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_escape(s: *const c_char) -> *mut c_char {
    catch_unwind(|| {
        bytes_arg(s).map_or(std::ptr::null_mut(), |s| {
            into_c_string(fetch_core::escape_bytes(s))
        })
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Decode `%XX` sequences in `s` into raw bytes, cut at the first decoded
/// NUL. Returns null if `s` is null.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_unescape(s: *const c_char) -> *mut c_char {
    catch_unwind(|| {
        bytes_arg(s).map_or(std::ptr::null_mut(), |s| {
            into_c_bytes(fetch_core::unescape_bytes(s))
        })
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
