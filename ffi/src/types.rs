//! `#[repr(C)]` types and string conversions for the FFI boundary.
//!
//! # Design
//! The engine identifies a transaction by `FfiTxn { slot, xid }`, passed by
//! value into every call. Strings handed back to C are fresh allocations the
//! caller releases with `fetch_free_string`; they stand in for strings an
//! engine would otherwise copy into its own per-transaction workspace.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use fetch_core::{Fetcher, Session, UreqTransport};

/// Opaque handle to a `Fetcher`. C callers receive a pointer to this and
/// pass it back into every FFI function.
pub struct FfiFetcher {
    pub(crate) inner: Fetcher<UreqTransport>,
}

impl FfiFetcher {
    pub(crate) fn session(&self, txn: FfiTxn) -> Session<'_, UreqTransport> {
        self.inner.session(txn.slot as usize, txn.xid)
    }
}

/// Session slot and transaction id assigned by the engine.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfiTxn {
    pub slot: u32,
    pub xid: u64,
}

/// Borrow a C string argument. `None` for null or non-UTF-8 input.
pub(crate) fn str_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Borrow the raw bytes of a C string argument. `None` for null input.
pub(crate) fn bytes_arg<'a>(ptr: *const c_char) -> Option<&'a [u8]> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_bytes())
}

/// Hand an owned string to C, cut at the first NUL byte as C would read it.
pub(crate) fn into_c_string(s: String) -> *mut c_char {
    into_c_bytes(s.into_bytes())
}

pub(crate) fn into_c_bytes(mut bytes: Vec<u8>) -> *mut c_char {
    if let Some(nul) = bytes.iter().position(|&b| b == 0) {
        bytes.truncate(nul);
    }
    match CString::new(bytes) {
        Ok(c) => c.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}
