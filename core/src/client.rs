//! Per-transaction operation surface.
//!
//! # Design
//! `Fetcher` owns the slot pool and the transport; one instance serves a
//! whole embedding engine and is shared by reference between its workers.
//! `Fetcher::session` resolves `(slot, xid)` to a `Session`, which is the only
//! way to touch a record. Every operation locks the slot's record for its own
//! duration only; accessors return owned copies so nothing borrowed from the
//! record outlives the lock.

use tracing::debug;

use crate::config::FetchConfig;
use crate::executor;
use crate::http::{HttpMethod, Transport};
use crate::pool::{SlotHandle, SlotPool, DEFAULT_SLOTS};
use crate::record::TransactionId;
use crate::transport::UreqTransport;

pub struct Fetcher<T = UreqTransport> {
    pool: SlotPool,
    transport: T,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T) -> Self {
        Self::with_slots(transport, DEFAULT_SLOTS)
    }

    pub fn with_slots(transport: T, initial_slots: usize) -> Self {
        Self {
            pool: SlotPool::new(initial_slots),
            transport,
        }
    }

    /// Acquire the record of `slot` for transaction `xid`.
    ///
    /// A record last used by a different transaction is reset first, so a
    /// session never observes another transaction's configuration or result.
    pub fn session(&self, slot: usize, xid: TransactionId) -> Session<'_, T> {
        Session {
            transport: &self.transport,
            handle: self.pool.acquire(slot, xid),
        }
    }

    pub fn pool(&self) -> &SlotPool {
        &self.pool
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl Fetcher<UreqTransport> {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self::with_slots(UreqTransport::new(config), config.initial_slots)
    }
}

/// One transaction's view of its slot.
pub struct Session<'a, T> {
    transport: &'a T,
    handle: SlotHandle,
}

impl<T: Transport> Session<'_, T> {
    pub fn slot(&self) -> usize {
        self.handle.slot()
    }

    fn perform(&self, method: HttpMethod, url: &str, body: Option<&[u8]>) {
        let mut state = self.handle.lock();
        executor::perform(self.transport, &mut state, method, url, body);
    }

    pub fn get(&self, url: &str) {
        self.perform(HttpMethod::Get, url, None);
    }

    /// Older name of `get`.
    pub fn fetch(&self, url: &str) {
        self.get(url);
    }

    pub fn head(&self, url: &str) {
        self.perform(HttpMethod::Head, url, None);
    }

    pub fn post(&self, url: &str, body: &str) {
        self.perform(HttpMethod::Post, url, Some(body.as_bytes()));
    }

    /// Send `name` as the verb of the next call only.
    pub fn set_method(&self, name: &str) {
        self.handle.lock().config.custom_method = Some(name.to_string());
    }

    /// Whole-transfer timeout in milliseconds; non-positive restores the default.
    pub fn set_timeout(&self, ms: i64) {
        self.handle.lock().config.timeout_ms = ms;
    }

    pub fn set_connect_timeout(&self, ms: i64) {
        self.handle.lock().config.connect_timeout_ms = ms;
    }

    pub fn set_ssl_verify_peer(&self, verify: bool) {
        self.handle.lock().config.verify_peer = verify;
    }

    pub fn set_ssl_verify_host(&self, verify: bool) {
        self.handle.lock().config.verify_host = verify;
    }

    pub fn set_ssl_cafile(&self, path: &str) {
        self.handle.lock().config.ca_file = Some(path.to_string());
    }

    pub fn set_ssl_capath(&self, path: &str) {
        self.handle.lock().config.ca_dir = Some(path.to_string());
    }

    pub fn set_proxy(&self, url: &str) {
        self.handle.lock().config.proxy = Some(url.to_string());
    }

    /// Older name of `set_proxy`.
    pub fn proxy(&self, url: &str) {
        self.set_proxy(url);
    }

    /// Queue a raw `Name: Value` line for the next call.
    pub fn header_add(&self, line: &str) {
        self.handle.lock().config.request_headers.push(line);
    }

    /// Drop every queued line whose name matches `name`, ignoring case.
    pub fn header_remove(&self, name: &str) {
        self.handle.lock().config.request_headers.remove(name);
    }

    /// Status of the latest call; 0 when none completed or it failed early.
    pub fn status(&self) -> u16 {
        self.handle.lock().response.status
    }

    /// Transport error of the latest call. Only reported when no status was
    /// obtained.
    pub fn error(&self) -> Option<String> {
        let state = self.handle.lock();
        if state.response.status != 0 {
            return None;
        }
        state.response.error.clone()
    }

    /// Most recently received value of response header `name`, ignoring case.
    pub fn header(&self, name: &str) -> Option<String> {
        self.handle
            .lock()
            .response
            .headers
            .get(name)
            .map(str::to_string)
    }

    pub fn body(&self) -> String {
        String::from_utf8_lossy(&self.handle.lock().response.body).into_owned()
    }

    pub fn body_bytes(&self) -> Vec<u8> {
        self.handle.lock().response.body.clone()
    }

    /// Clear the slot immediately, as if its transaction had ended.
    pub fn reset(&self) {
        debug!(slot = self.handle.slot(), "slot reset on request");
        self.handle.lock().clear();
    }

    /// Older name of `reset`.
    pub fn free(&self) {
        self.reset();
    }
}
