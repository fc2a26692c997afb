//! The per-slot call state record.
//!
//! # Design
//! A `CallState` is split into the caller's configuration (`CallConfig`) and
//! the captured result of the latest call (`CapturedResponse`). The split lets
//! the executor lend the configuration to the transport as an
//! `OutboundRequest` while the response half receives the streamed result.
//!
//! Records are created once and then reset in place; clearing keeps the
//! allocated capacity of the header lists and the body buffer.

use crate::headers::{RequestHeaders, ResponseHeaders};
use crate::http::{positive_millis, HttpMethod, OutboundRequest, ResponseSink};

/// Opaque identifier of the inbound transaction owning a slot.
pub type TransactionId = u64;

/// Request-side settings of a slot.
#[derive(Debug, Clone)]
pub struct CallConfig {
    pub custom_method: Option<String>,
    /// Whole-transfer timeout; non-positive uses the transport default.
    pub timeout_ms: i64,
    pub connect_timeout_ms: i64,
    pub verify_peer: bool,
    pub verify_host: bool,
    pub ca_file: Option<String>,
    pub ca_dir: Option<String>,
    pub proxy: Option<String>,
    pub request_headers: RequestHeaders,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            custom_method: None,
            timeout_ms: -1,
            connect_timeout_ms: -1,
            verify_peer: false,
            verify_host: false,
            ca_file: None,
            ca_dir: None,
            proxy: None,
            request_headers: RequestHeaders::default(),
        }
    }
}

impl CallConfig {
    fn clear(&mut self) {
        self.custom_method = None;
        self.timeout_ms = -1;
        self.connect_timeout_ms = -1;
        self.verify_peer = false;
        self.verify_host = false;
        self.ca_file = None;
        self.ca_dir = None;
        self.proxy = None;
        self.request_headers.clear();
    }

    /// Assemble the request for one call from the current settings.
    ///
    /// The POST body is only attached in `HttpMethod::Post` mode.
    pub fn outbound<'a>(
        &'a self,
        method: HttpMethod,
        url: &'a str,
        body: Option<&'a [u8]>,
    ) -> OutboundRequest<'a> {
        OutboundRequest {
            method,
            custom_method: self.custom_method.as_deref(),
            url,
            body: body.filter(|_| method == HttpMethod::Post),
            headers: self.request_headers.as_slice(),
            timeout: positive_millis(self.timeout_ms),
            connect_timeout: positive_millis(self.connect_timeout_ms),
            verify_peer: self.verify_peer,
            verify_host: self.verify_host,
            ca_file: self.ca_file.as_deref(),
            ca_dir: self.ca_dir.as_deref(),
            proxy: self.proxy.as_deref(),
        }
    }

    /// Forget the one-shot settings consumed by a call.
    fn finish_call(&mut self) {
        self.custom_method = None;
        self.request_headers.clear();
    }
}

/// Result of the most recent call on a slot.
#[derive(Debug, Default, Clone)]
pub struct CapturedResponse {
    /// 0 until a call obtained a status.
    pub status: u16,
    pub error: Option<String>,
    pub headers: ResponseHeaders,
    pub body: Vec<u8>,
}

impl CapturedResponse {
    fn clear(&mut self) {
        self.status = 0;
        self.error = None;
        self.headers.clear();
        self.body.clear();
    }
}

impl ResponseSink for CapturedResponse {
    fn status(&mut self, code: u16) {
        self.status = code;
    }

    fn header_line(&mut self, line: &[u8]) {
        self.headers.push_line(line);
    }

    fn body_chunk(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }
}

/// Configuration and results for the outbound calls of one slot.
#[derive(Debug, Default, Clone)]
pub struct CallState {
    xid: Option<TransactionId>,
    method: Option<HttpMethod>,
    pub config: CallConfig,
    pub response: CapturedResponse,
}

impl CallState {
    /// Transaction currently owning the record, `None` when cleared.
    pub fn xid(&self) -> Option<TransactionId> {
        self.xid
    }

    /// Transfer mode of the pending or most recent call.
    pub fn method(&self) -> Option<HttpMethod> {
        self.method
    }

    /// Claim the record for `xid`, wiping everything left by a different
    /// transaction. Returns whether a reset happened.
    pub fn claim(&mut self, xid: TransactionId) -> bool {
        if self.xid == Some(xid) {
            return false;
        }
        self.clear();
        self.xid = Some(xid);
        true
    }

    /// Back to the freshly created state, including the owner.
    pub fn clear(&mut self) {
        self.xid = None;
        self.method = None;
        self.config.clear();
        self.response.clear();
    }

    /// Start a new call: drop the previous result and record the mode.
    /// Transport settings survive until the transaction ends.
    pub fn begin_call(&mut self, method: HttpMethod) {
        self.response.clear();
        self.method = Some(method);
    }

    pub fn finish_call(&mut self) {
        self.config.finish_call();
    }
}
