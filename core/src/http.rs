//! Transport seam between the call state machine and the HTTP library.
//!
//! # Design
//! The state machine never talks to the network directly. It assembles an
//! `OutboundRequest` borrowing from the slot's record and hands it to a
//! `Transport`, which streams the status, raw header lines and body chunks
//! back through a `ResponseSink` while the call is in flight. The default
//! transport lives in `transport.rs`; tests plug in scripted ones.

use std::fmt;
use std::time::Duration;

use crate::error::TransportError;

/// Transfer mode of a call. A custom method string overrides the verb sent
/// on the wire but the mode still decides body semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully assembled outbound call.
#[derive(Debug, Clone)]
pub struct OutboundRequest<'a> {
    pub method: HttpMethod,
    pub custom_method: Option<&'a str>,
    pub url: &'a str,
    /// Request entity; only set for `HttpMethod::Post`.
    pub body: Option<&'a [u8]>,
    /// Raw `Name: Value` lines, in the order they are sent.
    pub headers: &'a [String],
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub verify_peer: bool,
    pub verify_host: bool,
    pub ca_file: Option<&'a str>,
    pub ca_dir: Option<&'a str>,
    pub proxy: Option<&'a str>,
}

impl OutboundRequest<'_> {
    /// The verb sent on the wire.
    pub fn wire_method(&self) -> &str {
        self.custom_method.unwrap_or(self.method.as_str())
    }
}

/// Receives the response of an in-flight call.
pub trait ResponseSink {
    fn status(&mut self, code: u16);

    /// One raw header line as received, including the status line.
    fn header_line(&mut self, line: &[u8]);

    fn body_chunk(&mut self, chunk: &[u8]);
}

/// Blocking HTTP executor.
///
/// `perform` returns once the call has completed or failed. HTTP error
/// statuses are not failures: they are reported through `ResponseSink::status`
/// and `perform` returns `Ok`. An `Err` means the exchange itself broke; a
/// status reported before the failure is kept.
pub trait Transport: Send + Sync {
    fn perform(
        &self,
        request: &OutboundRequest<'_>,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn perform(
        &self,
        request: &OutboundRequest<'_>,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), TransportError> {
        (**self).perform(request, sink)
    }
}

/// Convert a millisecond setting into a timeout; non-positive means "use the
/// transport default".
pub fn positive_millis(ms: i64) -> Option<Duration> {
    u64::try_from(ms)
        .ok()
        .filter(|&ms| ms > 0)
        .map(Duration::from_millis)
}
