//! Outbound HTTP calls scoped to the transactions of an embedding engine.
//!
//! # Overview
//! An engine processing inbound transactions gives each one a small numeric
//! session slot and an opaque transaction id. Through a `Session` for that
//! pair it configures an outbound GET/HEAD/POST, runs it synchronously and
//! reads back the status, headers and body before answering its own client.
//!
//! # Design
//! - `SlotPool` maps slots to reusable `CallState` records and resets a record
//!   whenever a different transaction presents the slot.
//! - `executor::perform` assembles the request from the record, drives a
//!   `Transport`, and streams the response back into the record.
//! - `Transport` is the seam to the HTTP library; `UreqTransport` is the
//!   default, tests substitute scripted transports. `tls` supplies its
//!   rustls connector with independent peer and host checks.
//! - Transport failures never escape as errors: they are recorded and read
//!   back through `Session::error`.

pub mod client;
pub mod config;
pub mod error;
pub mod escape;
pub mod executor;
pub mod headers;
pub mod http;
pub mod pool;
pub mod record;
pub mod tls;
pub mod transport;

pub use client::{Fetcher, Session};
pub use config::FetchConfig;
pub use error::{ConfigError, TransportError};
pub use escape::{escape, escape_bytes, unescape, unescape_bytes};
pub use headers::{parse_header_line, RequestHeaders, ResponseHeaders};
pub use http::{HttpMethod, OutboundRequest, ResponseSink, Transport};
pub use pool::{SlotHandle, SlotPool, DEFAULT_SLOTS};
pub use record::{CallConfig, CallState, CapturedResponse, TransactionId};
pub use transport::UreqTransport;
