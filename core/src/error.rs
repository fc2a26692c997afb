//! Error types.
//!
//! # Design
//! None of these cross the per-slot operation surface. A `TransportError` is
//! rendered with `Display` into the record's last-error text; HTTP error
//! statuses are not errors at all. `ConfigError` is only returned while
//! loading configuration, before any slot exists.

use std::io;

/// Failure of the HTTP exchange itself.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The URL, method or a header line could not be turned into a request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// DNS resolution or TCP connect failed.
    #[error("couldn't connect: {0}")]
    Connect(String),

    /// A configured timeout elapsed.
    #[error("timeout was reached: {0}")]
    Timeout(String),

    /// TLS setup or handshake failed.
    #[error("tls error: {0}")]
    Tls(String),

    /// Socket error while sending or receiving.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors raised while loading a `FetchConfig`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {0}")]
    Validation(String),
}
