use std::io;

use siphon_parser::ParseError;
use thiserror::Error;

/// Errors surfaced by the receiver, either as return values of
/// [`Server`](crate::Server) methods or asynchronously on the error
/// stream.
#[derive(Debug, Error)]
pub enum ServerError {
    /// [`Server::boot`](crate::Server::boot) was called without a
    /// format.
    #[error("no format configured")]
    MissingFormat,

    /// [`Server::boot`](crate::Server::boot) was called without a
    /// handler.
    #[error("no handler configured")]
    MissingHandler,

    /// A listener or socket could not be bound.
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Transport-level read or socket error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The TLS handshake failed; the connection was closed.
    #[error("TLS handshake failed: {0}")]
    TlsHandshake(#[source] io::Error),

    /// A stream read exceeded the configured read timeout; the
    /// connection was closed.
    #[error("read timed out")]
    ReadTimeout,

    /// An octet-counted frame header held a non-digit, or no space
    /// terminated the count field.
    #[error("invalid octet count in frame header")]
    InvalidOctetCount,

    /// A frame exceeded the scanner buffer.
    #[error("frame exceeds {limit} bytes")]
    FrameTooLong { limit: usize },

    /// The stream ended before an octet-counted frame completed.
    #[error("stream ended mid-frame")]
    TruncatedFrame,

    /// A record failed to parse. The record was still delivered to
    /// the handler, with this error alongside.
    #[error(transparent)]
    Parse(#[from] ParseError),
}
