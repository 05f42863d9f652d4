//! Error types for the request dispatcher.
//!
//! # Design
//! None of these errors escape `Dispatcher::send`. Anything that stops a
//! request from producing a response is folded into `Outcome::NetworkError`,
//! so callers see a single failure channel. Non-2xx statuses are not errors
//! at this level; they are data handed to `ApiClient::classify`.

use thiserror::Error;

/// Errors raised while building or transporting a request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The request could not be completed: DNS, connect, TLS or I/O failure.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The operation is neither `login` nor a valid HTTP method token.
    #[error("invalid operation: {0:?}")]
    InvalidOperation(String),

    /// A header value could not be represented on the wire.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The request parameters could not be serialized.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}
