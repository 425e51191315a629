//! Unified error type.

use std::io;

use thiserror::Error;

/// The error type surfaced by allium's fallible operations.
///
/// Application-level outcomes (a 404, an error page) are expressed by
/// mutating the response on the [`Context`](crate::Context), not as
/// `Error`s. This type covers the framework's own failure paths plus
/// whatever errors middleware choose to return. Any `Error` that escapes
/// the chain is handed to the application's error observer; it is never
/// written into the response body.
#[derive(Debug, Error)]
pub enum Error {
    /// A middleware invoked its continuation more than once for the same
    /// chain position. The response status is forced to 500 before this
    /// error is returned.
    #[error("next() called multiple times")]
    MultipleNext,

    /// Draining a stream body into memory failed.
    #[error("failed to read body stream: {0}")]
    BodyRead(#[source] io::Error),

    /// Serializing a structured body to JSON failed.
    #[error("failed to encode json body: {0}")]
    BodyEncode(#[source] serde_json::Error),

    /// The Content-Length header is present but not a valid integer.
    #[error("content-length is not a valid integer")]
    InvalidContentLength,

    /// Binding or serving the TCP listener failed.
    #[error("listen: {0}")]
    Listen(#[source] io::Error),

    /// An error returned by application middleware.
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps an arbitrary application error so middleware can return it
    /// through the chain.
    pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(err.into())
    }
}
