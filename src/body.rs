//! Response body shapes.

use std::fmt;

use bytes::Bytes;
use serde_json::{Map, Value};
use tokio::io::AsyncRead;

/// A value a middleware can assign as the response body.
///
/// [`Response::set_body`](crate::Response::set_body) coerces every shape
/// into stored bytes plus header side effects. The set of shapes is closed
/// so the coercion step can match exhaustively instead of inspecting types
/// at run time.
pub enum Body {
    /// No body. Clears the content headers and flips the status to
    /// `204 No Content` unless it is already an empty-body status.
    Empty,
    /// UTF-8 text, typed `html` or `text` by sniffing the first
    /// non-whitespace character.
    Text(String),
    /// Raw bytes, typed `bin` unless a type is already set.
    Bytes(Bytes),
    /// A readable byte stream, drained fully into memory before the
    /// response continues.
    Stream(Box<dyn AsyncRead + Send + Unpin>),
    /// A string-keyed map, serialized as JSON.
    Json(Map<String, Value>),
}

impl Body {
    /// Wraps a reader as a streaming body.
    pub fn stream(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::Stream(Box::new(reader))
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Json(map) => f.debug_tuple("Json").field(map).finish(),
        }
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(value))
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<Map<String, Value>> for Body {
    fn from(value: Map<String, Value>) -> Self {
        Self::Json(value)
    }
}

/// `()` reads as "no body", mirroring the `Empty` variant.
impl From<()> for Body {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}
