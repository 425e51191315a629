//! Outgoing response view and body coercion.
//!
//! Middleware never write to the socket. They mutate a [`Response`] and the
//! framework reads its final state once the chain completes. The one
//! non-trivial job here is [`Response::set_body`], which turns every
//! supported [`Body`] shape into stored bytes plus consistent headers.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use tokio::io::AsyncReadExt;

use crate::body::Body;
use crate::error::Error;

/// The sole mutable output surface for one request.
///
/// Starts at `404 Not Found` with no body. Header storage is the
/// transport's [`HeaderMap`], but only the narrow get/has/set/remove
/// surface is exposed, so nothing else grows a dependency on the concrete
/// representation.
pub struct Response {
    status: StatusCode,
    body: Option<Bytes>,
    headers: HeaderMap,
}

impl Response {
    pub(crate) fn new() -> Self {
        Self { status: StatusCode::NOT_FOUND, body: None, headers: HeaderMap::new() }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Coerces `body` into stored bytes plus header side effects.
    ///
    /// * `Empty` clears the payload, removes the content headers, and
    ///   flips the status to 204 unless it is already an empty-body status.
    /// * `Text` sniffs `html` vs `text` (only when no type is set yet) and
    ///   records the byte length.
    /// * `Bytes` types as `bin` (only when no type is set yet) and records
    ///   the byte length.
    /// * `Stream` is drained fully into memory; its length is unknown, so
    ///   any Content-Length header is removed.
    /// * `Json` always types as `json` and stores the serialized map.
    ///
    /// Every content-bearing shape sets the status to 200 before any
    /// header is examined; the response must read as "has content" even
    /// when the shape only adjusts headers afterwards.
    pub async fn set_body(&mut self, body: impl Into<Body>) -> Result<(), Error> {
        let body = body.into();

        if !matches!(body, Body::Empty) {
            self.set_status(StatusCode::OK);
        }
        let type_set = self.has("content-type");

        match body {
            Body::Empty => {
                if !is_empty_status(self.status) {
                    self.set_status(StatusCode::NO_CONTENT);
                }
                self.remove("content-type");
                self.remove("content-length");
                self.remove("transfer-encoding");
                self.body = None;
            }
            Body::Text(text) => {
                if !type_set {
                    if text.trim_start().starts_with('<') {
                        self.set_type("html");
                    } else {
                        self.set_type("text");
                    }
                }
                self.set_length(text.len());
                self.body = Some(Bytes::from(text));
            }
            Body::Bytes(bytes) => {
                if !type_set {
                    self.set_type("bin");
                }
                self.set_length(bytes.len());
                self.body = Some(bytes);
            }
            Body::Stream(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf).await.map_err(Error::BodyRead)?;
                if !type_set {
                    self.set_type("bin");
                }
                self.remove("content-length");
                self.body = Some(Bytes::from(buf));
            }
            Body::Json(map) => {
                let bytes = serde_json::to_vec(&map).map_err(Error::BodyEncode)?;
                self.set_type("json");
                self.body = Some(Bytes::from(bytes));
            }
        }

        Ok(())
    }

    /// Parses the Content-Length header back into a byte count.
    ///
    /// An absent header is `Ok(None)`. A present but non-numeric value is
    /// a recoverable error, not a crash: malformed internal state must not
    /// take the whole server down.
    pub fn length(&self) -> Result<Option<usize>, Error> {
        match self.get("content-length") {
            None => Ok(None),
            Some(value) => value.parse().map(Some).map_err(|_| Error::InvalidContentLength),
        }
    }

    /// Assigns the Content-Length header.
    pub fn set_length(&mut self, length: usize) {
        self.headers.insert(http::header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    /// Assigns the Content-Type header.
    pub fn set_type(&mut self, content_type: &str) {
        self.set("content-type", content_type);
    }

    /// Returns a header value. `None` for absent headers and for values
    /// that are not valid UTF-8.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// True when the header is present with a non-empty value.
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some_and(|value| !value.is_empty())
    }

    /// Assigns a header, replacing any previous value. Invalid names or
    /// values are ignored.
    pub fn set(&mut self, name: &str, value: &str) {
        let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else { return };
        let Ok(value) = HeaderValue::from_str(value) else { return };
        self.headers.insert(name, value);
    }

    /// Deletes a header.
    pub fn remove(&mut self, name: &str) {
        self.headers.remove(name);
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub(crate) fn into_parts(self) -> (StatusCode, HeaderMap, Option<Bytes>) {
        (self.status, self.headers, self.body)
    }
}

/// True for the statuses that carry no entity body.
pub(crate) fn is_empty_status(status: StatusCode) -> bool {
    status == StatusCode::NO_CONTENT
        || status == StatusCode::RESET_CONTENT
        || status == StatusCode::NOT_MODIFIED
}
