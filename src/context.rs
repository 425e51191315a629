//! Per-request exchange context.

use std::collections::HashMap;

use bytes::Bytes;
use http::StatusCode;
use serde_json::Value;

use crate::body::Body;
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// Everything one request's middleware chain can see and mutate.
///
/// A context is created right before dispatch begins, with its request and
/// response views bound on construction, and dropped once the response has
/// been finalized. It is exclusively owned by one request's task and never
/// shared between requests.
pub struct Context {
    /// The inbound request view.
    pub request: Request,
    /// The outbound response view.
    pub response: Response,
    /// Free-form bag for passing data between middlewares. Keyed by
    /// string; values are arbitrary JSON.
    pub state: HashMap<String, Value>,
}

impl Context {
    pub(crate) fn new(request: Request) -> Self {
        Self { request, response: Response::new(), state: HashMap::new() }
    }

    /// Shorthand for `self.response.status()`.
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// Shorthand for `self.response.set_status(..)`.
    pub fn set_status(&mut self, status: StatusCode) {
        self.response.set_status(status);
    }

    /// Shorthand for `self.response.body()`.
    pub fn body(&self) -> Option<&Bytes> {
        self.response.body()
    }

    /// Shorthand for `self.response.set_body(..)`.
    pub async fn set_body(&mut self, body: impl Into<Body>) -> Result<(), Error> {
        self.response.set_body(body).await
    }
}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};

    use super::Context;
    use crate::request::Request;

    fn context() -> Context {
        let (parts, ()) = http::Request::builder()
            .method(Method::GET)
            .uri("/")
            .body(())
            .expect("request parts")
            .into_parts();
        Context::new(Request::new(parts, None))
    }

    #[test]
    fn starts_with_an_empty_state_bag() {
        assert!(context().state.is_empty());
    }

    #[tokio::test]
    async fn accessors_delegate_to_the_response_view() {
        let mut ctx = context();
        assert_eq!(ctx.status(), StatusCode::NOT_FOUND);
        assert!(ctx.body().is_none());

        ctx.set_status(StatusCode::ACCEPTED);
        assert_eq!(ctx.response.status(), StatusCode::ACCEPTED);

        ctx.set_body("hello").await.expect("set_body");
        assert_eq!(ctx.response.body().map(|b| &b[..]), Some(&b"hello"[..]));
    }
}
