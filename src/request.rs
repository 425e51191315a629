//! Incoming request view.

use http::request::Parts;
use http::{HeaderMap, Method, Uri};
use hyper::body::Incoming;

/// A read-mostly view over one incoming HTTP request.
///
/// Parsing raw bytes off the socket is hyper's job; this type only exposes
/// what middleware need from the parsed message: the method, the headers,
/// and the body reader. One `Request` exists per exchange and it is never
/// shared across requests.
pub struct Request {
    parts: Parts,
    body: Option<Incoming>,
}

impl Request {
    pub(crate) fn new(parts: Parts, body: Option<Incoming>) -> Self {
        Self { parts, body }
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Case-insensitive header lookup. Returns `None` for headers whose
    /// value is not valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Takes the body reader out of the request. The stream can only be
    /// consumed once; subsequent calls return `None`.
    pub fn take_body(&mut self) -> Option<Incoming> {
        self.body.take()
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::Request;

    fn request(method: Method) -> Request {
        let (parts, ()) = http::Request::builder()
            .method(method)
            .uri("/")
            .header("X-Request-Id", "abc-123")
            .body(())
            .expect("request parts")
            .into_parts();
        Request::new(parts, None)
    }

    #[test]
    fn exposes_the_method() {
        assert_eq!(request(Method::POST).method(), &Method::POST);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = request(Method::GET);
        assert_eq!(req.header("x-request-id"), Some("abc-123"));
        assert_eq!(req.header("X-REQUEST-ID"), Some("abc-123"));
        assert_eq!(req.header("x-missing"), None);
    }

    #[test]
    fn body_can_only_be_taken_once() {
        let mut req = request(Method::GET);
        assert!(req.take_body().is_none());
        assert!(req.take_body().is_none());
    }
}
