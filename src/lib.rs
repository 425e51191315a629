//! # allium
//!
//! A minimal onion-model HTTP middleware framework.
//! Nothing more. Nothing less.
//!
//! ## The contract
//!
//! hyper handles the sockets, the parsing, and the protocol negotiation.
//! allium does not — by design. The transport does transport things. The
//! framework does framework things: composing your middleware into one
//! chain, giving each layer a before-and-after view of the exchange, and
//! normalizing whatever you assign as a body into bytes with consistent
//! headers.
//!
//! What allium intentionally leaves out:
//!
//! - **Routing** — compose a dispatch middleware, or keep one handler
//! - **TLS termination** — nginx SSL / k8s ingress
//! - **Body-size limits** — `client_max_body_size` in nginx
//! - **Streaming responses** — bodies are buffered bytes
//!
//! What's left is the onion:
//!
//! - Middleware chaining — each layer runs code, delegates at most once
//!   via [`Next`], and runs code again when the inner layers return
//! - Body coercion — text, bytes, streams, and JSON maps become a
//!   payload plus content headers, deterministically
//! - Async I/O — tokio + hyper, graceful shutdown on SIGTERM / Ctrl-C
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use allium::{Application, BoxFuture, Context, Error, Next};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     Application::new()
//!         .wrap(hello)
//!         .listen("0.0.0.0:3000")
//!         .await
//! }
//!
//! fn hello<'a>(ctx: &'a mut Context, _next: Next<'a>) -> BoxFuture<'a, Result<(), Error>> {
//!     Box::pin(async move { ctx.set_body("hello allium").await })
//! }
//! ```
//!
//! Every request flows through the registered middleware in order. A
//! middleware that never calls `next` short-circuits the chain; one that
//! returns an error aborts it and the error lands in the observer
//! registered with [`Application::on_error`]. With no middleware at all,
//! the answer is a `404` whose body is the text `404`.

mod app;
mod body;
mod context;
mod error;
mod middleware;
mod request;
mod response;
mod server;

pub use app::{Application, Config};
pub use body::Body;
pub use context::Context;
pub use error::Error;
pub use middleware::{BoxFuture, Middleware, Next};
pub use request::Request;
pub use response::Response;
