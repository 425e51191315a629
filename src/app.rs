//! Application assembly and the per-request pipeline.
//!
//! An [`Application`] is three things: a [`Config`] resolved once at
//! construction, an append-only middleware chain, and a single error
//! observer. Per request it builds a fresh [`Context`], runs the chain,
//! and on success hands the mutated context to the finalizer, which
//! decides what bytes actually leave the process.

use std::env;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, Response as HttpResponse};
use http_body_util::Full;
use hyper::body::Incoming;
use tracing::error;

use crate::context::Context;
use crate::error::Error;
use crate::middleware::{self, BoxedMiddleware, Middleware};
use crate::request::Request;
use crate::response::is_empty_status;

/// Named options resolved once at construction.
///
/// `env` falls back to the `ALLIUM_ENV` environment variable, then to
/// `"development"`. The remaining fields are the usual behind-a-proxy
/// deployment knobs; they are plain data for the application and its
/// middleware to read, the dispatch core never interprets them.
#[derive(Clone, Debug)]
pub struct Config {
    /// Deployment environment name.
    pub env: String,
    /// Cookie-signing keys, in rotation order.
    pub keys: Vec<String>,
    /// Whether proxy headers are trusted.
    pub proxy: bool,
    /// Leading domain segments to ignore when deriving subdomains.
    pub subdomain_offset: usize,
    /// Header carrying the client ip when behind a proxy.
    pub proxy_ip_header: String,
    /// Maximum ips read from the proxy header, 0 meaning unlimited.
    pub max_ips_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env: env::var("ALLIUM_ENV").unwrap_or_else(|_| "development".to_owned()),
            keys: Vec::new(),
            proxy: false,
            subdomain_offset: 2,
            proxy_ip_header: "X-Forwarded-For".to_owned(),
            max_ips_count: 0,
        }
    }
}

type ErrorHandler = Box<dyn Fn(&Error) + Send + Sync + 'static>;

/// An HTTP application: an ordered middleware chain plus its config and
/// error observer.
///
/// Build it with registrations chained by value, then hand it to
/// [`listen`](Application::listen). Serving consumes the application, so
/// the chain is frozen before the first connection is accepted.
pub struct Application {
    config: Config,
    chain: Vec<BoxedMiddleware>,
    error_handler: ErrorHandler,
}

impl Application {
    /// An application with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// An application with explicit configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            chain: Vec::new(),
            error_handler: Box::new(|err| error!("allium: {err}")),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Appends a middleware to the chain. Returns the application so
    /// registrations chain naturally.
    pub fn wrap(mut self, middleware: impl Middleware) -> Self {
        self.chain.push(Arc::new(middleware));
        self
    }

    /// Replaces the error observer.
    ///
    /// The observer sees every error that escapes the chain, exactly
    /// once. The default observer logs the error and nothing else: no
    /// retry, no client-visible effect.
    pub fn on_error(mut self, handler: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        self.error_handler = Box::new(handler);
        self
    }

    /// Entry point for the transport: one hyper request in, one response
    /// (or a connection-killing error) out.
    pub(crate) async fn handle(
        &self,
        req: http::Request<Incoming>,
    ) -> Result<HttpResponse<Full<Bytes>>, Error> {
        let (parts, body) = req.into_parts();
        self.execute(Context::new(Request::new(parts, Some(body)))).await
    }

    /// Runs one exchange through the chain and finalizes the response.
    ///
    /// On an error the finalizer is skipped: the observer sees the error
    /// and the transport gets it back, so nothing is written for this
    /// request by this layer.
    pub(crate) async fn execute(
        &self,
        mut ctx: Context,
    ) -> Result<HttpResponse<Full<Bytes>>, Error> {
        let outcome = middleware::run(&self.chain, &mut ctx).await;

        let result = match outcome {
            Ok(()) => respond(ctx),
            Err(err) => Err(err),
        };

        result.map_err(|err| {
            (self.error_handler)(&err);
            err
        })
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

/// Decides what bytes leave the process for a finished exchange.
fn respond(ctx: Context) -> Result<HttpResponse<Full<Bytes>>, Error> {
    let status = ctx.response.status();

    // statuses that carry no entity body: drop whatever was assigned
    if is_empty_status(status) {
        return Ok(assemble(ctx, Bytes::new()));
    }

    // HEAD: trim to the declared content-length when one is set
    if ctx.request.method() == &Method::HEAD {
        let declared = ctx.response.length()?;
        let mut bytes = ctx.response.body().cloned().unwrap_or_default();
        if let Some(length) = declared {
            if length != 0 {
                bytes.truncate(length);
            }
        }
        return Ok(assemble(ctx, bytes));
    }

    let bytes = match ctx.response.body() {
        Some(body) => body.clone(),
        // a content-bearing status with no body answers with its own code
        None => Bytes::from(status.as_u16().to_string()),
    };
    Ok(assemble(ctx, bytes))
}

/// Copies the view's status and headers onto the wire response.
fn assemble(ctx: Context, bytes: Bytes) -> HttpResponse<Full<Bytes>> {
    let (status, headers, _) = ctx.response.into_parts();
    let mut response = HttpResponse::new(Full::new(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
