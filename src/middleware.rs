//! Middleware trait and the onion dispatcher.
//!
//! # How the onion runs
//!
//! An application is an ordered list of middleware. Dispatch walks the
//! list with a single integer cursor, starting one position before the
//! head. Each middleware receives the exchange [`Context`] and a
//! [`Next`] continuation:
//!
//! ```text
//! a in → b in → c in → (empty tail) → c out → b out → a out
//! ```
//!
//! A middleware may run code before `next.run(..)`, delegate at most
//! once, and run code after the continuation returns. Not delegating at
//! all short-circuits the chain, which is the designed way to answer
//! without involving deeper layers. Delegating a second time is a
//! protocol violation: the cursor has already moved past that position,
//! so the engine forces the status to 500 and returns
//! [`Error::MultipleNext`].
//!
//! # How middleware are stored
//!
//! The chain needs to hold middleware of *different* concrete types in a
//! single `Vec`, so each one is erased behind `Arc<dyn Middleware>` and
//! invoked through one virtual call per request. Plain functions with the
//! right signature get a blanket impl:
//!
//! ```rust
//! use allium::{BoxFuture, Context, Error, Next};
//!
//! fn trace<'a>(ctx: &'a mut Context, mut next: Next<'a>) -> BoxFuture<'a, Result<(), Error>> {
//!     Box::pin(async move {
//!         next.run(ctx).await?;
//!         tracing::info!(status = %ctx.status(), "handled");
//!         Ok(())
//!     })
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::StatusCode;

use crate::context::Context;
use crate::error::Error;

/// A heap-allocated, type-erased future.
///
/// `Pin<Box<..>>` because the runtime polls the future in place; `Send`
/// so tokio may move it across threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One layer of the onion.
///
/// Implement this on a struct when the middleware carries configuration
/// or shared handles; plain `fn` items with the matching signature are
/// covered by a blanket impl.
pub trait Middleware: Send + Sync + 'static {
    /// Handles one exchange. `next` resumes the rest of the chain; see
    /// the module docs for the exactly-once contract.
    fn handle<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Result<(), Error>>;
}

impl<F> Middleware for F
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, Result<(), Error>>,
    F: Send + Sync + 'static,
{
    fn handle<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Result<(), Error>> {
        self(ctx, next)
    }
}

/// A type-erased middleware shared across concurrent requests.
pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// The continuation capability handed to each middleware.
///
/// Holds the position it would resume at; the cursor itself is shared
/// across the whole dispatch recursion, which is what makes a repeated
/// `run` on the same position detectable.
pub struct Next<'a> {
    chain: &'a [BoxedMiddleware],
    cursor: &'a mut isize,
    position: usize,
}

impl Next<'_> {
    /// Invokes the rest of the chain against `ctx`.
    pub async fn run(&mut self, ctx: &mut Context) -> Result<(), Error> {
        dispatch(self.chain, &mut *self.cursor, self.position, ctx).await
    }
}

/// Runs the whole chain against `ctx` with a fresh cursor.
pub(crate) async fn run(chain: &[BoxedMiddleware], ctx: &mut Context) -> Result<(), Error> {
    let mut cursor: isize = -1;
    dispatch(chain, &mut cursor, 0, ctx).await
}

/// One step of the onion walk.
///
/// The cursor only ever moves forward; a position at or behind it means
/// some continuation was invoked a second time.
fn dispatch<'a>(
    chain: &'a [BoxedMiddleware],
    cursor: &'a mut isize,
    position: usize,
    ctx: &'a mut Context,
) -> BoxFuture<'a, Result<(), Error>> {
    Box::pin(async move {
        if position as isize <= *cursor {
            ctx.response.set_status(StatusCode::INTERNAL_SERVER_ERROR);
            return Err(Error::MultipleNext);
        }
        *cursor = position as isize;

        match chain.get(position) {
            // past the last middleware: the tail is empty, nothing to do
            None => Ok(()),
            Some(middleware) => {
                let next = Next { chain, cursor, position: position + 1 };
                middleware.handle(ctx, next).await
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use http::{Method, StatusCode};

    use super::{BoxFuture, BoxedMiddleware, Middleware, Next, run};
    use crate::context::Context;
    use crate::error::Error;
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

    struct Recorder {
        name: &'static str,
        delegate: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Recorder {
        fn handle<'a>(
            &'a self,
            ctx: &'a mut Context,
            mut next: Next<'a>,
        ) -> BoxFuture<'a, Result<(), Error>> {
            Box::pin(async move {
                self.log.lock().unwrap().push(format!("{} in", self.name));
                if self.delegate {
                    next.run(ctx).await?;
                }
                self.log.lock().unwrap().push(format!("{} out", self.name));
                Ok(())
            })
        }
    }

    struct Counter {
        hits: Arc<AtomicUsize>,
    }

    impl Middleware for Counter {
        fn handle<'a>(
            &'a self,
            ctx: &'a mut Context,
            mut next: Next<'a>,
        ) -> BoxFuture<'a, Result<(), Error>> {
            Box::pin(async move {
                self.hits.fetch_add(1, Ordering::SeqCst);
                next.run(ctx).await
            })
        }
    }

    #[tokio::test]
    async fn runs_in_ascending_onion_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain: Vec<BoxedMiddleware> = vec![
            Arc::new(Recorder { name: "a", delegate: true, log: Arc::clone(&log) }),
            Arc::new(Recorder { name: "b", delegate: true, log: Arc::clone(&log) }),
            Arc::new(Recorder { name: "c", delegate: true, log: Arc::clone(&log) }),
        ];

        let mut ctx = context();
        run(&chain, &mut ctx).await.expect("chain");

        assert_eq!(*log.lock().unwrap(), ["a in", "b in", "c in", "c out", "b out", "a out"]);
    }

    #[tokio::test]
    async fn not_delegating_short_circuits_without_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain: Vec<BoxedMiddleware> = vec![
            Arc::new(Recorder { name: "a", delegate: true, log: Arc::clone(&log) }),
            Arc::new(Recorder { name: "b", delegate: false, log: Arc::clone(&log) }),
            Arc::new(Recorder { name: "c", delegate: true, log: Arc::clone(&log) }),
        ];

        let mut ctx = context();
        run(&chain, &mut ctx).await.expect("chain");

        assert_eq!(*log.lock().unwrap(), ["a in", "b in", "b out", "a out"]);
    }

    fn greedy<'a>(ctx: &'a mut Context, mut next: Next<'a>) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            let _ = next.run(ctx).await;
            let _ = next.run(ctx).await;
            Ok(())
        })
    }

    #[tokio::test]
    async fn a_second_next_is_flagged_but_swallowable() {
        let chain: Vec<BoxedMiddleware> = vec![Arc::new(greedy)];

        let mut ctx = context();
        run(&chain, &mut ctx).await.expect("the middleware swallowed the violation");

        assert_eq!(ctx.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    fn eager<'a>(ctx: &'a mut Context, mut next: Next<'a>) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            next.run(ctx).await?;
            next.run(ctx).await
        })
    }

    #[tokio::test]
    async fn a_second_next_propagates_and_stops_the_chain() {
        let hits = Arc::new(AtomicUsize::new(0));
        let chain: Vec<BoxedMiddleware> =
            vec![Arc::new(eager), Arc::new(Counter { hits: Arc::clone(&hits) })];

        let mut ctx = context();
        let err = run(&chain, &mut ctx).await.unwrap_err();

        assert!(matches!(err, Error::MultipleNext));
        assert_eq!(ctx.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // the tail ran exactly once, on the first (legal) delegation
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    fn failing<'a>(_ctx: &'a mut Context, _next: Next<'a>) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move { Err(Error::other("boom")) })
    }

    #[tokio::test]
    async fn an_error_aborts_the_rest_of_the_chain() {
        let hits = Arc::new(AtomicUsize::new(0));
        let chain: Vec<BoxedMiddleware> =
            vec![Arc::new(failing), Arc::new(Counter { hits: Arc::clone(&hits) })];

        let mut ctx = context();
        let err = run(&chain, &mut ctx).await.unwrap_err();

        assert_eq!(err.to_string(), "boom");
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn an_empty_chain_succeeds_and_touches_nothing() {
        let mut ctx = context();
        run(&[], &mut ctx).await.expect("empty chain");
        assert_eq!(ctx.status(), StatusCode::NOT_FOUND);
        assert!(ctx.body().is_none());
    }
}
