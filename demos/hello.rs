//! Minimal allium example — a timing layer wrapped around a JSON greeting.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example hello
//!
//! Try:
//!   curl -i http://localhost:3000/
//!   curl -I http://localhost:3000/

use allium::{Application, BoxFuture, Context, Error, Next};
use serde_json::{Map, Value};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    Application::new()
        .wrap(timing)
        .wrap(greet)
        .listen("0.0.0.0:3000")
        .await
        .expect("server error");
}

// Runs before and after everything registered below it.
fn timing<'a>(ctx: &'a mut Context, mut next: Next<'a>) -> BoxFuture<'a, Result<(), Error>> {
    Box::pin(async move {
        let start = std::time::Instant::now();
        next.run(ctx).await?;
        tracing::info!(elapsed = ?start.elapsed(), status = %ctx.status(), "handled");
        Ok(())
    })
}

// Innermost layer: answers without delegating further.
fn greet<'a>(ctx: &'a mut Context, _next: Next<'a>) -> BoxFuture<'a, Result<(), Error>> {
    Box::pin(async move {
        let mut payload = Map::new();
        payload.insert("hello".to_owned(), Value::from("allium"));
        ctx.set_body(payload).await
    })
}
