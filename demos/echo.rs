//! Echo - simple request/response example.
//!
//! This example demonstrates:
//! - Registering handlers of different shapes on a [`Mux`]
//! - Calling them through an [`Invoker`] over the in-process loopback
//! - Decoding typed results
//!
//! Run with `RUST_LOG=debug cargo run --example echo` to see dispatch logs.

use std::sync::Arc;

use funcwire::mux::{method_key, Data};
use funcwire::{Context, HandlerError, Invoker, Loopback, Mux};
use serde::{Deserialize, Serialize};

/// Input structure for the echo method.
#[derive(Serialize, Deserialize, Debug)]
struct EchoInput {
    message: String,
}

/// Output structure for the echo method.
#[derive(Serialize, Deserialize, Debug)]
struct EchoOutput {
    echo: String,
    request_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mux = Arc::new(Mux::new());

    mux.register(
        method_key("Echo", "Say"),
        |ctx: Context, input: EchoInput| async move {
            Ok::<_, HandlerError>(EchoOutput {
                echo: input.message,
                request_id: ctx.request_id().map(str::to_owned),
            })
        },
    )?;
    mux.register(method_key("Echo", "Upper"), |s: String| async move {
        Data(s.to_uppercase())
    })?;
    mux.register(method_key("Echo", "Ping"), || async { Data("pong") })?;

    tracing::info!(funcs = ?mux.func_keys(), "handlers registered");

    let invoker = Invoker::new(Loopback::new(Arc::clone(&mux)));
    let ctx = Context::new().with_request_id("demo-1");

    let out: EchoOutput = invoker
        .invoke(
            &ctx,
            "Echo_Say",
            &EchoInput {
                message: "hello".into(),
            },
        )
        .await
        .result()?;
    tracing::info!(?out, "Echo_Say");

    let upper: String = invoker.func("Echo_Upper").invoke(&ctx, "quiet").await.result()?;
    tracing::info!(%upper, "Echo_Upper");

    let pong: String = invoker.invoke_empty(&ctx, "Echo_Ping").await.result()?;
    tracing::info!(%pong, "Echo_Ping");

    Ok(())
}
