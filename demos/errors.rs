//! Errors - how handler errors reach the caller.
//!
//! This example demonstrates:
//! - A declared error recovered through the error registry
//! - A structured error rebuilt by the caller with `result_as`
//! - An unknown identity arriving as an opaque remote error
//! - Calling a key nothing is bound to

use std::sync::Arc;

use funcwire::remote::{ErrorPayload, FromErrorPayload};
use funcwire::{Context, ErrorRegistry, HandlerError, Invoker, Loopback, Mux, RpcError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("order not found")]
struct OrderNotFound;

#[derive(Debug, thiserror::Error)]
#[error("only {available} left")]
struct OutOfStock {
    available: u32,
}

impl FromErrorPayload for OutOfStock {
    fn from_error_payload(payload: &ErrorPayload) -> Option<Self> {
        let available = payload
            .error_message
            .strip_prefix("only ")?
            .strip_suffix(" left")?
            .parse()
            .ok()?;
        Some(Self { available })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("warehouse offline")]
struct WarehouseOffline;

fn describe(err: &RpcError) -> String {
    if let Some(e) = err.downcast_ref::<OrderNotFound>() {
        return format!("known error: {e}");
    }
    if let Some(e) = err.downcast_ref::<OutOfStock>() {
        return format!("rebuilt error, available = {}", e.available);
    }
    if let Some(p) = err.error_payload() {
        return format!("opaque remote error {} ({})", p.error_type, p.error_message);
    }
    format!("{} ({})", err, err.identity())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mux = Arc::new(Mux::new());
    mux.register("Orders_Get", |id: u64| async move {
        if id != 1 {
            return Err(HandlerError::new(OrderNotFound));
        }
        Ok("widget")
    })?;
    mux.register("Orders_Reserve", |qty: u32| async move {
        if qty > 3 {
            return Err(OutOfStock { available: 3 });
        }
        Ok(())
    })?;
    mux.register("Orders_Ship", |_ctx: Context| async {
        Err::<(), _>(WarehouseOffline)
    })?;

    let mut errors = ErrorRegistry::new();
    errors.register(OrderNotFound);
    let invoker = Invoker::builder(Loopback::new(mux)).errors(errors).build();
    let ctx = Context::new();

    let item: String = invoker.invoke(&ctx, "Orders_Get", &1).await.result()?;
    tracing::info!(%item, "Orders_Get(1)");

    if let Err(e) = invoker.invoke(&ctx, "Orders_Get", &7).await.result::<String>() {
        tracing::info!("Orders_Get(7): {}", describe(&e));
    }

    if let Err(e) = invoker
        .invoke(&ctx, "Orders_Reserve", &5)
        .await
        .result_as::<(), OutOfStock>()
    {
        tracing::info!("Orders_Reserve(5): {}", describe(&e));
    }

    if let Err(e) = invoker.invoke_empty(&ctx, "Orders_Ship").await.discard() {
        tracing::info!("Orders_Ship: {}", describe(&e));
    }

    if let Err(e) = invoker.invoke_empty(&ctx, "Orders_Cancel").await.discard() {
        tracing::info!("Orders_Cancel: {}", describe(&e));
    }

    Ok(())
}
