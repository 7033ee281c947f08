//! In-process transport.
//!
//! Hands envelopes straight to a [`Mux`] and reports failures the way a
//! hosting runtime does: rendered as an `ErrorPayload` with the unhandled
//! flag set. Used by tests, demos and single-process deployments.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use funcwire::{Context, Invoker, Loopback, Mux};
//! use funcwire::mux::Data;
//!
//! # async fn run() -> funcwire::Result<()> {
//! let mux = Arc::new(Mux::new());
//! mux.register("Echo_Say", |s: String| async move { Data(s) })?;
//!
//! let invoker = Invoker::new(Loopback::new(mux));
//! let reply: String = invoker
//!     .invoke(&Context::new(), "Echo_Say", "hi")
//!     .await
//!     .result()?;
//! assert_eq!(reply, "hi");
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use bytes::Bytes;

use super::{Transport, TransportResponse};
use crate::context::Context;
use crate::error::Result;
use crate::mux::{BoxFuture, Mux};

/// Transport that dispatches into a local [`Mux`].
#[derive(Debug, Clone)]
pub struct Loopback {
    mux: Arc<Mux>,
}

impl Loopback {
    /// Wrap a shared mux.
    pub fn new(mux: Arc<Mux>) -> Self {
        Self { mux }
    }

    /// The mux calls are dispatched into.
    pub fn mux(&self) -> &Arc<Mux> {
        &self.mux
    }
}

impl Transport for Loopback {
    fn invoke<'a>(
        &'a self,
        ctx: &'a Context,
        payload: Bytes,
    ) -> BoxFuture<'a, Result<TransportResponse>> {
        Box::pin(async move { self.mux.respond(ctx.clone(), &payload).await })
    }
}
