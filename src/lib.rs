//! # funcwire
//!
//! Function-key RPC over a synchronous invoke transport.
//!
//! A caller names a remote function by a string key ("funcKey"), ships an
//! argument as JSON and gets back either a result or an error whose
//! identity survives the trip, so callers can match on it.
//!
//! ## Architecture
//!
//! - **Mux** (callee): binds keys to async handlers of several shapes and
//!   dispatches envelopes to them
//! - **Invoker** (caller): builds envelopes, performs one transport
//!   exchange and interprets the reply
//! - **Remote errors**: errors cross the wire as
//!   `{"errorType", "errorMessage"}` and are recovered through an
//!   [`ErrorRegistry`]
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use funcwire::{Context, HandlerError, Invoker, Loopback, Mux};
//!
//! # async fn run() -> funcwire::Result<()> {
//! let mux = Arc::new(Mux::new());
//! mux.register("Foo_Bar", |_ctx: Context, n: i64| async move {
//!     Ok::<_, HandlerError>((n * 2).to_string())
//! })?;
//!
//! let invoker = Invoker::new(Loopback::new(mux));
//! let out: String = invoker
//!     .invoke(&Context::new(), "Foo_Bar", &5)
//!     .await
//!     .result()?;
//! assert_eq!(out, "10");
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod envelope;
pub mod error;
pub mod mux;
pub mod remote;
pub mod transport;

mod context;
mod invoker;

pub use context::Context;
pub use envelope::{Envelope, ENVELOPE_FORMAT_VERSION};
pub use error::{Result, RpcError};
pub use invoker::{Func, Invoker, InvokerBuilder, InvokerConfig, Reply, DEFAULT_MAX_REQUEST_SIZE};
pub use mux::{Mux, MuxConfig};
pub use remote::{ErrorPayload, ErrorRegistry, HandlerError};
pub use transport::{Loopback, Transport, TransportResponse};
