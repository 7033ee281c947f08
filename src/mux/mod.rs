//! Mux module - handler registration and dispatch.
//!
//! Provides:
//! - [`Mux`] - maps function keys to handlers
//! - [`Handler`] - implemented for async functions of the supported shapes
//! - [`Data`] - marks a handler result as plain data
//!
//! # Example
//!
//! ```
//! use funcwire::mux::{method_key, Data, Mux};
//! use funcwire::{Context, HandlerError};
//!
//! let mux = Mux::new();
//!
//! // Data in, data out
//! mux.register(method_key("Echo", "Say"), |s: String| async move { Data(s) })?;
//!
//! // Context and data in, data or error out
//! mux.register(method_key("Math", "Half"), |_ctx: Context, n: i64| async move {
//!     if n % 2 != 0 {
//!         return Err(HandlerError::from(std::fmt::Error));
//!     }
//!     Ok(n / 2)
//! })?;
//!
//! assert_eq!(mux.func_keys(), vec!["Echo_Say", "Math_Half"]);
//! # Ok::<(), funcwire::RpcError>(())
//! ```

mod handler;
mod registry;
mod shape;

pub use handler::{BoxFuture, Handler, Trampoline};
pub use registry::{HandlerDescriptor, Mux, MuxConfig, DEFAULT_MAX_ENVELOPE_SIZE};
pub use shape::{
    classify_inputs, Data, InputShape, IntoReply, OutputShape, Param, ParamKind, Signature,
};

/// Function key for a service method: `"Service_Method"`.
pub fn method_key(service: &str, method: &str) -> String {
    format!("{service}_{method}")
}
