//! Remote error module - error identity across the invoke boundary.
//!
//! Provides:
//! - [`ErrorPayload`] - the `{errorType, errorMessage}` form an error takes on the wire
//! - [`HandlerError`] - a handler's declared error, tagged with its identity
//! - [`ErrorRegistry`] - identities the caller knows how to turn back into local errors
//! - [`error_identity`] - bare type name used as the identity
//!
//! # Example
//!
//! ```
//! use funcwire::remote::{ErrorPayload, ErrorRegistry};
//! use funcwire::RpcError;
//!
//! let registry = ErrorRegistry::new();
//!
//! let payload = ErrorPayload::new("FunctionNotFound", "function not found");
//! assert!(registry.recover(payload).is_function_not_found());
//!
//! let payload = ErrorPayload::new("Throttled", "slow down");
//! assert!(matches!(registry.recover(payload), RpcError::Remote(_)));
//! ```

mod handler_error;
mod identity;
mod payload;
mod registry;

pub use handler_error::HandlerError;
pub use identity::{bare_type_name, error_identity};
pub use payload::{ErrorPayload, FromErrorPayload};
pub use registry::ErrorRegistry;
