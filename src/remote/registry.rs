//! Error registry for turning known remote identities back into local errors.
//!
//! The registry is built once at startup and shared by reference (the
//! [`Invoker`](crate::Invoker) holds it in an `Arc`). It is read-only while
//! calls are in flight.
//!
//! # Example
//!
//! ```
//! use funcwire::remote::{ErrorPayload, ErrorRegistry};
//!
//! #[derive(Debug, Clone, PartialEq, thiserror::Error)]
//! #[error("timed out")]
//! struct Timeout;
//!
//! let mut registry = ErrorRegistry::new();
//! registry.register_as("timeoutError", Timeout);
//!
//! let err = registry.recover(ErrorPayload::new("timeoutError", "boom"));
//! assert_eq!(err.downcast_ref::<Timeout>(), Some(&Timeout));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::handler_error::HandlerError;
use super::identity::error_identity;
use super::payload::{ErrorPayload, FromErrorPayload};
use crate::error::RpcError;

/// Constructor producing the local error for a matched identity.
type Recover = Arc<dyn Fn(&ErrorPayload) -> RpcError + Send + Sync>;

/// Registry mapping error identities to local errors.
#[derive(Clone)]
pub struct ErrorRegistry {
    known: HashMap<String, Recover>,
}

impl ErrorRegistry {
    /// Create a registry that knows the crate's own recoverable errors.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_with("FunctionNotFound", |_| RpcError::FunctionNotFound);
        registry.register_with("EmptyFuncKey", |_| RpcError::EmptyFuncKey);
        registry.register_with("Unhandled", |_| RpcError::Unhandled);
        registry
    }

    /// Create a registry with no entries at all.
    pub fn empty() -> Self {
        Self {
            known: HashMap::new(),
        }
    }

    /// Register a sentinel under its type's bare name.
    pub fn register<E>(&mut self, sentinel: E) -> &mut Self
    where
        E: std::error::Error + Clone + Send + Sync + 'static,
    {
        self.register_as(error_identity::<E>(), sentinel)
    }

    /// Register a sentinel under an explicit identity.
    ///
    /// Recovery yields a clone of the sentinel wrapped as a handler error
    /// carrying the same identity.
    pub fn register_as<E>(&mut self, identity: impl Into<String>, sentinel: E) -> &mut Self
    where
        E: std::error::Error + Clone + Send + Sync + 'static,
    {
        let identity = identity.into();
        let tag = identity.clone();
        self.register_with(identity, move |_| {
            RpcError::Handler(HandlerError::with_identity(tag.clone(), sentinel.clone()))
        })
    }

    /// Register a constructor that builds the local error from the payload.
    pub fn register_with<F>(&mut self, identity: impl Into<String>, recover: F) -> &mut Self
    where
        F: Fn(&ErrorPayload) -> RpcError + Send + Sync + 'static,
    {
        let identity = identity.into();
        if self.known.insert(identity.clone(), Arc::new(recover)).is_some() {
            tracing::debug!(identity = %identity, "replaced error registry entry");
        }
        self
    }

    /// Check whether an identity is known.
    pub fn contains(&self, identity: &str) -> bool {
        self.known.contains_key(identity)
    }

    /// Number of known identities.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Recover a local error: a registered identity yields its sentinel,
    /// anything else comes back as [`RpcError::Remote`].
    pub fn recover(&self, payload: ErrorPayload) -> RpcError {
        match self.known.get(&payload.error_type) {
            Some(recover) => recover(&payload),
            None => RpcError::Remote(payload),
        }
    }

    /// Recover with a caller-supplied target tried first.
    ///
    /// `E` matches only when its identity equals the payload's and
    /// [`FromErrorPayload::from_error_payload`] succeeds. The rebuilt error is
    /// returned as [`RpcError::Handler`]. Otherwise this falls back to
    /// [`recover`](Self::recover).
    pub fn recover_as<E: FromErrorPayload>(&self, payload: ErrorPayload) -> RpcError {
        match payload.recover_as::<E>() {
            Some(error) => RpcError::Handler(HandlerError::with_identity(payload.error_type, error)),
            None => self.recover(payload),
        }
    }
}

impl Default for ErrorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ErrorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut identities: Vec<&str> = self.known.keys().map(String::as_str).collect();
        identities.sort_unstable();
        f.debug_struct("ErrorRegistry")
            .field("known", &identities)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, thiserror::Error)]
    #[error("timed out")]
    struct TimeoutError;

    #[derive(Debug, Clone, PartialEq, thiserror::Error)]
    #[error("account {account} locked")]
    struct AccountLocked {
        account: String,
    }

    impl FromErrorPayload for AccountLocked {
        fn from_error_payload(payload: &ErrorPayload) -> Option<Self> {
            let account = payload
                .error_message
                .strip_prefix("account ")?
                .strip_suffix(" locked")?;
            Some(Self {
                account: account.to_string(),
            })
        }
    }

    #[test]
    fn test_builtin_identities() {
        let registry = ErrorRegistry::new();
        assert!(registry.contains("FunctionNotFound"));
        assert!(registry
            .recover(ErrorPayload::new("FunctionNotFound", "function not found"))
            .is_function_not_found());
        assert!(matches!(
            registry.recover(ErrorPayload::new("Unhandled", "")),
            RpcError::Unhandled
        ));
    }

    #[test]
    fn test_empty_registry_knows_nothing() {
        let registry = ErrorRegistry::empty();
        assert!(registry.is_empty());
        let err = registry.recover(ErrorPayload::new("FunctionNotFound", "x"));
        assert!(matches!(err, RpcError::Remote(_)));
    }

    #[test]
    fn test_register_sentinel_by_type_name() {
        let mut registry = ErrorRegistry::new();
        registry.register(TimeoutError);
        assert!(registry.contains("TimeoutError"));

        let err = registry.recover(ErrorPayload::new("TimeoutError", "boom"));
        assert_eq!(err.downcast_ref::<TimeoutError>(), Some(&TimeoutError));
        assert_eq!(err.identity(), "TimeoutError");
    }

    #[test]
    fn test_register_sentinel_by_explicit_identity() {
        let mut registry = ErrorRegistry::new();
        registry.register_as("timeoutError", TimeoutError);

        let err = registry.recover(ErrorPayload::new("timeoutError", "boom"));
        assert_eq!(err.downcast_ref::<TimeoutError>(), Some(&TimeoutError));
        assert_eq!(err.identity(), "timeoutError");
    }

    #[test]
    fn test_register_with_constructor() {
        let mut registry = ErrorRegistry::empty();
        registry.register_with("Throttled", |p| {
            RpcError::transport(format!("throttled upstream: {}", p.error_message))
        });

        let err = registry.recover(ErrorPayload::new("Throttled", "slow down"));
        assert_eq!(err.to_string(), "transport error: throttled upstream: slow down");
    }

    #[test]
    fn test_unknown_identity_is_opaque() {
        let registry = ErrorRegistry::new();
        let err = registry.recover(ErrorPayload::new("Mystery", "??"));
        let payload = err.error_payload().unwrap();
        assert_eq!(payload.error_type, "Mystery");
        assert_eq!(payload.error_message, "??");
    }

    #[test]
    fn test_recover_as_target_first() {
        let mut registry = ErrorRegistry::new();
        registry.register_with("AccountLocked", |_| RpcError::Unhandled);

        let err = registry.recover_as::<AccountLocked>(ErrorPayload::new(
            "AccountLocked",
            "account acme locked",
        ));
        assert_eq!(
            err.downcast_ref::<AccountLocked>(),
            Some(&AccountLocked {
                account: "acme".into()
            })
        );
    }

    #[test]
    fn test_recover_as_falls_back_when_reconstruction_fails() {
        let mut registry = ErrorRegistry::new();
        registry.register_with("AccountLocked", |_| RpcError::Unhandled);

        let err = registry.recover_as::<AccountLocked>(ErrorPayload::new("AccountLocked", "garbled"));
        assert!(matches!(err, RpcError::Unhandled));
    }

    #[test]
    fn test_recover_as_falls_back_to_registry() {
        let registry = ErrorRegistry::new();
        let err = registry.recover_as::<AccountLocked>(ErrorPayload::new("FunctionNotFound", ""));
        assert!(err.is_function_not_found());
    }

    #[test]
    fn test_debug_lists_identities() {
        let registry = ErrorRegistry::new();
        let debug = format!("{:?}", registry);
        assert!(debug.contains("FunctionNotFound"));
    }
}
