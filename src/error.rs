//! Error types for funcwire.

use std::borrow::Cow;

use thiserror::Error;

use crate::remote::{ErrorPayload, HandlerError};

/// Boxed error used at the transport boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for all funcwire operations.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Handler signature outside the supported shapes.
    #[error("invalid handler signature for {func_key:?}: {reason}")]
    InvalidSignature {
        /// Key the handler was being registered under.
        func_key: String,
        /// Which rule the signature broke.
        reason: &'static str,
    },

    /// Function keys must be non-empty.
    #[error("empty function key")]
    EmptyFuncKey,

    /// No handler is registered for the requested key.
    #[error("function not found")]
    FunctionNotFound,

    /// JSON serialization error.
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// JSON deserialization error.
    #[error("decode error: {0}")]
    Decode(#[source] serde_json::Error),

    /// Payload exceeds the configured limit.
    #[error("payload of {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge {
        /// Encoded size in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },

    /// Error returned by the handler itself.
    #[error("{0}")]
    Handler(HandlerError),

    /// The transport reported an unhandled failure without any detail.
    #[error("unhandled remote failure")]
    Unhandled,

    /// Remote error whose identity is not known locally.
    #[error("remote error: {0}")]
    Remote(ErrorPayload),

    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),
}

impl RpcError {
    /// Wrap any error as a transport failure.
    pub fn transport<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        RpcError::Transport(error.into())
    }

    /// Identity carried in `errorType` when this error crosses the wire.
    pub fn identity(&self) -> Cow<'_, str> {
        match self {
            RpcError::InvalidSignature { .. } => Cow::Borrowed("InvalidSignature"),
            RpcError::EmptyFuncKey => Cow::Borrowed("EmptyFuncKey"),
            RpcError::FunctionNotFound => Cow::Borrowed("FunctionNotFound"),
            RpcError::Encode(_) => Cow::Borrowed("EncodeError"),
            RpcError::Decode(_) => Cow::Borrowed("DecodeError"),
            RpcError::PayloadTooLarge { .. } => Cow::Borrowed("PayloadTooLarge"),
            RpcError::Handler(e) => Cow::Borrowed(e.identity()),
            RpcError::Unhandled => Cow::Borrowed("Unhandled"),
            RpcError::Remote(p) => Cow::Borrowed(&p.error_type),
            RpcError::Transport(_) => Cow::Borrowed("TransportError"),
        }
    }

    /// The opaque payload, if recovery could not match a local error.
    pub fn error_payload(&self) -> Option<&ErrorPayload> {
        match self {
            RpcError::Remote(p) => Some(p),
            _ => None,
        }
    }

    /// The handler's declared error, if this is one.
    pub fn handler_error(&self) -> Option<&HandlerError> {
        match self {
            RpcError::Handler(e) => Some(e),
            _ => None,
        }
    }

    /// Downcast a handler error to its concrete type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        self.handler_error().and_then(|e| e.downcast_ref::<E>())
    }

    /// True for [`RpcError::FunctionNotFound`].
    pub fn is_function_not_found(&self) -> bool {
        matches!(self, RpcError::FunctionNotFound)
    }
}

/// Result type alias using RpcError.
pub type Result<T> = std::result::Result<T, RpcError>;
