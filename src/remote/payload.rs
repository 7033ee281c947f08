//! `ErrorPayload` - an error rendered for transit.

use std::borrow::Cow;
use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::identity::error_identity;
use crate::codec::JsonCodec;
use crate::error::{Result, RpcError};

/// Transmissible form of an error: its identity and its message.
///
/// Wire shape: `{"errorType": "...", "errorMessage": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    /// Bare-name identity of the original error.
    pub error_type: String,
    /// Display text of the original error.
    pub error_message: String,
}

/// Errors that can rebuild themselves from an [`ErrorPayload`].
///
/// Implement this for error types callers want back with their structured
/// fields, then pass the type to
/// [`Reply::result_as`](crate::Reply::result_as).
///
/// ```
/// use funcwire::remote::{ErrorPayload, FromErrorPayload};
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("rate limited, retry in {retry_after}s")]
/// struct RateLimited {
///     retry_after: u64,
/// }
///
/// impl FromErrorPayload for RateLimited {
///     fn from_error_payload(payload: &ErrorPayload) -> Option<Self> {
///         let secs = payload.error_message.strip_prefix("rate limited, retry in ")?;
///         let retry_after = secs.strip_suffix('s')?.parse().ok()?;
///         Some(RateLimited { retry_after })
///     }
/// }
///
/// let payload = ErrorPayload::new("RateLimited", "rate limited, retry in 30s");
/// assert_eq!(payload.recover_as::<RateLimited>().unwrap().retry_after, 30);
/// ```
pub trait FromErrorPayload: std::error::Error + Send + Sync + Sized + 'static {
    /// Identity this type answers to. Defaults to the bare type name.
    fn identity() -> Cow<'static, str> {
        Cow::Borrowed(error_identity::<Self>())
    }

    /// Rebuild the error. `None` means the payload does not fit.
    fn from_error_payload(payload: &ErrorPayload) -> Option<Self>;
}

impl ErrorPayload {
    /// Create a payload from its two fields.
    pub fn new(error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            error_message: error_message.into(),
        }
    }

    /// Render an error for transit.
    ///
    /// A remote error relayed by a handler (directly or nested in further
    /// handler errors) keeps the callee's message, so it reads the same
    /// after any number of hops.
    pub fn from_error(error: &RpcError) -> Self {
        match error {
            RpcError::Remote(payload) => payload.clone(),
            RpcError::Handler(e) => {
                let message = e
                    .downcast_ref::<RpcError>()
                    .and_then(relayed)
                    .map_or_else(|| e.to_string(), |p| p.error_message.clone());
                Self::new(e.identity(), message)
            }
            other => Self::new(other.identity(), other.to_string()),
        }
    }

    /// True if the identity equals `identity`.
    #[inline]
    pub fn matches(&self, identity: &str) -> bool {
        self.error_type == identity
    }

    /// True if the payload carries the identity of `E`.
    #[inline]
    pub fn is<E: ?Sized>(&self) -> bool {
        self.matches(error_identity::<E>())
    }

    /// Rebuild `E` if the identity matches and reconstruction succeeds.
    pub fn recover_as<E: FromErrorPayload>(&self) -> Option<E> {
        if !self.matches(&E::identity()) {
            return None;
        }
        E::from_error_payload(self)
    }

    /// Encode to JSON bytes.
    pub fn encode(&self) -> Result<Bytes> {
        JsonCodec::encode(self).map(Bytes::from)
    }

    /// Decode from JSON bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        JsonCodec::decode(bytes)
    }
}

/// Payload of a remote error, looking through handler-error wrapping.
fn relayed(error: &RpcError) -> Option<&ErrorPayload> {
    match error {
        RpcError::Remote(payload) => Some(payload),
        RpcError::Handler(e) => e.downcast_ref::<RpcError>().and_then(relayed),
        _ => None,
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type, self.error_message)
    }
}

impl std::error::Error for ErrorPayload {}
