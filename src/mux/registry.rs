//! Handler registry ("mux") for dispatching envelopes by function key.
//!
//! The mux maps function keys to handler descriptors. Registration and
//! dispatch both take `&self`, so one `Arc<Mux>` can be shared between the
//! task that wires handlers up and the tasks serving calls.
//!
//! # Example
//!
//! ```
//! use funcwire::{Context, HandlerError, Mux};
//!
//! # async fn run() -> funcwire::Result<()> {
//! let mux = Mux::new();
//! mux.register("Math_Double", |_ctx: Context, n: i64| async move {
//!     Ok::<_, HandlerError>(n * 2)
//! })?;
//!
//! let out = mux
//!     .dispatch(Context::new(), br#"{"funcKey":"Math_Double","data":21}"#)
//!     .await?;
//! assert_eq!(&out[..], b"42");
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;

use super::handler::{Handler, Trampoline};
use super::shape::Signature;
use crate::context::Context;
use crate::envelope::Envelope;
use crate::error::{Result, RpcError};
use crate::remote::ErrorPayload;
use crate::transport::TransportResponse;

/// Default envelope size limit (6 MiB).
pub const DEFAULT_MAX_ENVELOPE_SIZE: usize = 6 * 1024 * 1024;

/// Mux configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuxConfig {
    /// Largest envelope `dispatch` accepts, in bytes.
    pub max_envelope_size: usize,
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self {
            max_envelope_size: DEFAULT_MAX_ENVELOPE_SIZE,
        }
    }
}

impl MuxConfig {
    /// Set the envelope size limit.
    pub fn with_max_envelope_size(mut self, size: usize) -> Self {
        self.max_envelope_size = size;
        self
    }
}

/// Entry for a registered function.
pub struct HandlerDescriptor {
    /// Key the handler is bound to.
    func_key: String,
    /// Classified shape of the handler.
    signature: Signature,
    /// Type-erased call.
    call: Trampoline,
}

impl HandlerDescriptor {
    /// Key the handler is bound to.
    pub fn func_key(&self) -> &str {
        &self.func_key
    }

    /// Classified signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("func_key", &self.func_key)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Registry mapping function keys to handlers.
pub struct Mux {
    /// Descriptors by function key.
    table: RwLock<HashMap<String, Arc<HandlerDescriptor>>>,
    config: MuxConfig,
}

impl Mux {
    /// Create an empty mux with the default configuration.
    pub fn new() -> Self {
        Self::with_config(MuxConfig::default())
    }

    /// Create an empty mux with a custom configuration.
    pub fn with_config(config: MuxConfig) -> Self {
        Self {
            table: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &MuxConfig {
        &self.config
    }

    /// Register a handler under `func_key`.
    ///
    /// A second registration under the same key replaces the first.
    ///
    /// # Errors
    ///
    /// - [`RpcError::EmptyFuncKey`] for an empty key
    /// - [`RpcError::InvalidSignature`] if the handler's parameters are not
    ///   one of the supported shapes
    pub fn register<H, Args>(&self, func_key: impl Into<String>, handler: H) -> Result<()>
    where
        H: Handler<Args>,
    {
        let func_key = func_key.into();
        if func_key.is_empty() {
            return Err(RpcError::EmptyFuncKey);
        }

        let signature = H::signature().map_err(|reason| RpcError::InvalidSignature {
            func_key: func_key.clone(),
            reason,
        })?;

        let descriptor = Arc::new(HandlerDescriptor {
            func_key: func_key.clone(),
            signature,
            call: handler.into_trampoline(),
        });

        let replaced = self.table.write().insert(func_key.clone(), descriptor);
        if replaced.is_some() {
            tracing::debug!(func_key = %func_key, "replaced handler");
        } else {
            tracing::debug!(
                func_key = %func_key,
                input = ?signature.input,
                output = ?signature.output,
                "registered handler"
            );
        }
        Ok(())
    }

    /// Remove the handler bound to `func_key`. Returns true if one existed.
    pub fn unregister(&self, func_key: &str) -> bool {
        self.table.write().remove(func_key).is_some()
    }

    /// Look up a descriptor by key.
    pub fn get(&self, func_key: &str) -> Option<Arc<HandlerDescriptor>> {
        self.table.read().get(func_key).cloned()
    }

    /// Signature of the handler bound to `func_key`.
    pub fn signature(&self, func_key: &str) -> Option<Signature> {
        self.table.read().get(func_key).map(|d| d.signature)
    }

    /// Check whether `func_key` is bound.
    pub fn contains(&self, func_key: &str) -> bool {
        self.table.read().contains_key(func_key)
    }

    /// Number of bound keys.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// True if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// All bound keys, sorted.
    pub fn func_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.table.read().keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Dispatch an encoded envelope to the handler bound to its key.
    ///
    /// Returns the encoded result: empty for handlers that return no data.
    ///
    /// # Errors
    ///
    /// - [`RpcError::PayloadTooLarge`] if the envelope exceeds the limit
    /// - [`RpcError::Decode`] for malformed envelopes or data that does not
    ///   fit the handler's parameter type
    /// - [`RpcError::FunctionNotFound`] if nothing is bound to the key
    /// - [`RpcError::Handler`] when the handler returns an error
    pub async fn dispatch(&self, ctx: Context, envelope: &[u8]) -> Result<Bytes> {
        let limit = self.config.max_envelope_size;
        if envelope.len() > limit {
            tracing::warn!(size = envelope.len(), limit, "envelope too large");
            return Err(RpcError::PayloadTooLarge {
                size: envelope.len(),
                limit,
            });
        }

        let (func_key, data) = Envelope::decode(envelope)?.into_parts();

        // Clone the descriptor out so the read guard is gone before awaiting.
        let Some(descriptor) = self.get(&func_key) else {
            tracing::warn!(func_key = %func_key, "function not found");
            return Err(RpcError::FunctionNotFound);
        };

        tracing::debug!(
            func_key = %func_key,
            request_id = ctx.request_id().unwrap_or_default(),
            "dispatching"
        );

        let ctx = ctx.with_func_key(&func_key);
        (descriptor.call)(ctx, data).await
    }

    /// Dispatch and render the outcome the way a hosting runtime reports it.
    ///
    /// Success becomes a completed response carrying the result bytes. Any
    /// error becomes an [`ErrorPayload`] with the unhandled flag set.
    ///
    /// # Errors
    ///
    /// Only if the error payload itself cannot be encoded.
    pub async fn respond(&self, ctx: Context, envelope: &[u8]) -> Result<TransportResponse> {
        match self.dispatch(ctx, envelope).await {
            Ok(body) => Ok(TransportResponse::completed(body)),
            Err(err) => {
                tracing::debug!(error_type = %err.identity(), error = %err, "call failed");
                let payload = ErrorPayload::from_error(&err).encode()?;
                Ok(TransportResponse::unhandled(payload))
            }
        }
    }
}

impl Default for Mux {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Mux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mux")
            .field("func_keys", &self.func_keys())
            .field("config", &self.config)
            .finish()
    }
}
