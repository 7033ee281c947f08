//! Invoker builder and reply interpretation.
//!
//! The [`InvokerBuilder`] configures the error registry and limits, the
//! [`Invoker`] drives one transport exchange per call, and the [`Reply`]
//! turns the raw outcome into a value or an error:
//! 1. Encode the input into an envelope
//! 2. Send it through the transport
//! 3. Keep the body and the unhandled flag (or the transport error)
//! 4. On demand, decode the body or recover the remote error
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use funcwire::{Context, ErrorRegistry, HandlerError, Invoker, Loopback, Mux};
//!
//! #[derive(Debug, Clone, PartialEq, thiserror::Error)]
//! #[error("negative input")]
//! struct Negative;
//!
//! # async fn run() -> funcwire::Result<()> {
//! let mux = Arc::new(Mux::new());
//! mux.register("Math_Sqrt", |n: f64| async move {
//!     if n < 0.0 {
//!         return Err(HandlerError::new(Negative));
//!     }
//!     Ok(n.sqrt())
//! })?;
//!
//! let mut errors = ErrorRegistry::new();
//! errors.register(Negative);
//!
//! let invoker = Invoker::builder(Loopback::new(mux)).errors(errors).build();
//! let ctx = Context::new();
//!
//! let root: f64 = invoker.invoke(&ctx, "Math_Sqrt", &9.0).await.result()?;
//! assert_eq!(root, 3.0);
//!
//! let err = invoker.invoke(&ctx, "Math_Sqrt", &-1.0).await.discard().unwrap_err();
//! assert_eq!(err.downcast_ref::<Negative>(), Some(&Negative));
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::JsonCodec;
use crate::context::Context;
use crate::envelope::Envelope;
use crate::error::{Result, RpcError};
use crate::remote::{ErrorPayload, ErrorRegistry, FromErrorPayload};
use crate::transport::Transport;

/// Default request size limit (6 MiB).
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 6 * 1024 * 1024;

/// Invoker configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvokerConfig {
    /// Largest encoded envelope the invoker sends, in bytes.
    pub max_request_size: usize,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
        }
    }
}

/// Builder for configuring and creating an [`Invoker`].
pub struct InvokerBuilder {
    transport: Arc<dyn Transport>,
    errors: Arc<ErrorRegistry>,
    config: InvokerConfig,
}

impl InvokerBuilder {
    /// Create a builder around a transport.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            errors: Arc::new(ErrorRegistry::new()),
            config: InvokerConfig::default(),
        }
    }

    /// Set the registry used to recover remote errors.
    ///
    /// Accepts an owned registry or one already shared by `Arc`.
    pub fn errors(mut self, errors: impl Into<Arc<ErrorRegistry>>) -> Self {
        self.errors = errors.into();
        self
    }

    /// Set the request size limit.
    ///
    /// Default: 6 MiB
    pub fn max_request_size(mut self, size: usize) -> Self {
        self.config.max_request_size = size;
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: InvokerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the invoker.
    pub fn build(self) -> Invoker {
        Invoker {
            transport: self.transport,
            errors: self.errors,
            config: self.config,
        }
    }
}

/// Client side of a function call.
///
/// Cheap to clone; clones share the transport and the error registry.
#[derive(Clone)]
pub struct Invoker {
    transport: Arc<dyn Transport>,
    errors: Arc<ErrorRegistry>,
    config: InvokerConfig,
}

impl Invoker {
    /// Create a builder around a transport.
    pub fn builder(transport: impl Transport + 'static) -> InvokerBuilder {
        InvokerBuilder::new(transport)
    }

    /// Create an invoker with the default registry and configuration.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::builder(transport).build()
    }

    /// The transport calls go through.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// The registry remote errors are recovered with.
    pub fn errors(&self) -> &Arc<ErrorRegistry> {
        &self.errors
    }

    /// Current configuration.
    pub fn config(&self) -> &InvokerConfig {
        &self.config
    }

    /// Handle bound to one function key.
    pub fn func(&self, func_key: impl Into<String>) -> Func<'_> {
        Func {
            invoker: self,
            func_key: func_key.into(),
        }
    }

    /// Call `func_key` with `input` as its data.
    ///
    /// Never fails by itself; every failure is carried by the [`Reply`].
    pub async fn invoke<I>(&self, ctx: &Context, func_key: &str, input: &I) -> Reply
    where
        I: Serialize + ?Sized + Sync,
    {
        let envelope = Envelope::with_value(func_key, input);
        self.send(ctx, func_key, envelope).await
    }

    /// Call `func_key` without any data.
    pub async fn invoke_empty(&self, ctx: &Context, func_key: &str) -> Reply {
        let envelope = Envelope::without_data(func_key);
        self.send(ctx, func_key, envelope).await
    }

    async fn send(&self, ctx: &Context, func_key: &str, envelope: Result<Envelope>) -> Reply {
        let payload = match envelope.and_then(|e| e.encode()) {
            Ok(payload) => payload,
            Err(e) => return self.reply(func_key, Outcome::Failed(e)),
        };

        let limit = self.config.max_request_size;
        if payload.len() > limit {
            tracing::warn!(func_key = %func_key, size = payload.len(), limit, "request too large");
            let err = RpcError::PayloadTooLarge {
                size: payload.len(),
                limit,
            };
            return self.reply(func_key, Outcome::Failed(err));
        }

        tracing::debug!(func_key = %func_key, size = payload.len(), "invoking");

        let outcome = match self.transport.invoke(ctx, payload).await {
            Ok(resp) if resp.unhandled => Outcome::Unhandled(resp.payload),
            Ok(resp) => Outcome::Completed(resp.payload),
            Err(e) => {
                tracing::debug!(func_key = %func_key, error = %e, "transport failed");
                Outcome::Failed(e)
            }
        };
        self.reply(func_key, outcome)
    }

    fn reply(&self, func_key: &str, outcome: Outcome) -> Reply {
        Reply {
            func_key: func_key.to_owned(),
            outcome,
            errors: Arc::clone(&self.errors),
        }
    }
}

impl fmt::Debug for Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invoker")
            .field("errors", &self.errors)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// An [`Invoker`] bound to one function key.
#[derive(Debug, Clone)]
pub struct Func<'a> {
    invoker: &'a Invoker,
    func_key: String,
}

impl Func<'_> {
    /// The bound key.
    pub fn func_key(&self) -> &str {
        &self.func_key
    }

    /// Call the bound function with `input` as its data.
    pub async fn invoke<I>(&self, ctx: &Context, input: &I) -> Reply
    where
        I: Serialize + ?Sized + Sync,
    {
        self.invoker.invoke(ctx, &self.func_key, input).await
    }

    /// Call the bound function without any data.
    pub async fn invoke_empty(&self, ctx: &Context) -> Reply {
        self.invoker.invoke_empty(ctx, &self.func_key).await
    }
}

#[derive(Debug)]
enum Outcome {
    /// The remote function returned normally.
    Completed(Bytes),
    /// The remote runtime flagged the call as failed.
    Unhandled(Bytes),
    /// The call never produced a response.
    Failed(RpcError),
}

/// Outcome of one call, interpreted on demand.
#[must_use = "a reply carries the call's error, if any"]
pub struct Reply {
    func_key: String,
    outcome: Outcome,
    errors: Arc<ErrorRegistry>,
}

impl Reply {
    /// Key the call was made to.
    pub fn func_key(&self) -> &str {
        &self.func_key
    }

    /// True if the remote runtime reported an unhandled failure.
    pub fn is_unhandled(&self) -> bool {
        matches!(self.outcome, Outcome::Unhandled(_))
    }

    /// Raw response body and the error, if any, without recovery.
    ///
    /// An unhandled failure yields its body untouched (usually an encoded
    /// [`ErrorPayload`]) with [`RpcError::Unhandled`]. A call that never
    /// produced a response yields empty bytes and its error unchanged.
    pub fn into_raw(self) -> (Bytes, Option<RpcError>) {
        match self.outcome {
            Outcome::Completed(body) => (body, None),
            Outcome::Unhandled(body) => (body, Some(RpcError::Unhandled)),
            Outcome::Failed(e) => (Bytes::new(), Some(e)),
        }
    }

    /// Decode the result into `T`.
    ///
    /// An empty body decodes as JSON `null`, so `()` and `Option<_>` accept
    /// calls to handlers that return no data.
    ///
    /// # Errors
    ///
    /// - the recovered remote error for unhandled failures
    /// - the transport error, unchanged
    /// - [`RpcError::Decode`] if the body does not fit `T`
    pub fn result<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.into_body(ErrorRegistry::recover)?;
        JsonCodec::decode_body(&body)
    }

    /// Like [`result`](Self::result), but a remote error whose identity is
    /// `E`'s is rebuilt as `E` before the registry is consulted.
    pub fn result_as<T, E>(self) -> Result<T>
    where
        T: DeserializeOwned,
        E: FromErrorPayload,
    {
        let body = self.into_body(ErrorRegistry::recover_as::<E>)?;
        JsonCodec::decode_body(&body)
    }

    /// Ignore any result data and only report the error.
    pub fn discard(self) -> Result<()> {
        self.into_body(ErrorRegistry::recover).map(drop)
    }

    fn into_body<F>(self, recover: F) -> Result<Bytes>
    where
        F: FnOnce(&ErrorRegistry, ErrorPayload) -> RpcError,
    {
        match self.outcome {
            Outcome::Completed(body) => Ok(body),
            Outcome::Failed(e) => Err(e),
            Outcome::Unhandled(body) if body.is_empty() => Err(RpcError::Unhandled),
            Outcome::Unhandled(body) => {
                let payload = ErrorPayload::decode(&body)?;
                tracing::debug!(
                    func_key = %self.func_key,
                    error_type = %payload.error_type,
                    "remote call failed"
                );
                Err(recover(&self.errors, payload))
            }
        }
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply")
            .field("func_key", &self.func_key)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mux::BoxFuture;
    use crate::transport::TransportResponse;

    /// Transport answering every call with one canned response.
    struct Canned(std::result::Result<TransportResponse, &'static str>);

    impl Transport for Canned {
        fn invoke<'a>(
            &'a self,
            _ctx: &'a Context,
            _payload: Bytes,
        ) -> BoxFuture<'a, Result<TransportResponse>> {
            let resp = self.0.clone().map_err(RpcError::transport);
            Box::pin(async move { resp })
        }
    }

    fn completed(body: &'static [u8]) -> Canned {
        Canned(Ok(TransportResponse::completed(Bytes::from_static(body))))
    }

    fn unhandled(body: &'static [u8]) -> Canned {
        Canned(Ok(TransportResponse::unhandled(Bytes::from_static(body))))
    }

    #[derive(Debug, Clone, PartialEq, thiserror::Error)]
    #[error("timed out")]
    struct Timeout;

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("retry in {0}s")]
    struct RetryLater(u64);

    impl FromErrorPayload for RetryLater {
        fn from_error_payload(payload: &ErrorPayload) -> Option<Self> {
            let secs = payload.error_message.strip_prefix("retry in ")?.strip_suffix('s')?;
            secs.parse().ok().map(Self)
        }
    }

    #[tokio::test]
    async fn test_result_decodes_body() {
        let invoker = Invoker::new(completed(br#""10""#));
        let out: String = invoker
            .invoke(&Context::new(), "Foo_Bar", &5)
            .await
            .result()
            .unwrap();
        assert_eq!(out, "10");
    }

    #[tokio::test]
    async fn test_empty_body_reads_null() {
        let invoker = Invoker::new(completed(b""));
        let reply = invoker.invoke_empty(&Context::new(), "Svc_Op").await;
        let out: Option<u32> = reply.result().unwrap();
        assert_eq!(out, None);

        let reply = invoker.invoke_empty(&Context::new(), "Svc_Op").await;
        assert!(reply.discard().is_ok());
    }

    #[tokio::test]
    async fn test_result_decode_error() {
        let invoker = Invoker::new(completed(br#""ten""#));
        let err = invoker
            .invoke(&Context::new(), "Foo_Bar", &5)
            .await
            .result::<u32>()
            .unwrap_err();
        assert!(matches!(err, RpcError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unhandled_registered_identity() {
        let mut errors = ErrorRegistry::new();
        errors.register_as("timeoutError", Timeout);
        let invoker = Invoker::builder(unhandled(
            br#"{"errorType":"timeoutError","errorMessage":"boom"}"#,
        ))
        .errors(errors)
        .build();

        let reply = invoker.invoke(&Context::new(), "Slow_Op", &()).await;
        assert!(reply.is_unhandled());
        let err = reply.discard().unwrap_err();
        assert_eq!(err.downcast_ref::<Timeout>(), Some(&Timeout));
    }

    #[tokio::test]
    async fn test_unhandled_unknown_identity() {
        let invoker = Invoker::new(unhandled(br#"{"errorType":"Mystery","errorMessage":"??"}"#));
        let err = invoker
            .invoke(&Context::new(), "Svc_Op", &1)
            .await
            .discard()
            .unwrap_err();
        assert_eq!(err.error_payload(), Some(&ErrorPayload::new("Mystery", "??")));
    }

    #[tokio::test]
    async fn test_into_raw_keeps_unhandled_body() {
        let body = br#"{"errorType":"timeoutError","errorMessage":"boom"}"#;
        let mut errors = ErrorRegistry::new();
        errors.register_as("timeoutError", Timeout);
        let invoker = Invoker::builder(unhandled(body)).errors(errors).build();

        let (raw, err) = invoker
            .invoke(&Context::new(), "Slow_Op", &())
            .await
            .into_raw();
        assert_eq!(&raw[..], &body[..]);
        assert!(matches!(err, Some(RpcError::Unhandled)));
    }

    #[tokio::test]
    async fn test_into_raw_garbled_body_is_unhandled() {
        let invoker = Invoker::new(unhandled(b"<html>"));
        let (raw, err) = invoker
            .invoke(&Context::new(), "Svc_Op", &1)
            .await
            .into_raw();
        assert_eq!(&raw[..], b"<html>");
        assert!(matches!(err, Some(RpcError::Unhandled)));
    }

    #[tokio::test]
    async fn test_into_raw_transport_error_unchanged() {
        let invoker = Invoker::new(Canned(Err("connection reset")));
        let (raw, err) = invoker
            .invoke(&Context::new(), "Svc_Op", &1)
            .await
            .into_raw();
        assert!(raw.is_empty());
        assert!(matches!(err, Some(RpcError::Transport(_))));
    }

    #[tokio::test]
    async fn test_unhandled_without_body() {
        let invoker = Invoker::new(unhandled(b""));
        let err = invoker
            .invoke(&Context::new(), "Svc_Op", &1)
            .await
            .discard()
            .unwrap_err();
        assert!(matches!(err, RpcError::Unhandled));
    }

    #[tokio::test]
    async fn test_unhandled_garbled_body() {
        let invoker = Invoker::new(unhandled(b"<html>"));
        let err = invoker
            .invoke(&Context::new(), "Svc_Op", &1)
            .await
            .discard()
            .unwrap_err();
        assert!(matches!(err, RpcError::Decode(_)));
    }

    #[tokio::test]
    async fn test_result_as_rebuilds_target() {
        let invoker = Invoker::new(unhandled(
            br#"{"errorType":"RetryLater","errorMessage":"retry in 30s"}"#,
        ));
        let err = invoker
            .invoke(&Context::new(), "Svc_Op", &1)
            .await
            .result_as::<u32, RetryLater>()
            .unwrap_err();
        assert_eq!(err.downcast_ref::<RetryLater>(), Some(&RetryLater(30)));
        assert_eq!(err.identity(), "RetryLater");
    }

    #[tokio::test]
    async fn test_transport_error_passthrough() {
        let invoker = Invoker::new(Canned(Err("connection reset")));
        let err = invoker
            .invoke(&Context::new(), "Svc_Op", &1)
            .await
            .result::<u32>()
            .unwrap_err();
        assert_eq!(err.to_string(), "transport error: connection reset");
    }

    #[tokio::test]
    async fn test_encode_error_skips_transport() {
        use std::collections::BTreeMap;
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct Counting(AtomicUsize);

        impl Transport for Counting {
            fn invoke<'a>(
                &'a self,
                _ctx: &'a Context,
                _payload: Bytes,
            ) -> BoxFuture<'a, Result<TransportResponse>> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Box::pin(async { Ok(TransportResponse::completed(Bytes::new())) })
            }
        }

        let transport = Arc::new(Counting(AtomicUsize::new(0)));
        let invoker = Invoker::new(Arc::clone(&transport));

        let mut input = BTreeMap::new();
        input.insert(vec![1u8], "not a string key");
        let err = invoker
            .invoke(&Context::new(), "Svc_Op", &input)
            .await
            .discard()
            .unwrap_err();
        assert!(matches!(err, RpcError::Encode(_)));
        assert_eq!(transport.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_request_too_large() {
        let invoker = Invoker::builder(completed(b"1")).max_request_size(8).build();
        let err = invoker
            .invoke(&Context::new(), "Svc_Op", "a string well over eight bytes")
            .await
            .discard()
            .unwrap_err();
        assert!(matches!(err, RpcError::PayloadTooLarge { limit: 8, .. }));
    }

    #[tokio::test]
    async fn test_empty_func_key() {
        let invoker = Invoker::new(completed(b"1"));
        let err = invoker
            .invoke(&Context::new(), "", &1)
            .await
            .discard()
            .unwrap_err();
        assert!(matches!(err, RpcError::EmptyFuncKey));
    }

    #[tokio::test]
    async fn test_func_handle() {
        let invoker = Invoker::new(completed(b"3"));
        let func = invoker.func("Math_Add");
        assert_eq!(func.func_key(), "Math_Add");

        let reply = func.invoke(&Context::new(), &[1, 2]).await;
        assert_eq!(reply.func_key(), "Math_Add");
        assert_eq!(reply.result::<i32>().unwrap(), 3);
    }

    #[test]
    fn test_builder_defaults() {
        let invoker = Invoker::new(completed(b""));
        assert_eq!(invoker.config().max_request_size, DEFAULT_MAX_REQUEST_SIZE);
        assert!(invoker.errors().contains("FunctionNotFound"));

        let shared = Arc::new(ErrorRegistry::empty());
        let invoker = Invoker::builder(completed(b"")).errors(Arc::clone(&shared)).build();
        assert!(Arc::ptr_eq(invoker.errors(), &shared));
    }
}
