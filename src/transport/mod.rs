//! Transport module - the synchronous invoke boundary.
//!
//! A transport carries one encoded envelope to the remote function and
//! returns its response body plus a flag telling whether the remote
//! runtime reported an unhandled failure.
//!
//! Provides:
//! - [`Transport`] - implemented by whatever reaches the remote function
//! - [`Loopback`] - in-process transport over an [`Arc<Mux>`](crate::Mux)

mod loopback;

use std::sync::Arc;

use bytes::Bytes;

use crate::context::Context;
use crate::error::Result;
use crate::mux::BoxFuture;

pub use loopback::Loopback;

/// Response of one transport exchange.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportResponse {
    /// Response body.
    pub payload: Bytes,
    /// Set when the remote runtime reported an unhandled failure; the
    /// payload then holds an encoded `ErrorPayload`, or nothing.
    pub unhandled: bool,
}

impl TransportResponse {
    /// A completed call.
    pub fn completed(payload: Bytes) -> Self {
        Self {
            payload,
            unhandled: false,
        }
    }

    /// A call the remote runtime reported as failed.
    pub fn unhandled(payload: Bytes) -> Self {
        Self {
            payload,
            unhandled: true,
        }
    }
}

/// Synchronous request/response invoke.
///
/// Implementations perform exactly one exchange per call and never retry.
/// Failures to reach the function at all are reported as
/// [`RpcError::Transport`](crate::RpcError::Transport).
pub trait Transport: Send + Sync {
    /// Send `payload` and wait for the response.
    fn invoke<'a>(&'a self, ctx: &'a Context, payload: Bytes)
        -> BoxFuture<'a, Result<TransportResponse>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn invoke<'a>(
        &'a self,
        ctx: &'a Context,
        payload: Bytes,
    ) -> BoxFuture<'a, Result<TransportResponse>> {
        (**self).invoke(ctx, payload)
    }
}
