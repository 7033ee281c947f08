//! `HandlerError` - the error capability handlers return.

use std::borrow::Cow;
use std::fmt;

use super::identity::error_identity;
use crate::error::{BoxError, RpcError};

/// A handler's declared error, tagged with the identity it crosses the wire
/// under.
///
/// Any `std::error::Error + Send + Sync + 'static` converts into it with `?`
/// or `.into()`; the identity is the source type's bare name. Wrapping an
/// [`RpcError`] keeps that error's own identity, so a nested
/// `FunctionNotFound` still reads as `FunctionNotFound` on the caller's side.
///
/// Like `anyhow::Error`, this type does not implement `std::error::Error`
/// itself, which is what allows the blanket `From` conversion.
pub struct HandlerError {
    identity: Cow<'static, str>,
    inner: BoxError,
}

impl HandlerError {
    /// Wrap an error, deriving its identity from its type.
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::from(error)
    }

    /// Wrap an error under an explicit identity.
    pub fn with_identity<E>(identity: impl Into<Cow<'static, str>>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            identity: identity.into(),
            inner: Box::new(error),
        }
    }

    /// Wrap an already boxed error under an explicit identity.
    pub fn from_boxed(identity: impl Into<Cow<'static, str>>, error: BoxError) -> Self {
        Self {
            identity: identity.into(),
            inner: error,
        }
    }

    /// Identity carried in `errorType`.
    #[inline]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// True if the wrapped error is an `E`.
    pub fn is<E>(&self) -> bool
    where
        E: std::error::Error + 'static,
    {
        self.inner.is::<E>()
    }

    /// Borrow the wrapped error as `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        self.inner.downcast_ref::<E>()
    }

    /// Take the wrapped error back out as `E`.
    pub fn downcast<E>(self) -> Result<E, Self>
    where
        E: std::error::Error + 'static,
    {
        let identity = self.identity;
        match self.inner.downcast::<E>() {
            Ok(e) => Ok(*e),
            Err(inner) => Err(Self { identity, inner }),
        }
    }

    /// The wrapped error.
    pub fn get_ref(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.inner.as_ref()
    }

    /// Unwrap into the boxed error.
    pub fn into_inner(self) -> BoxError {
        self.inner
    }
}

impl<E> From<E> for HandlerError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        let identity = match (&error as &(dyn std::error::Error + 'static)).downcast_ref::<RpcError>() {
            Some(rpc) => Cow::Owned(rpc.identity().into_owned()),
            None => Cow::Borrowed(error_identity::<E>()),
        };
        Self {
            identity,
            inner: Box::new(error),
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerError")
            .field("identity", &self.identity)
            .field("inner", &self.inner)
            .finish()
    }
}
