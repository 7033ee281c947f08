//! Handler trait - adapts async functions of any supported shape to one
//! uniform, type-erased call.
//!
//! Implemented for closures and `async fn`s taking zero, one or two
//! [`Param`]s and returning a future whose output is [`IntoReply`]. The
//! `Args` type parameter only exists to keep the arity impls apart.

use std::any::type_name;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use serde_json::value::RawValue;

use super::shape::{classify_inputs, IntoReply, Param, Signature};
use crate::context::Context;
use crate::error::Result;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Uniform call stored in the dispatch table.
pub type Trampoline =
    Box<dyn Fn(Context, Option<Box<RawValue>>) -> BoxFuture<'static, Result<Bytes>> + Send + Sync>;

/// Trait for handler functions.
pub trait Handler<Args>: Send + Sync + Sized + 'static {
    /// Classify this handler's parameters and return type.
    ///
    /// # Errors
    ///
    /// Returns the violated rule for unsupported shapes.
    fn signature() -> std::result::Result<Signature, &'static str>;

    /// Erase the concrete types behind a uniform call.
    fn into_trampoline(self) -> Trampoline;
}

impl<F, Fut, R> Handler<()> for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply,
{
    fn signature() -> std::result::Result<Signature, &'static str> {
        Ok(Signature {
            input: classify_inputs(&[])?,
            output: R::shape(),
            input_types: [None, None],
            output_type: type_name::<R>(),
        })
    }

    fn into_trampoline(self) -> Trampoline {
        let handler = self;
        Box::new(
            move |_ctx: Context, _data: Option<Box<RawValue>>| -> BoxFuture<'static, Result<Bytes>> {
                let fut = handler();
                Box::pin(async move { fut.await.into_reply() })
            },
        )
    }
}

impl<F, Fut, R, A> Handler<(A,)> for F
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply,
    A: Param,
{
    fn signature() -> std::result::Result<Signature, &'static str> {
        Ok(Signature {
            input: classify_inputs(&[A::KIND])?,
            output: R::shape(),
            input_types: [Some(type_name::<A>()), None],
            output_type: type_name::<R>(),
        })
    }

    fn into_trampoline(self) -> Trampoline {
        let handler = self;
        Box::new(
            move |ctx: Context, data: Option<Box<RawValue>>| -> BoxFuture<'static, Result<Bytes>> {
                let a = match A::extract(&ctx, data.as_deref()) {
                    Ok(a) => a,
                    Err(e) => return Box::pin(async move { Err(e) }),
                };
                let fut = handler(a);
                Box::pin(async move { fut.await.into_reply() })
            },
        )
    }
}

impl<F, Fut, R, A, B> Handler<(A, B)> for F
where
    F: Fn(A, B) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply,
    A: Param,
    B: Param,
{
    fn signature() -> std::result::Result<Signature, &'static str> {
        Ok(Signature {
            input: classify_inputs(&[A::KIND, B::KIND])?,
            output: R::shape(),
            input_types: [Some(type_name::<A>()), Some(type_name::<B>())],
            output_type: type_name::<R>(),
        })
    }

    fn into_trampoline(self) -> Trampoline {
        let handler = self;
        Box::new(
            move |ctx: Context, data: Option<Box<RawValue>>| -> BoxFuture<'static, Result<Bytes>> {
                let args = A::extract(&ctx, data.as_deref())
                    .and_then(|a| B::extract(&ctx, data.as_deref()).map(|b| (a, b)));
                let (a, b) = match args {
                    Ok(args) => args,
                    Err(e) => return Box::pin(async move { Err(e) }),
                };
                let fut = handler(a, b);
                Box::pin(async move { fut.await.into_reply() })
            },
        )
    }
}
