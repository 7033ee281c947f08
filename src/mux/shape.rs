//! Handler shapes - how parameters and return values are classified.
//!
//! | Parameters            | `InputShape`     |
//! |-----------------------|------------------|
//! | none                  | `None`           |
//! | `Context`             | `ContextOnly`    |
//! | `T`                   | `DataOnly`       |
//! | `Context, T`          | `ContextAndData` |
//!
//! | Return type           | `OutputShape`    |
//! |-----------------------|------------------|
//! | `()`                  | `None`           |
//! | `Result<(), E>`       | `ErrorOnly`      |
//! | `Data<T>`             | `DataOnly`       |
//! | `Result<T, E>`        | `DataAndError`   |
//!
//! `T` is any serde type; `E` is anything that converts into
//! [`HandlerError`].

use std::any::TypeId;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::codec::JsonCodec;
use crate::context::Context;
use crate::error::{Result, RpcError};
use crate::remote::HandlerError;

/// What a handler takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputShape {
    /// No parameters.
    None,
    /// Only the invocation context.
    ContextOnly,
    /// Only the call data.
    DataOnly,
    /// Context first, then data.
    ContextAndData,
}

/// What a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputShape {
    /// Nothing.
    None,
    /// Success or a declared error, no data.
    ErrorOnly,
    /// Data, never an error.
    DataOnly,
    /// Data or a declared error.
    DataAndError,
}

/// Role a single parameter plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// The invocation [`Context`].
    Context,
    /// Deserialized call data.
    Data,
}

/// Classified signature stored in a handler descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// Parameter shape.
    pub input: InputShape,
    /// Return shape.
    pub output: OutputShape,
    /// Concrete parameter types, in order.
    pub input_types: [Option<&'static str>; 2],
    /// Concrete return type.
    pub output_type: &'static str,
}

impl Signature {
    /// Type the call data is deserialized into, if the handler takes data.
    pub fn data_type(&self) -> Option<&'static str> {
        match self.input {
            InputShape::DataOnly => self.input_types[0],
            InputShape::ContextAndData => self.input_types[1],
            InputShape::None | InputShape::ContextOnly => None,
        }
    }
}

/// Classify a parameter list.
///
/// # Errors
///
/// Returns the violated rule when the list is outside the supported shapes.
pub fn classify_inputs(params: &[ParamKind]) -> std::result::Result<InputShape, &'static str> {
    match params {
        [] => Ok(InputShape::None),
        [ParamKind::Context] => Ok(InputShape::ContextOnly),
        [ParamKind::Data] => Ok(InputShape::DataOnly),
        [ParamKind::Context, _] => Ok(InputShape::ContextAndData),
        [ParamKind::Data, _] => Err("with two parameters the first must be the invocation context"),
        _ => Err("handlers take at most two parameters"),
    }
}

/// A handler parameter.
///
/// Implemented for [`Context`] and for every `DeserializeOwned` type.
pub trait Param: Sized + Send + 'static {
    /// Role of this parameter.
    const KIND: ParamKind;

    /// Produce the argument for one call.
    fn extract(ctx: &Context, data: Option<&RawValue>) -> Result<Self>;
}

impl Param for Context {
    const KIND: ParamKind = ParamKind::Context;

    fn extract(ctx: &Context, _data: Option<&RawValue>) -> Result<Self> {
        Ok(ctx.clone())
    }
}

impl<T> Param for T
where
    T: DeserializeOwned + Send + 'static,
{
    const KIND: ParamKind = ParamKind::Data;

    fn extract(_ctx: &Context, data: Option<&RawValue>) -> Result<Self> {
        JsonCodec::decode_raw(data)
    }
}

/// Marks a handler result as plain data (`OutputShape::DataOnly`).
///
/// Also usable as a parameter; it deserializes transparently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Data<T>(pub T);

impl<T> Data<T> {
    /// Unwrap the value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// A handler return value.
pub trait IntoReply: Send + 'static {
    /// Shape of this return type.
    fn shape() -> OutputShape;

    /// Encode the value. Empty bytes mean "no data".
    fn into_reply(self) -> Result<Bytes>;
}

impl IntoReply for () {
    fn shape() -> OutputShape {
        OutputShape::None
    }

    fn into_reply(self) -> Result<Bytes> {
        Ok(Bytes::new())
    }
}

impl<T> IntoReply for Data<T>
where
    T: Serialize + Send + 'static,
{
    fn shape() -> OutputShape {
        OutputShape::DataOnly
    }

    fn into_reply(self) -> Result<Bytes> {
        JsonCodec::encode(&self.0).map(Bytes::from)
    }
}

impl<T, E> IntoReply for std::result::Result<T, E>
where
    T: Serialize + Send + 'static,
    E: Into<HandlerError> + Send + 'static,
{
    fn shape() -> OutputShape {
        if TypeId::of::<T>() == TypeId::of::<()>() {
            OutputShape::ErrorOnly
        } else {
            OutputShape::DataAndError
        }
    }

    fn into_reply(self) -> Result<Bytes> {
        match self {
            Err(e) => Err(RpcError::Handler(e.into())),
            Ok(_) if Self::shape() == OutputShape::ErrorOnly => Ok(Bytes::new()),
            Ok(value) => JsonCodec::encode(&value).map(Bytes::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("nope")]
    struct Nope;

    #[test]
    fn test_classify_inputs() {
        use ParamKind as K;

        assert_eq!(classify_inputs(&[]), Ok(InputShape::None));
        assert_eq!(classify_inputs(&[K::Context]), Ok(InputShape::ContextOnly));
        assert_eq!(classify_inputs(&[K::Data]), Ok(InputShape::DataOnly));
        assert_eq!(classify_inputs(&[K::Context, K::Data]), Ok(InputShape::ContextAndData));
        assert_eq!(classify_inputs(&[K::Context, K::Context]), Ok(InputShape::ContextAndData));
        assert!(classify_inputs(&[K::Data, K::Context]).is_err());
        assert!(classify_inputs(&[K::Data, K::Data]).is_err());
        assert!(classify_inputs(&[K::Context, K::Data, K::Data]).is_err());
    }

    #[test]
    fn test_param_kinds() {
        assert_eq!(<Context as Param>::KIND, ParamKind::Context);
        assert_eq!(<i64 as Param>::KIND, ParamKind::Data);
        assert_eq!(<Data<String> as Param>::KIND, ParamKind::Data);
        assert_eq!(<Option<Vec<u8>> as Param>::KIND, ParamKind::Data);
    }

    #[test]
    fn test_output_shapes() {
        assert_eq!(<() as IntoReply>::shape(), OutputShape::None);
        assert_eq!(<Data<i32> as IntoReply>::shape(), OutputShape::DataOnly);
        assert_eq!(
            <std::result::Result<(), Nope> as IntoReply>::shape(),
            OutputShape::ErrorOnly
        );
        assert_eq!(
            <std::result::Result<String, HandlerError> as IntoReply>::shape(),
            OutputShape::DataAndError
        );
    }

    #[test]
    fn test_error_takes_precedence() {
        let reply: std::result::Result<String, Nope> = Err(Nope);
        let err = reply.into_reply().unwrap_err();
        assert_eq!(err.identity(), "Nope");
    }

    #[test]
    fn test_error_only_success_has_no_data() {
        let reply: std::result::Result<(), Nope> = Ok(());
        assert!(reply.into_reply().unwrap().is_empty());
    }

    #[test]
    fn test_data_reply_encodes() {
        assert_eq!(&Data("10").into_reply().unwrap()[..], br#""10""#);
        let reply: std::result::Result<u8, Nope> = Ok(7);
        assert_eq!(&reply.into_reply().unwrap()[..], b"7");
    }

    #[test]
    fn test_extract_data_and_context() {
        let ctx = Context::new().with_request_id("r");
        let raw = JsonCodec::to_raw(&5).unwrap();

        let n = <i64 as Param>::extract(&ctx, Some(&raw)).unwrap();
        assert_eq!(n, 5);

        let c = <Context as Param>::extract(&ctx, Some(&raw)).unwrap();
        assert_eq!(c.request_id(), Some("r"));

        let err = <String as Param>::extract(&ctx, Some(&raw)).unwrap_err();
        assert!(matches!(err, RpcError::Decode(_)));
    }

    #[test]
    fn test_signature_data_type() {
        let sig = Signature {
            input: InputShape::ContextAndData,
            output: OutputShape::None,
            input_types: [Some("Context"), Some("i64")],
            output_type: "()",
        };
        assert_eq!(sig.data_type(), Some("i64"));
    }
}
