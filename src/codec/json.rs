//! JSON codec using `serde_json`.
//!
//! Call data travels as an embedded JSON value (`RawValue`) inside the
//! envelope, so the codec also converts to and from raw values.
//!
//! # Absent data
//!
//! A missing `data` field and an empty response body both read as JSON
//! `null`. That lets `Option<T>` and `()` inputs accept "no data", while any
//! other type reports a decode error.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::value::RawValue;

use crate::error::{Result, RpcError};

const NULL: &str = "null";

/// JSON codec for structured data.
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a value to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Encode`] if the value cannot be serialized.
    #[inline]
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(RpcError::Encode)
    }

    /// Decode JSON bytes to a value.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Decode`] if the bytes cannot be deserialized to type T.
    #[inline]
    pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(RpcError::Decode)
    }

    /// Decode a response body, reading an empty body as `null`.
    #[inline]
    pub fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        if bytes.is_empty() {
            Self::decode(NULL.as_bytes())
        } else {
            Self::decode(bytes)
        }
    }

    /// Encode a value as an embedded raw JSON value.
    #[inline]
    pub fn to_raw<T: Serialize + ?Sized>(value: &T) -> Result<Box<RawValue>> {
        serde_json::value::to_raw_value(value).map_err(RpcError::Encode)
    }

    /// Decode an embedded raw value, reading absent data as `null`.
    #[inline]
    pub fn decode_raw<T: DeserializeOwned>(raw: Option<&RawValue>) -> Result<T> {
        serde_json::from_str(raw.map_or(NULL, RawValue::get)).map_err(RpcError::Decode)
    }
}
