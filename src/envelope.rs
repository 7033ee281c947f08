//! Payload envelope - the wire container shared by both call directions.
//!
//! ```text
//! {"funcKey": "Quotes_Lookup", "data": {"symbol": "ACME"}}
//! ```
//!
//! `data` is carried as an embedded JSON value, never as a JSON-encoded
//! string. A missing `data` key and an explicit `null` stay distinct
//! through encode/decode.
//!
//! # Example
//!
//! ```
//! use funcwire::Envelope;
//!
//! let envelope = Envelope::with_value("Math_Double", &21).unwrap();
//! let bytes = envelope.encode().unwrap();
//! assert_eq!(&bytes[..], br#"{"funcKey":"Math_Double","data":21}"#);
//!
//! let decoded = Envelope::decode(&bytes).unwrap();
//! assert_eq!(decoded.func_key(), "Math_Double");
//! assert_eq!(decoded.bind::<i32>().unwrap(), 21);
//! ```

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;

use crate::codec::JsonCodec;
use crate::error::{Result, RpcError};

/// Envelope wire format version: `data` embedded as a JSON value.
pub const ENVELOPE_FORMAT_VERSION: u32 = 1;

/// Wire container pairing a function key with opaque call data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    func_key: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    data: Option<Box<RawValue>>,
}

/// Keeps an explicit `null` as `Some`; only a missing key becomes `None`.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Box<RawValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

impl Envelope {
    /// Create an envelope from a key and optional raw data.
    pub fn new(func_key: impl Into<String>, data: Option<Box<RawValue>>) -> Result<Self> {
        let func_key = func_key.into();
        if func_key.is_empty() {
            return Err(RpcError::EmptyFuncKey);
        }
        Ok(Self { func_key, data })
    }

    /// Create an envelope carrying `value` serialized as JSON.
    pub fn with_value<T: Serialize + ?Sized>(func_key: impl Into<String>, value: &T) -> Result<Self> {
        let func_key = func_key.into();
        if func_key.is_empty() {
            return Err(RpcError::EmptyFuncKey);
        }
        let data = JsonCodec::to_raw(value)?;
        Ok(Self {
            func_key,
            data: Some(data),
        })
    }

    /// Create an envelope without any data.
    pub fn without_data(func_key: impl Into<String>) -> Result<Self> {
        Self::new(func_key, None)
    }

    /// The function key.
    #[inline]
    pub fn func_key(&self) -> &str {
        &self.func_key
    }

    /// The raw call data, if present.
    #[inline]
    pub fn data(&self) -> Option<&RawValue> {
        self.data.as_deref()
    }

    /// True when the `data` key is absent (as opposed to `null`).
    #[inline]
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Deserialize the call data into `T`. Absent data reads as `null`.
    pub fn bind<T: DeserializeOwned>(&self) -> Result<T> {
        JsonCodec::decode_raw(self.data())
    }

    /// Split into key and raw data.
    pub fn into_parts(self) -> (String, Option<Box<RawValue>>) {
        (self.func_key, self.data)
    }

    /// Encode to wire bytes.
    pub fn encode(&self) -> Result<Bytes> {
        JsonCodec::encode(self).map(Bytes::from)
    }

    /// Decode from wire bytes.
    ///
    /// # Errors
    ///
    /// [`RpcError::Decode`] for malformed JSON, [`RpcError::EmptyFuncKey`]
    /// for an empty key.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let envelope: Envelope = JsonCodec::decode(bytes)?;
        if envelope.func_key.is_empty() {
            return Err(RpcError::EmptyFuncKey);
        }
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_wire_shape() {
        let envelope = Envelope::with_value("Quotes_Lookup", &serde_json::json!({"symbol": "ACME"})).unwrap();
        let bytes = envelope.encode().unwrap();
        assert_eq!(
            &bytes[..],
            br#"{"funcKey":"Quotes_Lookup","data":{"symbol":"ACME"}}"#
        );
    }

    #[test]
    fn test_absent_data_omits_key() {
        let envelope = Envelope::without_data("Health_Ping").unwrap();
        let bytes = envelope.encode().unwrap();
        assert_eq!(&bytes[..], br#"{"funcKey":"Health_Ping"}"#);

        let decoded = Envelope::decode(&bytes).unwrap();
        assert!(!decoded.has_data());
    }

    #[test]
    fn test_explicit_null_is_not_absent() {
        let decoded = Envelope::decode(br#"{"funcKey":"Health_Ping","data":null}"#).unwrap();
        assert!(decoded.has_data());
        assert_eq!(decoded.data().unwrap().get(), "null");

        let bytes = decoded.encode().unwrap();
        assert_eq!(&bytes[..], br#"{"funcKey":"Health_Ping","data":null}"#);
    }

    #[test]
    fn test_decode_preserves_raw_data_text() {
        let wire = br#"{"funcKey":"Svc_Op","data":{"b":1,"a":[true,null]}}"#;
        let decoded = Envelope::decode(wire).unwrap();
        assert_eq!(decoded.func_key(), "Svc_Op");
        assert_eq!(decoded.data().unwrap().get(), r#"{"b":1,"a":[true,null]}"#);
        assert_eq!(&decoded.encode().unwrap()[..], &wire[..]);
    }

    #[test]
    fn test_empty_func_key_rejected() {
        assert!(matches!(Envelope::without_data(""), Err(RpcError::EmptyFuncKey)));
        assert!(matches!(
            Envelope::with_value("", &1),
            Err(RpcError::EmptyFuncKey)
        ));
        assert!(matches!(
            Envelope::decode(br#"{"funcKey":"","data":1}"#),
            Err(RpcError::EmptyFuncKey)
        ));
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(Envelope::decode(b"{"), Err(RpcError::Decode(_))));
        assert!(matches!(
            Envelope::decode(br#"{"data":1}"#),
            Err(RpcError::Decode(_))
        ));
    }

    #[test]
    fn test_bind_typed_data() {
        let envelope = Envelope::with_value("Math_Sum", &[1, 2, 3]).unwrap();
        let values: Vec<u8> = envelope.bind().unwrap();
        assert_eq!(values, vec![1, 2, 3]);

        let err = envelope.bind::<String>().unwrap_err();
        assert!(matches!(err, RpcError::Decode(_)));
    }
}
