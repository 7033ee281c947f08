//! Codec module - JSON serialization for envelopes and payloads.
//!
//! All wire data is JSON. The codec maps `serde_json` failures onto
//! [`RpcError::Encode`](crate::RpcError::Encode) and
//! [`RpcError::Decode`](crate::RpcError::Decode) so callers can tell which
//! side of a call broke.
//!
//! # Example
//!
//! ```
//! use funcwire::codec::JsonCodec;
//!
//! let encoded = JsonCodec::encode(&"hello").unwrap();
//! let decoded: String = JsonCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, "hello");
//! ```

mod json;

pub use json::JsonCodec;
