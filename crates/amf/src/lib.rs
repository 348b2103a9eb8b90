//! A pure-rust implementation of AMF0 and AMF3 encoders and decoders.
//!
//! Values are modelled by [`AmfValue`] and written to or read from a
//! [`CursorBuffer`]. Each top-level value gets its own reference tables, so
//! repeated objects inside one value become back-references on the wire.
//!
//! # Examples
//!
//! ```rust
//! # fn test() -> Result<(), Box<dyn std::error::Error>> {
//! use amf::{Amf0Decoder, Amf0Encoder, AmfValue};
//! use bytes_util::CursorBuffer;
//!
//! let point = AmfValue::object([("x", AmfValue::Number(1.0))]);
//! let value = AmfValue::array([point.clone(), point]);
//!
//! // Encode a value into a buffer
//! let mut buffer = CursorBuffer::new();
//! Amf0Encoder::new().encode(&mut buffer, &value)?;
//!
//! // Decode it back
//! buffer.reset();
//! let decoded = Amf0Decoder::new(&mut buffer).decode()?;
//!
//! # assert_eq!(decoded, value);
//! # Ok(())
//! # }
//! # test().expect("test failed");
//! ```
//!
//! The free functions [`encode`] and [`decode`] cover the common case:
//!
//! ```rust
//! use amf::{decode, encode, AmfValue};
//! use bytes_util::ObjectEncoding;
//!
//! let bytes = encode(&AmfValue::Integer(100), ObjectEncoding::Amf3).unwrap();
//! assert_eq!(bytes.as_ref(), &[0x04, 0x64]);
//!
//! let (value, consumed) = decode(&bytes, ObjectEncoding::Amf3).unwrap();
//! assert_eq!(value, AmfValue::Integer(100));
//! assert_eq!(consumed, 2);
//! ```
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod amf0;
pub mod amf3;
mod buffer_ext;
mod config;
mod errors;
mod reference;
mod session;
#[cfg(test)]
mod test_utils;
mod value;

pub use bytes_util::{CursorBuffer, ObjectEncoding};

pub use crate::amf0::{Amf0Decoder, Amf0Encoder, Amf0Marker};
pub use crate::amf3::{Amf3Decoder, Amf3Encoder, Amf3Marker};
pub use crate::buffer_ext::{CursorBufferAmfExt, decode, decode_with_config, encode, encode_with_config};
pub use crate::config::{CodecConfig, CodecConfigBuilder, DEFAULT_MAX_DEPTH, DEFAULT_MAX_REFERENCES, ReferenceMode};
pub use crate::errors::{AmfReadError, AmfWriteError, ErrorKind, ReferenceTable};
pub use crate::value::{AmfDate, AmfDictionary, AmfMap, AmfObject, AmfValue};
