//! Byte buffer utilities shared by the AMF codecs.
//!
//! The central type is [`CursorBuffer`], a byte buffer with a read/write
//! position, a configurable byte order and bounds-checked accessors for every
//! integer width from 8 to 64 bits plus IEEE-754 floats. Floats go through a
//! portable packer ([`ieee754`]) rather than the host conversion.
//!
//! ```rust
//! # fn test() -> Result<(), bytes_util::CursorError> {
//! use bytes_util::CursorBuffer;
//!
//! let mut buffer = CursorBuffer::new();
//! buffer.write_utf("hello")?;
//! buffer.write_f64(42.5)?;
//!
//! buffer.reset();
//! assert_eq!(buffer.read_utf()?, "hello");
//! assert_eq!(buffer.read_f64()?, 42.5);
//! assert_eq!(buffer.bytes_available(), 0);
//! # Ok(())
//! # }
//! # test().expect("test failed");
//! ```
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or [Apache-2.0](./LICENSE.Apache-2.0) license.
//! You can choose between one of them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

#[cfg(feature = "compression")]
mod compression;
mod config;
mod cursor_buffer;
mod errors;
pub mod ieee754;
mod range_check;

#[cfg(feature = "compression")]
pub use compression::{CompressionAlgorithm, Compressor, compress, decompress};
pub use config::{BufferConfig, BufferConfigBuilder, DEFAULT_CAPACITY, Endianness, ObjectEncoding};
pub use cursor_buffer::{Charset, CursorBuffer};
pub use errors::CursorError;
