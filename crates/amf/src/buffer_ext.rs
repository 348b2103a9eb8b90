use bytes::Bytes;
use bytes_util::{BufferConfig, CursorBuffer, ObjectEncoding};

use crate::amf0::{Amf0Decoder, Amf0Encoder};
use crate::amf3::{Amf3Decoder, Amf3Encoder};
use crate::config::CodecConfig;
use crate::errors::{AmfReadError, AmfWriteError};
use crate::value::AmfValue;

/// Object level helpers on [`CursorBuffer`].
///
/// Both methods use the codec selected by
/// [`CursorBuffer::object_encoding`].
pub trait CursorBufferAmfExt {
    /// Encode `value` at the current position.
    fn write_object(&mut self, value: &AmfValue) -> Result<(), AmfWriteError>;

    /// Decode one value from the current position.
    fn read_object(&mut self) -> Result<AmfValue, AmfReadError>;
}

impl CursorBufferAmfExt for CursorBuffer {
    fn write_object(&mut self, value: &AmfValue) -> Result<(), AmfWriteError> {
        match self.object_encoding() {
            ObjectEncoding::Amf0 => Amf0Encoder::new().encode(self, value),
            ObjectEncoding::Amf3 => Amf3Encoder::new().encode(self, value),
        }
    }

    fn read_object(&mut self) -> Result<AmfValue, AmfReadError> {
        match self.object_encoding() {
            ObjectEncoding::Amf0 => Amf0Decoder::new(self).decode(),
            ObjectEncoding::Amf3 => Amf3Decoder::new(self).decode(),
        }
    }
}

/// Encode a single value.
pub fn encode(value: &AmfValue, format: ObjectEncoding) -> Result<Bytes, AmfWriteError> {
    encode_with_config(value, format, CodecConfig::default())
}

/// Encode a single value with explicit limits.
pub fn encode_with_config(
    value: &AmfValue,
    format: ObjectEncoding,
    config: CodecConfig,
) -> Result<Bytes, AmfWriteError> {
    let mut buffer = CursorBuffer::with_config(BufferConfig::builder().object_encoding(format).build());
    match format {
        ObjectEncoding::Amf0 => Amf0Encoder::with_config(config).encode(&mut buffer, value)?,
        ObjectEncoding::Amf3 => Amf3Encoder::with_config(config).encode(&mut buffer, value)?,
    }
    Ok(buffer.to_bytes())
}

/// Decode the first value of `bytes`. Returns the value and the number of
/// bytes it took.
pub fn decode(bytes: &[u8], format: ObjectEncoding) -> Result<(AmfValue, usize), AmfReadError> {
    decode_with_config(bytes, format, CodecConfig::default())
}

/// Decode the first value of `bytes` with explicit limits.
pub fn decode_with_config(
    bytes: &[u8],
    format: ObjectEncoding,
    config: CodecConfig,
) -> Result<(AmfValue, usize), AmfReadError> {
    let mut buffer = CursorBuffer::from_slice(bytes);
    let value = match format {
        ObjectEncoding::Amf0 => Amf0Decoder::with_config(&mut buffer, config).decode()?,
        ObjectEncoding::Amf3 => Amf3Decoder::with_config(&mut buffer, config).decode()?,
    };
    Ok((value, buffer.position()))
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_object_encoding_dispatch() {
        let value = AmfValue::Boolean(true);

        let mut buffer = CursorBuffer::new();
        buffer.write_object(&value).unwrap();
        assert_eq!(buffer.as_bytes(), &[0x03]);

        buffer.set_object_encoding(ObjectEncoding::Amf0);
        buffer.write_object(&value).unwrap();
        assert_eq!(buffer.as_bytes(), &[0x03, 0x01, 0x01]);

        buffer.reset();
        buffer.set_object_encoding(ObjectEncoding::Amf3);
        assert_eq!(buffer.read_object().unwrap(), value);
        buffer.set_object_encoding(ObjectEncoding::Amf0);
        assert_eq!(buffer.read_object().unwrap(), value);
        assert_eq!(buffer.bytes_available(), 0);
    }

    #[test]
    fn test_decode_reports_consumed_bytes() {
        let (value, consumed) = decode(&[0x04, 0x64, 0xff], ObjectEncoding::Amf3).unwrap();
        assert_eq!(value, AmfValue::Integer(100));
        assert_eq!(consumed, 2);
    }

    #[test]
    fn test_encode() {
        let bytes = encode(&AmfValue::Integer(100), ObjectEncoding::Amf3).unwrap();
        assert_eq!(bytes.as_ref(), &[0x04, 0x64]);

        let bytes = encode(&AmfValue::Integer(100), ObjectEncoding::Amf0).unwrap();
        assert_eq!(bytes[0], 0x00);
        assert_eq!(bytes.len(), 9);
    }
}
