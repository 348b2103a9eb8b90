use std::sync::Arc;

use bytes_util::{CursorBuffer, ObjectEncoding};
use num_traits::FromPrimitive;
use tracing::debug;

use super::define::{Amf0Marker, OBJECT_END};
use crate::amf3::Amf3Decoder;
use crate::config::CodecConfig;
use crate::errors::{AmfReadError, ReferenceTable};
use crate::reference::DecodeTable;
use crate::session::Checkpoint;
use crate::value::{AmfDate, AmfMap, AmfObject, AmfValue};

/// An AMF0 Decoder.
///
/// This decoder reads AMF0 data from the current position of a
/// [`CursorBuffer`]. Byte arrays and dictionaries embedded through the AVM+
/// marker are handed to an [`Amf3Decoder`].
pub struct Amf0Decoder<'a> {
    buffer: &'a mut CursorBuffer,
    config: CodecConfig,
    references: DecodeTable<AmfValue>,
    depth: usize,
}

impl<'a> Amf0Decoder<'a> {
    /// Create a new AMF0 decoder.
    pub fn new(buffer: &'a mut CursorBuffer) -> Self {
        Self::with_config(buffer, CodecConfig::default())
    }

    /// Create a decoder with explicit limits.
    pub fn with_config(buffer: &'a mut CursorBuffer, config: CodecConfig) -> Self {
        Self {
            buffer,
            config,
            references: DecodeTable::new(ReferenceTable::Objects),
            depth: 0,
        }
    }

    /// Check if the decoder has reached the end of the AMF0 data.
    pub fn is_empty(&self) -> bool {
        self.buffer.bytes_available() == 0
    }

    /// Read all the encoded values from the decoder.
    /// Returns both successfully decoded values and any error that occurred.
    pub fn decode_all(&mut self) -> (Vec<AmfValue>, Option<AmfReadError>) {
        let mut results = vec![];

        while !self.is_empty() {
            match self.decode() {
                Ok(value) => results.push(value),
                Err(err) => return (results, Some(err)),
            }
        }

        (results, None)
    }

    /// Read the next encoded value from the decoder.
    ///
    /// On failure the position is restored.
    pub fn decode(&mut self) -> Result<AmfValue, AmfReadError> {
        self.references.clear();
        self.depth = 0;

        let checkpoint = Checkpoint::enter(self.buffer);
        let result = self.read_value();
        checkpoint.leave(self.buffer, result)
    }

    /// Read the next encoded value from the decoder and check if it matches the
    /// specified marker.
    pub fn decode_with_type(&mut self, specified_marker: Amf0Marker) -> Result<AmfValue, AmfReadError> {
        let position = self.buffer.position();
        let marker = self.buffer.read_u8()?;
        // seek back to the original position
        self.buffer.set_position(position)?;

        let marker = Amf0Marker::from_u8(marker).ok_or(AmfReadError::UnknownMarker {
            format: ObjectEncoding::Amf0,
            marker,
        })?;
        if marker != specified_marker {
            return Err(AmfReadError::WrongType {
                expected: specified_marker,
                got: marker,
            });
        }

        self.decode()
    }

    fn read_value(&mut self) -> Result<AmfValue, AmfReadError> {
        let marker = self.buffer.read_u8()?;
        let marker = Amf0Marker::from_u8(marker).ok_or(AmfReadError::UnknownMarker {
            format: ObjectEncoding::Amf0,
            marker,
        })?;

        match marker {
            Amf0Marker::Number => Ok(AmfValue::Number(self.buffer.read_f64()?)),
            Amf0Marker::Boolean => Ok(AmfValue::Boolean(self.buffer.read_bool()?)),
            Amf0Marker::String => Ok(AmfValue::String(self.buffer.read_utf()?.into())),
            Amf0Marker::Object => self.read_object(None),
            Amf0Marker::Null => Ok(AmfValue::Null),
            Amf0Marker::Undefined => Ok(AmfValue::Undefined),
            Amf0Marker::Reference => {
                let index = self.buffer.read_u16()?;
                self.references.get(usize::from(index))
            }
            Amf0Marker::EcmaArray => self.read_ecma_array(),
            Amf0Marker::StrictArray => self.read_strict_array(),
            Amf0Marker::Date => {
                let millis = self.buffer.read_f64()?;
                // time zone, unused
                self.buffer.read_i16()?;
                Ok(AmfValue::Date(AmfDate::from_millis(millis)))
            }
            Amf0Marker::LongString => Ok(AmfValue::String(self.read_long_string()?)),
            Amf0Marker::XmlDocument => {
                let value = AmfValue::XmlDocument(self.read_long_string()?);
                self.references.push(value.clone());
                Ok(value)
            }
            Amf0Marker::TypedObject => {
                let class_name = self.buffer.read_utf()?;
                self.read_object(Some(class_name.into()))
            }
            Amf0Marker::AVMPlusObject => {
                debug!("switching to AMF3");
                Amf3Decoder::with_config(&mut *self.buffer, self.config.clone()).read_value()
            }
            Amf0Marker::MovieClipMarker
            | Amf0Marker::ObjectEnd
            | Amf0Marker::Unsupported
            | Amf0Marker::Recordset => Err(AmfReadError::UnsupportedAmf0Type(marker)),
        }
    }

    fn read_long_string(&mut self) -> Result<Arc<str>, AmfReadError> {
        let len = self.buffer.read_u32()?;
        Ok(self.buffer.read_utf8(len as usize)?.into())
    }

    fn is_read_object_eof(&mut self) -> bool {
        let position = self.buffer.position();
        match self.buffer.read_u24() {
            Ok(OBJECT_END) => true,
            _ => {
                self.buffer.set_position(position).ok();
                false
            }
        }
    }

    /// Key/value pairs up to the `00 00 09` trailer.
    fn read_properties(&mut self, declared: Option<usize>) -> Result<AmfMap, AmfReadError> {
        let mut properties = AmfMap::new();

        loop {
            if self.is_read_object_eof() {
                break;
            }

            // Some encoders drop the trailer of a top-level ECMA array.
            if declared == Some(properties.len()) && self.is_empty() {
                break;
            }

            let key = self.buffer.read_utf()?;
            let value = self.read_value()?;
            properties.push((key.into(), value));
        }

        Ok(properties)
    }

    fn read_object(&mut self, class_name: Option<Arc<str>>) -> Result<AmfValue, AmfReadError> {
        let slot = self.references.reserve();
        self.enter()?;
        let properties = self.read_properties(None)?;
        self.leave();

        let value = AmfValue::Object(Arc::new(AmfObject {
            class_name,
            properties,
        }));
        self.references.fill(slot, value.clone());
        Ok(value)
    }

    fn read_ecma_array(&mut self) -> Result<AmfValue, AmfReadError> {
        let declared = self.buffer.read_u32()? as usize;

        let slot = self.references.reserve();
        self.enter()?;
        let entries = self.read_properties(Some(declared))?;
        self.leave();

        let value = AmfValue::EcmaArray(Arc::new(entries));
        self.references.fill(slot, value.clone());
        Ok(value)
    }

    fn read_strict_array(&mut self) -> Result<AmfValue, AmfReadError> {
        let len = self.buffer.read_u32()? as usize;

        let slot = self.references.reserve();
        self.enter()?;
        let mut values = Vec::with_capacity(len.min(self.buffer.bytes_available()));
        for _ in 0..len {
            values.push(self.read_value()?);
        }
        self.leave();

        let value = AmfValue::Array(Arc::new(values));
        self.references.fill(slot, value.clone());
        Ok(value)
    }

    fn enter(&mut self) -> Result<(), AmfReadError> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(AmfReadError::NestingTooDeep(self.config.max_depth));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }
}

impl Iterator for Amf0Decoder<'_> {
    type Item = Result<AmfValue, AmfReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_empty() {
            return None;
        }

        Some(self.decode())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn buffer_of(bytes: &[u8]) -> CursorBuffer {
        CursorBuffer::from_slice(bytes)
    }

    #[test]
    fn test_reader_bool() {
        let mut buffer = buffer_of(&[0x01, 0x01]); // true
        let mut amf_reader = Amf0Decoder::new(&mut buffer);
        let value = amf_reader.decode_with_type(Amf0Marker::Boolean).unwrap();
        assert_eq!(value, AmfValue::Boolean(true));
    }

    #[test]
    fn test_reader_number() {
        let mut amf0_number = vec![0x00];
        amf0_number.extend_from_slice(&772.161_f64.to_be_bytes());

        let mut buffer = buffer_of(&amf0_number);
        let mut amf_reader = Amf0Decoder::new(&mut buffer);
        let value = amf_reader.decode_with_type(Amf0Marker::Number).unwrap();
        assert_eq!(value, AmfValue::Number(772.161));
    }

    #[test]
    fn test_reader_string() {
        let mut amf0_string = vec![0x02, 0x00, 0x0b]; // 11 bytes
        amf0_string.extend_from_slice(b"Hello World");

        let mut buffer = buffer_of(&amf0_string);
        let mut amf_reader = Amf0Decoder::new(&mut buffer);
        let value = amf_reader.decode_with_type(Amf0Marker::String).unwrap();
        assert_eq!(value, AmfValue::from("Hello World"));
    }

    #[test]
    fn test_reader_long_string() {
        let mut amf0_string = vec![0x0c, 0x00, 0x00, 0x00, 0x0b]; // 11 bytes
        amf0_string.extend_from_slice(b"Hello World");

        let mut buffer = buffer_of(&amf0_string);
        let mut amf_reader = Amf0Decoder::new(&mut buffer);
        let value = amf_reader.decode_with_type(Amf0Marker::LongString).unwrap();
        assert_eq!(value, AmfValue::from("Hello World"));
    }

    #[test]
    fn test_reader_object() {
        let mut amf0_object = vec![0x03, 0x00, 0x04]; // 1 property with 4 bytes
        amf0_object.extend_from_slice(b"test");
        amf0_object.extend_from_slice(&[0x05]); // null
        amf0_object.extend_from_slice(&[0x00, 0x00, 0x09]); // object end (0x00 0x00 0x09)

        let mut buffer = buffer_of(&amf0_object);
        let mut amf_reader = Amf0Decoder::new(&mut buffer);
        let value = amf_reader.decode_with_type(Amf0Marker::Object).unwrap();

        assert_eq!(value, AmfValue::object([("test", AmfValue::Null)]));
    }

    #[test]
    fn test_reader_typed_object() {
        let mut amf0_object = vec![0x10, 0x00, 0x01, b'P', 0x00, 0x01, b'x'];
        amf0_object.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x09]);

        let mut buffer = buffer_of(&amf0_object);
        let value = Amf0Decoder::new(&mut buffer).decode().unwrap();
        assert_eq!(
            value,
            AmfValue::typed_object("P", [("x", AmfValue::Boolean(true))])
        );
    }

    #[test]
    fn test_reader_ecma_array_ignores_declared_count() {
        let amf0_ecma_array = vec![
            0x08, 0x00, 0x00, 0x00, 0x07, // declared count is wrong
            0x00, 0x01, b'a', 0x05, // "a": null
            0x00, 0x00, 0x09, // end
            0x05, // next value
        ];

        let mut buffer = buffer_of(&amf0_ecma_array);
        let mut amf_reader = Amf0Decoder::new(&mut buffer);
        assert_eq!(
            amf_reader.decode().unwrap(),
            AmfValue::ecma_array([("a", AmfValue::Null)])
        );
        assert_eq!(amf_reader.decode().unwrap(), AmfValue::Null);
    }

    #[test]
    fn test_reader_ecma_array_without_trailer() {
        let amf0_ecma_array = vec![0x08, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, b'a', 0x05];

        let mut buffer = buffer_of(&amf0_ecma_array);
        assert_eq!(
            Amf0Decoder::new(&mut buffer).decode().unwrap(),
            AmfValue::ecma_array([("a", AmfValue::Null)])
        );
    }

    #[test]
    fn test_reader_strict_array() {
        let amf0_array = vec![0x0a, 0x00, 0x00, 0x00, 0x02, 0x05, 0x01, 0x00];

        let mut buffer = buffer_of(&amf0_array);
        let value = Amf0Decoder::new(&mut buffer).decode().unwrap();
        assert_eq!(value, AmfValue::array([AmfValue::Null, AmfValue::Boolean(false)]));
    }

    #[test]
    fn test_reader_date() {
        let mut amf0_date = vec![0x0b];
        amf0_date.extend_from_slice(&1_234.0_f64.to_be_bytes());
        amf0_date.extend_from_slice(&[0xff, 0x88]); // a time zone we ignore

        let mut buffer = buffer_of(&amf0_date);
        let value = Amf0Decoder::new(&mut buffer).decode().unwrap();
        assert_eq!(value, AmfValue::Date(AmfDate::from_millis(1_234.0)));
        assert_eq!(buffer.bytes_available(), 0);
    }

    #[test]
    fn test_reader_reference() {
        let amf0_array = vec![
            0x0a, 0x00, 0x00, 0x00, 0x02, // index 0
            0x03, 0x00, 0x00, 0x09, // empty object, index 1
            0x07, 0x00, 0x01, // reference 1
        ];

        let mut buffer = buffer_of(&amf0_array);
        let AmfValue::Array(values) = Amf0Decoder::new(&mut buffer).decode().unwrap() else {
            panic!("expected an array");
        };
        match (&values[0], &values[1]) {
            (AmfValue::Object(a), AmfValue::Object(b)) => assert!(Arc::ptr_eq(a, b)),
            other => panic!("unexpected values: {other:?}"),
        }
    }

    #[test]
    fn test_reader_reference_errors() {
        let mut buffer = buffer_of(&[0x07, 0x00, 0x00]);
        assert!(matches!(
            Amf0Decoder::new(&mut buffer).decode(),
            Err(AmfReadError::InvalidReference {
                table: ReferenceTable::Objects,
                index: 0
            })
        ));

        // an array that contains itself
        let mut buffer = buffer_of(&[0x0a, 0x00, 0x00, 0x00, 0x01, 0x07, 0x00, 0x00]);
        assert!(matches!(
            Amf0Decoder::new(&mut buffer).decode(),
            Err(AmfReadError::CircularReference(0))
        ));
    }

    #[test]
    fn test_reader_xml_reference_shares_text() {
        let mut amf0_array = vec![0x0a, 0x00, 0x00, 0x00, 0x03]; // index 0
        amf0_array.extend_from_slice(&[0x0f, 0x00, 0x00, 0x00, 0x04]); // index 1
        amf0_array.extend_from_slice(b"<a/>");
        amf0_array.extend_from_slice(&[0x07, 0x00, 0x01, 0x07, 0x00, 0x01]);

        let mut buffer = buffer_of(&amf0_array);
        let AmfValue::Array(values) = Amf0Decoder::new(&mut buffer).decode().unwrap() else {
            panic!("expected an array");
        };
        let AmfValue::XmlDocument(first) = &values[0] else {
            panic!("expected an xml document");
        };
        for value in values.iter() {
            match value {
                AmfValue::XmlDocument(text) => assert!(Arc::ptr_eq(text, first)),
                other => panic!("unexpected value: {other:?}"),
            }
        }
    }

    #[test]
    fn test_reader_xml_document() {
        let mut amf0_xml = vec![0x0f, 0x00, 0x00, 0x00, 0x04];
        amf0_xml.extend_from_slice(b"<a/>");

        let mut buffer = buffer_of(&amf0_xml);
        let value = Amf0Decoder::new(&mut buffer).decode().unwrap();
        assert_eq!(value, AmfValue::XmlDocument("<a/>".into()));
    }

    #[test]
    fn test_reader_avmplus() {
        let mut buffer = buffer_of(&[0x11, 0x0c, 0x05, 0x01, 0x02]);
        let value = Amf0Decoder::new(&mut buffer).decode().unwrap();
        assert_eq!(value, AmfValue::ByteArray(Bytes::from_static(&[0x01, 0x02])));
    }

    #[test]
    fn test_reader_unsupported_and_unknown() {
        for marker in [0x04, 0x09, 0x0d, 0x0e] {
            let mut buffer = buffer_of(&[marker]);
            let err = Amf0Decoder::new(&mut buffer).decode().unwrap_err();
            assert!(matches!(err, AmfReadError::UnsupportedAmf0Type(_)));
        }

        let mut buffer = buffer_of(&[0x12]);
        let err = Amf0Decoder::new(&mut buffer).decode().unwrap_err();
        assert!(matches!(
            err,
            AmfReadError::UnknownMarker {
                format: ObjectEncoding::Amf0,
                marker: 0x12
            }
        ));
    }

    #[test]
    fn test_reader_wrong_type() {
        let mut buffer = buffer_of(&[0x05]);
        let mut amf_reader = Amf0Decoder::new(&mut buffer);
        let err = amf_reader.decode_with_type(Amf0Marker::Number).unwrap_err();

        assert!(matches!(
            err,
            AmfReadError::WrongType {
                expected: Amf0Marker::Number,
                got: Amf0Marker::Null
            }
        ));
        assert!(!amf_reader.is_empty());
    }

    #[test]
    fn test_reader_truncated_restores_position() {
        let mut buffer = buffer_of(&[0x03, 0x00, 0x01, b'a', 0x00, 0x00]);
        let err = Amf0Decoder::new(&mut buffer).decode().unwrap_err();

        assert_eq!(err.kind(), crate::ErrorKind::Bounds);
        assert_eq!(buffer.position(), 0);
    }

    #[test]
    fn test_decode_all() {
        let mut buffer = buffer_of(&[0x05, 0x06, 0x01, 0x01, 0x12]);
        let (values, err) = Amf0Decoder::new(&mut buffer).decode_all();

        assert_eq!(
            values,
            vec![AmfValue::Null, AmfValue::Undefined, AmfValue::Boolean(true)]
        );
        assert!(err.is_some());
        assert_eq!(buffer.position(), 4);
    }

    #[test]
    fn test_iterator() {
        let mut buffer = buffer_of(&[0x05, 0x01, 0x00]);
        let values: Vec<_> = Amf0Decoder::new(&mut buffer)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(values, vec![AmfValue::Null, AmfValue::Boolean(false)]);
    }
}
