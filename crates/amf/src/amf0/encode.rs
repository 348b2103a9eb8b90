use bytes_util::CursorBuffer;
use tracing::debug;

use super::define::{Amf0Marker, LONG_STRING_THRESHOLD, OBJECT_END};
use crate::amf3::Amf3Encoder;
use crate::config::CodecConfig;
use crate::errors::AmfWriteError;
use crate::reference::ObjectTable;
use crate::session::Checkpoint;
use crate::value::{AmfMap, AmfObject, AmfValue};

/// Reference indices are 16 bits wide.
const MAX_REFERENCES: usize = u16::MAX as usize + 1;

/// AMF0 encoder.
///
/// Allows for encoding AMF0 values into a [`CursorBuffer`]. Complex values
/// (objects, arrays, XML documents) that repeat within one call to
/// [`encode`](Self::encode) are written as back-references.
#[derive(Debug)]
pub struct Amf0Encoder {
    config: CodecConfig,
    references: ObjectTable,
    depth: usize,
}

impl Default for Amf0Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Amf0Encoder {
    /// Create an encoder with the default limits.
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    /// Create an encoder with explicit limits.
    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            references: ObjectTable::new(
                config.reference_mode,
                config.max_references.min(MAX_REFERENCES),
            ),
            depth: 0,
            config,
        }
    }

    /// Encode a generic AMF value at the buffer position.
    ///
    /// On failure the buffer position and length are restored.
    pub fn encode(&mut self, buffer: &mut CursorBuffer, value: &AmfValue) -> Result<(), AmfWriteError> {
        self.references.clear();
        self.depth = 0;

        let checkpoint = Checkpoint::enter(buffer);
        let result = self.write_value(buffer, value);
        checkpoint.leave(buffer, result)
    }

    fn write_value(&mut self, buffer: &mut CursorBuffer, value: &AmfValue) -> Result<(), AmfWriteError> {
        match value {
            AmfValue::Number(n) => Self::encode_number(buffer, *n),
            AmfValue::Integer(n) => Self::encode_number(buffer, f64::from(*n)),
            AmfValue::Boolean(b) => Self::encode_bool(buffer, *b),
            AmfValue::String(s) => Self::encode_string(buffer, s),
            AmfValue::Null => Self::encode_null(buffer),
            AmfValue::Undefined => Self::encode_undefined(buffer),
            AmfValue::Date(date) => Self::encode_date(buffer, date.millis),
            AmfValue::Array(values) => {
                if self.write_reference(buffer, value)? {
                    return Ok(());
                }
                self.write_strict_array(buffer, values)
            }
            AmfValue::EcmaArray(entries) => {
                if self.write_reference(buffer, value)? {
                    return Ok(());
                }
                self.write_ecma_array(buffer, entries)
            }
            AmfValue::Object(object) => {
                if self.write_reference(buffer, value)? {
                    return Ok(());
                }
                self.write_object(buffer, object)
            }
            AmfValue::XmlDocument(xml) => {
                if self.write_reference(buffer, value)? {
                    return Ok(());
                }
                Self::encode_xml_document(buffer, xml)
            }
            AmfValue::ByteArray(_) | AmfValue::Dictionary(_) => {
                debug!(kind = value.kind(), "switching to AMF3");
                buffer.write_u8(Amf0Marker::AVMPlusObject as u8)?;
                Amf3Encoder::with_config(self.config.clone()).write_value(buffer, value)
            }
        }
    }

    /// Write object end marker to signify the end of an AMF0 object
    pub fn object_eof(buffer: &mut CursorBuffer) -> Result<(), AmfWriteError> {
        buffer.write_u24(OBJECT_END)?;
        Ok(())
    }

    /// Encode an AMF0 number
    pub fn encode_number(buffer: &mut CursorBuffer, value: f64) -> Result<(), AmfWriteError> {
        buffer.write_u8(Amf0Marker::Number as u8)?;
        buffer.write_f64(value)?;
        Ok(())
    }

    /// Encode an AMF0 boolean
    pub fn encode_bool(buffer: &mut CursorBuffer, value: bool) -> Result<(), AmfWriteError> {
        buffer.write_u8(Amf0Marker::Boolean as u8)?;
        buffer.write_bool(value)?;
        Ok(())
    }

    /// Encode an AMF0 string, as a long string when it has 65535 bytes or more
    pub fn encode_string(buffer: &mut CursorBuffer, value: &str) -> Result<(), AmfWriteError> {
        if value.len() < LONG_STRING_THRESHOLD {
            buffer.write_u8(Amf0Marker::String as u8)?;
            buffer.write_utf(value)?;
            return Ok(());
        }

        let len = u32::try_from(value.len()).map_err(|_| AmfWriteError::StringTooLong(value.len()))?;
        buffer.write_u8(Amf0Marker::LongString as u8)?;
        buffer.write_u32(len)?;
        buffer.write_utf8(value)?;
        Ok(())
    }

    /// Encode an AMF0 null
    pub fn encode_null(buffer: &mut CursorBuffer) -> Result<(), AmfWriteError> {
        buffer.write_u8(Amf0Marker::Null as u8)?;
        Ok(())
    }

    /// Encode an AMF0 undefined
    pub fn encode_undefined(buffer: &mut CursorBuffer) -> Result<(), AmfWriteError> {
        buffer.write_u8(Amf0Marker::Undefined as u8)?;
        Ok(())
    }

    /// Encode an AMF0 date with a zero time zone
    pub fn encode_date(buffer: &mut CursorBuffer, millis: f64) -> Result<(), AmfWriteError> {
        buffer.write_u8(Amf0Marker::Date as u8)?;
        buffer.write_f64(millis)?;
        buffer.write_i16(0)?;
        Ok(())
    }

    /// Encode an AMF0 XML document
    pub fn encode_xml_document(buffer: &mut CursorBuffer, xml: &str) -> Result<(), AmfWriteError> {
        let len = u32::try_from(xml.len()).map_err(|_| AmfWriteError::StringTooLong(xml.len()))?;
        buffer.write_u8(Amf0Marker::XmlDocument as u8)?;
        buffer.write_u32(len)?;
        buffer.write_utf8(xml)?;
        Ok(())
    }

    /// Writes a back-reference and returns `true`, or registers the value.
    fn write_reference(&mut self, buffer: &mut CursorBuffer, value: &AmfValue) -> Result<bool, AmfWriteError> {
        match self.references.find(value) {
            Some(index) => {
                buffer.write_u8(Amf0Marker::Reference as u8)?;
                // remembered indices are below MAX_REFERENCES
                buffer.write_u16(index as u16)?;
                Ok(true)
            }
            None => {
                self.references.insert(value);
                Ok(false)
            }
        }
    }

    fn write_strict_array(&mut self, buffer: &mut CursorBuffer, values: &[AmfValue]) -> Result<(), AmfWriteError> {
        let len = u32::try_from(values.len()).map_err(|_| AmfWriteError::ArrayTooLong(values.len()))?;
        buffer.write_u8(Amf0Marker::StrictArray as u8)?;
        buffer.write_u32(len)?;

        self.enter()?;
        for value in values {
            self.write_value(buffer, value)?;
        }
        self.leave();
        Ok(())
    }

    fn write_ecma_array(&mut self, buffer: &mut CursorBuffer, entries: &AmfMap) -> Result<(), AmfWriteError> {
        let len = u32::try_from(entries.len()).map_err(|_| AmfWriteError::ArrayTooLong(entries.len()))?;
        buffer.write_u8(Amf0Marker::EcmaArray as u8)?;
        buffer.write_u32(len)?;
        self.write_properties(buffer, entries)
    }

    fn write_object(&mut self, buffer: &mut CursorBuffer, object: &AmfObject) -> Result<(), AmfWriteError> {
        match object.class_name.as_deref().filter(|name| !name.is_empty()) {
            Some(class_name) => {
                buffer.write_u8(Amf0Marker::TypedObject as u8)?;
                buffer.write_utf(class_name)?;
            }
            None => buffer.write_u8(Amf0Marker::Object as u8)?,
        }
        self.write_properties(buffer, &object.properties)
    }

    fn write_properties(&mut self, buffer: &mut CursorBuffer, properties: &AmfMap) -> Result<(), AmfWriteError> {
        self.enter()?;
        for (key, value) in properties {
            if key.is_empty() {
                return Err(AmfWriteError::EmptyKey);
            }
            buffer.write_utf(key)?;
            self.write_value(buffer, value)?;
        }
        self.leave();

        Self::object_eof(buffer)
    }

    fn enter(&mut self) -> Result<(), AmfWriteError> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(AmfWriteError::NestingTooDeep(self.config.max_depth));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }
}
