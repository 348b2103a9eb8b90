use bytes_util::{CursorBuffer, ObjectEncoding};
use tracing::debug;

use super::define::{Amf3Marker, DYNAMIC_TRAITS, INLINE, INTEGER_MAX, INTEGER_MIN, MAX_LENGTH};
use super::u29::write_u29;
use crate::config::CodecConfig;
use crate::errors::{AmfWriteError, ReferenceTable};
use crate::reference::{IndexTable, ObjectTable};
use crate::session::Checkpoint;
use crate::value::{AmfDictionary, AmfMap, AmfObject, AmfValue};

/// AMF3 encoder.
///
/// Holds the string, object and trait tables of one session. Every call to
/// [`encode`](Self::encode) starts a new session.
#[derive(Debug)]
pub struct Amf3Encoder {
    config: CodecConfig,
    strings: IndexTable<String>,
    objects: ObjectTable,
    traits: IndexTable<String>,
    depth: usize,
}

impl Default for Amf3Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Amf3Encoder {
    /// Create an encoder with the default limits.
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    /// Create an encoder with explicit limits.
    pub fn with_config(config: CodecConfig) -> Self {
        let capacity = config.max_references;
        Self {
            strings: IndexTable::new(ReferenceTable::Strings, capacity),
            objects: ObjectTable::new(config.reference_mode, capacity),
            traits: IndexTable::new(ReferenceTable::Traits, capacity),
            depth: 0,
            config,
        }
    }

    /// Encode one value at the buffer position.
    ///
    /// On failure the buffer position and length are restored.
    pub fn encode(&mut self, buffer: &mut CursorBuffer, value: &AmfValue) -> Result<(), AmfWriteError> {
        self.strings.clear();
        self.objects.clear();
        self.traits.clear();
        self.depth = 0;

        let checkpoint = Checkpoint::enter(buffer);
        let result = self.write_value(buffer, value);
        checkpoint.leave(buffer, result)
    }

    /// Write a value within the current session.
    pub(crate) fn write_value(&mut self, buffer: &mut CursorBuffer, value: &AmfValue) -> Result<(), AmfWriteError> {
        match value {
            AmfValue::Undefined => write_marker(buffer, Amf3Marker::Undefined),
            AmfValue::Null => write_marker(buffer, Amf3Marker::Null),
            AmfValue::Boolean(false) => write_marker(buffer, Amf3Marker::False),
            AmfValue::Boolean(true) => write_marker(buffer, Amf3Marker::True),
            AmfValue::Integer(n) => Self::encode_integer(buffer, *n),
            AmfValue::Number(n) => Self::encode_double(buffer, *n),
            AmfValue::String(s) => {
                write_marker(buffer, Amf3Marker::String)?;
                self.write_string(buffer, s)
            }
            AmfValue::Date(date) => {
                write_marker(buffer, Amf3Marker::Date)?;
                // dates have no identity, they only take up an index
                self.objects.insert(value);
                write_u29(buffer, INLINE)?;
                buffer.write_f64(date.millis)?;
                Ok(())
            }
            AmfValue::Array(values) => {
                write_marker(buffer, Amf3Marker::Array)?;
                if self.write_reference(buffer, value)? {
                    return Ok(());
                }
                self.write_dense_array(buffer, values)
            }
            AmfValue::EcmaArray(entries) => {
                write_marker(buffer, Amf3Marker::Array)?;
                if self.write_reference(buffer, value)? {
                    return Ok(());
                }
                self.write_associative_array(buffer, entries)
            }
            AmfValue::Object(object) => {
                write_marker(buffer, Amf3Marker::Object)?;
                if self.write_reference(buffer, value)? {
                    return Ok(());
                }
                self.write_object(buffer, object)
            }
            AmfValue::ByteArray(bytes) => {
                write_marker(buffer, Amf3Marker::ByteArray)?;
                if self.write_reference(buffer, value)? {
                    return Ok(());
                }
                if bytes.len() >= MAX_LENGTH {
                    return Err(AmfWriteError::ArrayTooLong(bytes.len()));
                }
                write_header(buffer, bytes.len(), 1, INLINE)?;
                buffer.write_bytes(bytes)?;
                Ok(())
            }
            AmfValue::Dictionary(dictionary) => {
                write_marker(buffer, Amf3Marker::Dictionary)?;
                if self.write_reference(buffer, value)? {
                    return Ok(());
                }
                self.write_dictionary(buffer, dictionary)
            }
            AmfValue::XmlDocument(_) => Err(AmfWriteError::UnsupportedType {
                format: ObjectEncoding::Amf3,
                kind: value.kind(),
            }),
        }
    }

    /// Encode an AMF3 integer, or a double when `value` needs more than 29 bits.
    pub fn encode_integer(buffer: &mut CursorBuffer, value: i32) -> Result<(), AmfWriteError> {
        if !(INTEGER_MIN..=INTEGER_MAX).contains(&value) {
            debug!(value, "integer does not fit 29 bits, writing a double");
            return Self::encode_double(buffer, f64::from(value));
        }

        write_marker(buffer, Amf3Marker::Integer)?;
        write_u29(buffer, (value as u32) & 0x1fff_ffff)
    }

    /// Encode an AMF3 double.
    pub fn encode_double(buffer: &mut CursorBuffer, value: f64) -> Result<(), AmfWriteError> {
        write_marker(buffer, Amf3Marker::Double)?;
        buffer.write_f64(value)?;
        Ok(())
    }

    /// Write a string body, by reference when it was already written.
    fn write_string(&mut self, buffer: &mut CursorBuffer, value: &str) -> Result<(), AmfWriteError> {
        if value.is_empty() {
            return write_u29(buffer, INLINE);
        }

        if let Some(index) = self.strings.get(value) {
            return write_header(buffer, index, 1, 0);
        }

        if value.len() >= MAX_LENGTH {
            return Err(AmfWriteError::StringTooLong(value.len()));
        }

        self.strings.insert(Some(value.to_owned()));
        write_header(buffer, value.len(), 1, INLINE)?;
        buffer.write_utf8(value)?;
        Ok(())
    }

    fn write_key(&mut self, buffer: &mut CursorBuffer, key: &str) -> Result<(), AmfWriteError> {
        if key.is_empty() {
            return Err(AmfWriteError::EmptyKey);
        }
        self.write_string(buffer, key)
    }

    /// Writes a back-reference and returns `true`, or registers the value.
    fn write_reference(&mut self, buffer: &mut CursorBuffer, value: &AmfValue) -> Result<bool, AmfWriteError> {
        match self.objects.find(value) {
            Some(index) => {
                write_header(buffer, index, 1, 0)?;
                Ok(true)
            }
            None => {
                self.objects.insert(value);
                Ok(false)
            }
        }
    }

    fn write_dense_array(&mut self, buffer: &mut CursorBuffer, values: &[AmfValue]) -> Result<(), AmfWriteError> {
        if values.len() >= MAX_LENGTH {
            return Err(AmfWriteError::ArrayTooLong(values.len()));
        }

        write_header(buffer, values.len(), 1, INLINE)?;
        // no associative part
        write_u29(buffer, INLINE)?;

        self.enter()?;
        for value in values {
            self.write_value(buffer, value)?;
        }
        self.leave();
        Ok(())
    }

    fn write_associative_array(&mut self, buffer: &mut CursorBuffer, entries: &AmfMap) -> Result<(), AmfWriteError> {
        // every entry goes to the associative part
        write_u29(buffer, INLINE)?;

        self.enter()?;
        self.write_pairs(buffer, entries)?;
        self.leave();
        Ok(())
    }

    fn write_object(&mut self, buffer: &mut CursorBuffer, object: &AmfObject) -> Result<(), AmfWriteError> {
        match object.class_name.as_deref().filter(|name| !name.is_empty()) {
            Some(class_name) => match self.traits.get(class_name) {
                Some(index) => write_header(buffer, index, 2, INLINE)?,
                None => {
                    self.traits.insert(Some(class_name.to_owned()));
                    write_u29(buffer, DYNAMIC_TRAITS)?;
                    self.write_string(buffer, class_name)?;
                }
            },
            None => {
                self.traits.insert(None);
                write_u29(buffer, DYNAMIC_TRAITS)?;
                self.write_string(buffer, "")?;
            }
        }

        self.enter()?;
        self.write_pairs(buffer, &object.properties)?;
        self.leave();
        Ok(())
    }

    fn write_dictionary(&mut self, buffer: &mut CursorBuffer, dictionary: &AmfDictionary) -> Result<(), AmfWriteError> {
        let count = dictionary.entries.len();
        if count >= MAX_LENGTH {
            return Err(AmfWriteError::ArrayTooLong(count));
        }

        write_header(buffer, count, 1, INLINE)?;
        buffer.write_u8(u8::from(dictionary.weak_keys))?;

        self.enter()?;
        for (key, value) in &dictionary.entries {
            self.write_value(buffer, key)?;
            self.write_value(buffer, value)?;
        }
        self.leave();
        Ok(())
    }

    /// Dynamic members followed by the empty string terminator.
    fn write_pairs(&mut self, buffer: &mut CursorBuffer, entries: &AmfMap) -> Result<(), AmfWriteError> {
        for (key, value) in entries {
            self.write_key(buffer, key)?;
            self.write_value(buffer, value)?;
        }
        write_u29(buffer, INLINE)
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

fn write_marker(buffer: &mut CursorBuffer, marker: Amf3Marker) -> Result<(), AmfWriteError> {
    buffer.write_u8(marker as u8)?;
    Ok(())
}

/// Write `payload` shifted left by `shift` with the low `flags` bits set.
fn write_header(buffer: &mut CursorBuffer, payload: usize, shift: u32, flags: u32) -> Result<(), AmfWriteError> {
    match u32::try_from(payload) {
        Ok(payload) if payload < (1 << (29 - shift)) => write_u29(buffer, (payload << shift) | flags),
        Ok(payload) => Err(AmfWriteError::UInt29OutOfRange(payload)),
        Err(_) => Err(AmfWriteError::UInt29OutOfRange(u32::MAX)),
    }
}
