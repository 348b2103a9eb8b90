use std::sync::Arc;

use bytes_util::{CursorBuffer, ObjectEncoding};
use num_traits::FromPrimitive;

use super::define::{Amf3Marker, EXTERNALIZABLE_TRAITS, INLINE};
use super::u29::{read_u29, sign_extend};
use crate::config::CodecConfig;
use crate::errors::{AmfReadError, ReferenceTable};
use crate::reference::DecodeTable;
use crate::session::Checkpoint;
use crate::value::{AmfDate, AmfDictionary, AmfObject, AmfValue};

/// Shape shared by objects of one class.
#[derive(Debug)]
struct Traits {
    class_name: Option<Arc<str>>,
    dynamic: bool,
    sealed: Vec<Arc<str>>,
}

/// Leading u29 of a reference-capable value.
enum Header {
    /// Length or count of the inline value that follows.
    Inline(usize),
    /// A previously decoded value.
    Reference(AmfValue),
}

/// An AMF3 Decoder.
///
/// Reads values from the current position of a [`CursorBuffer`]. Every
/// top-level value gets fresh string, object and trait tables.
pub struct Amf3Decoder<'a> {
    buffer: &'a mut CursorBuffer,
    config: CodecConfig,
    strings: DecodeTable<Arc<str>>,
    objects: DecodeTable<AmfValue>,
    traits: DecodeTable<Arc<Traits>>,
    depth: usize,
}

impl<'a> Amf3Decoder<'a> {
    /// Create a new AMF3 decoder.
    pub fn new(buffer: &'a mut CursorBuffer) -> Self {
        Self::with_config(buffer, CodecConfig::default())
    }

    /// Create a decoder with explicit limits.
    pub fn with_config(buffer: &'a mut CursorBuffer, config: CodecConfig) -> Self {
        Self {
            buffer,
            config,
            strings: DecodeTable::new(ReferenceTable::Strings),
            objects: DecodeTable::new(ReferenceTable::Objects),
            traits: DecodeTable::new(ReferenceTable::Traits),
            depth: 0,
        }
    }

    /// Check if the decoder has reached the end of the AMF3 data.
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
        self.strings.clear();
        self.objects.clear();
        self.traits.clear();
        self.depth = 0;

        let checkpoint = Checkpoint::enter(self.buffer);
        let result = self.read_value();
        checkpoint.leave(self.buffer, result)
    }

    /// Read a value within the current session.
    pub(crate) fn read_value(&mut self) -> Result<AmfValue, AmfReadError> {
        let marker = self.buffer.read_u8()?;
        let marker = Amf3Marker::from_u8(marker).ok_or(AmfReadError::UnknownMarker {
            format: ObjectEncoding::Amf3,
            marker,
        })?;

        match marker {
            Amf3Marker::Undefined => Ok(AmfValue::Undefined),
            Amf3Marker::Null => Ok(AmfValue::Null),
            Amf3Marker::False => Ok(AmfValue::Boolean(false)),
            Amf3Marker::True => Ok(AmfValue::Boolean(true)),
            Amf3Marker::Integer => Ok(AmfValue::Integer(sign_extend(read_u29(self.buffer)?))),
            Amf3Marker::Double => Ok(AmfValue::Number(self.buffer.read_f64()?)),
            Amf3Marker::String => Ok(AmfValue::String(self.read_string()?)),
            Amf3Marker::Date => self.read_date(),
            Amf3Marker::Array => self.read_array(),
            Amf3Marker::Object => self.read_object(),
            Amf3Marker::ByteArray => self.read_byte_array(),
            Amf3Marker::Dictionary => self.read_dictionary(),
            Amf3Marker::XmlDocument | Amf3Marker::Xml => Err(AmfReadError::UnsupportedAmf3Type(marker)),
        }
    }

    fn read_header(&mut self) -> Result<Header, AmfReadError> {
        let header = read_u29(self.buffer)?;
        if header & INLINE == 0 {
            return self.objects.get((header >> 1) as usize).map(Header::Reference);
        }
        Ok(Header::Inline((header >> 1) as usize))
    }

    fn read_string(&mut self) -> Result<Arc<str>, AmfReadError> {
        let header = read_u29(self.buffer)?;
        if header & INLINE == 0 {
            return self.strings.get((header >> 1) as usize);
        }

        let len = (header >> 1) as usize;
        if len == 0 {
            return Ok(Arc::from(""));
        }

        let value: Arc<str> = self.buffer.read_utf8(len)?.into();
        self.strings.push(value.clone());
        Ok(value)
    }

    fn read_date(&mut self) -> Result<AmfValue, AmfReadError> {
        if let Header::Reference(value) = self.read_header()? {
            return Ok(value);
        }

        let value = AmfValue::Date(AmfDate::from_millis(self.buffer.read_f64()?));
        self.objects.push(value.clone());
        Ok(value)
    }

    fn read_array(&mut self) -> Result<AmfValue, AmfReadError> {
        let dense_len = match self.read_header()? {
            Header::Inline(len) => len,
            Header::Reference(value) => return Ok(value),
        };

        let slot = self.objects.reserve();
        self.enter()?;

        let mut associative = Vec::new();
        loop {
            let key = self.read_string()?;
            if key.is_empty() {
                break;
            }
            let value = self.read_value()?;
            associative.push((key, value));
        }

        let mut dense = Vec::with_capacity(dense_len.min(self.buffer.bytes_available()));
        for _ in 0..dense_len {
            dense.push(self.read_value()?);
        }
        self.leave();

        let value = if associative.is_empty() {
            AmfValue::Array(Arc::new(dense))
        } else {
            associative.extend(
                dense
                    .into_iter()
                    .enumerate()
                    .map(|(index, value)| (index.to_string().into(), value)),
            );
            AmfValue::EcmaArray(Arc::new(associative))
        };

        self.objects.fill(slot, value.clone());
        Ok(value)
    }

    fn read_object(&mut self) -> Result<AmfValue, AmfReadError> {
        let header = read_u29(self.buffer)?;
        if header & INLINE == 0 {
            return self.objects.get((header >> 1) as usize);
        }

        let traits = self.read_traits(header)?;
        let slot = self.objects.reserve();
        self.enter()?;

        let mut properties = Vec::with_capacity(traits.sealed.len());
        for name in &traits.sealed {
            let value = self.read_value()?;
            properties.push((name.clone(), value));
        }

        if traits.dynamic {
            loop {
                let key = self.read_string()?;
                if key.is_empty() {
                    break;
                }
                let value = self.read_value()?;
                properties.push((key, value));
            }
        }
        self.leave();

        let value = AmfValue::Object(Arc::new(AmfObject {
            class_name: traits.class_name.clone(),
            properties,
        }));
        self.objects.fill(slot, value.clone());
        Ok(value)
    }

    fn read_traits(&mut self, header: u32) -> Result<Arc<Traits>, AmfReadError> {
        if header & 0b10 == 0 {
            return self.traits.get((header >> 2) as usize);
        }

        if header & EXTERNALIZABLE_TRAITS == EXTERNALIZABLE_TRAITS {
            let class_name = self.read_string()?;
            return Err(AmfReadError::Externalizable(class_name.to_string()));
        }

        let dynamic = header & 0b1000 != 0;
        let sealed_count = (header >> 4) as usize;
        let class_name = self.read_string()?;

        let mut sealed = Vec::with_capacity(sealed_count.min(self.buffer.bytes_available()));
        for _ in 0..sealed_count {
            sealed.push(self.read_string()?);
        }

        let traits = Arc::new(Traits {
            class_name: (!class_name.is_empty()).then_some(class_name),
            dynamic,
            sealed,
        });
        self.traits.push(traits.clone());
        Ok(traits)
    }

    fn read_byte_array(&mut self) -> Result<AmfValue, AmfReadError> {
        let len = match self.read_header()? {
            Header::Inline(len) => len,
            Header::Reference(value) => return Ok(value),
        };

        let value = AmfValue::ByteArray(self.buffer.read_bytes(len)?);
        self.objects.push(value.clone());
        Ok(value)
    }

    fn read_dictionary(&mut self) -> Result<AmfValue, AmfReadError> {
        let count = match self.read_header()? {
            Header::Inline(count) => count,
            Header::Reference(value) => return Ok(value),
        };

        let slot = self.objects.reserve();
        let weak_keys = self.buffer.read_u8()? != 0;
        self.enter()?;

        let mut entries = Vec::with_capacity(count.min(self.buffer.bytes_available()));
        for _ in 0..count {
            let key = self.read_value()?;
            let value = self.read_value()?;
            entries.push((key, value));
        }
        self.leave();

        let value = AmfValue::Dictionary(Arc::new(AmfDictionary { weak_keys, entries }));
        self.objects.fill(slot, value.clone());
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

impl Iterator for Amf3Decoder<'_> {
    type Item = Result<AmfValue, AmfReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_empty() {
            return None;
        }

        Some(self.decode())
    }
}
