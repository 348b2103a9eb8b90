use byteorder::{BigEndian, ByteOrder, LittleEndian};
use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::config::{BufferConfig, Endianness, ObjectEncoding};
use crate::errors::CursorError;
use crate::ieee754::{self, FloatLayout};
use crate::range_check;

/// Text encodings understood by [`CursorBuffer::read_multi_byte`] and
/// [`CursorBuffer::write_multi_byte`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// UTF-8
    Utf8,
    /// ISO-8859-1, one byte per code point up to U+00FF.
    Latin1,
    /// 7-bit ASCII.
    Ascii,
}

impl Charset {
    const fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "latin1",
            Self::Ascii => "ascii",
        }
    }

    const fn max_code_point(self) -> u32 {
        match self {
            Self::Utf8 => char::MAX as u32,
            Self::Latin1 => 0xFF,
            Self::Ascii => 0x7F,
        }
    }
}

#[derive(Debug, Clone)]
enum Storage {
    Owned(BytesMut),
    Shared(Bytes),
}

impl Storage {
    fn as_slice(&self) -> &[u8] {
        match self {
            Self::Owned(bytes) => bytes,
            Self::Shared(bytes) => bytes,
        }
    }

    fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Returns the mutable storage, detaching it from any alias first.
    fn make_mut(&mut self) -> &mut BytesMut {
        if let Self::Shared(shared) = self {
            let owned = match std::mem::take(shared).try_into_mut() {
                Ok(owned) => owned,
                Err(shared) => {
                    trace!(len = shared.len(), "detaching aliased buffer storage");
                    BytesMut::from(&shared[..])
                }
            };
            *self = Self::Owned(owned);
        }

        match self {
            Self::Owned(bytes) => bytes,
            Self::Shared(_) => unreachable!("storage was detached above"),
        }
    }

    fn freeze(&mut self) -> Bytes {
        if let Self::Owned(owned) = self {
            *self = Self::Shared(std::mem::take(owned).freeze());
        }

        match self {
            Self::Shared(bytes) => bytes.clone(),
            Self::Owned(_) => unreachable!("storage was frozen above"),
        }
    }
}

/// A byte buffer with a read/write cursor.
///
/// `length` is the number of valid bytes. Reads fail once they would pass
/// `length`; writes past `length` extend it, up to `max_capacity` when the
/// buffer was created with one. Every accessor either completes and advances
/// the position by exactly its width, or fails without touching the buffer.
///
/// ```rust
/// use bytes_util::{CursorBuffer, Endianness};
///
/// let mut buffer = CursorBuffer::new();
/// buffer.write_u16(0x0102).unwrap();
/// buffer.set_endianness(Endianness::Little);
/// buffer.write_u16(0x0102).unwrap();
///
/// assert_eq!(buffer.as_bytes(), &[0x01, 0x02, 0x02, 0x01]);
///
/// buffer.reset();
/// assert_eq!(buffer.read_u16().unwrap(), 0x0201);
/// ```
#[derive(Debug, Clone)]
pub struct CursorBuffer {
    storage: Storage,
    position: usize,
    max_capacity: Option<usize>,
    endianness: Endianness,
    object_encoding: ObjectEncoding,
}

impl Default for CursorBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorBuffer {
    /// Creates an empty, growable buffer with the default configuration.
    pub fn new() -> Self {
        Self::with_config(BufferConfig::default())
    }

    /// Creates an empty buffer from an explicit configuration.
    pub fn with_config(config: BufferConfig) -> Self {
        Self {
            storage: Storage::Owned(BytesMut::with_capacity(config.initial_capacity)),
            position: 0,
            max_capacity: config.max_capacity,
            endianness: config.endianness,
            object_encoding: config.object_encoding,
        }
    }

    /// Creates an empty buffer that can never hold more than `capacity` bytes.
    pub fn fixed(capacity: usize) -> Self {
        Self::with_config(BufferConfig::fixed(capacity))
    }

    /// Wraps existing bytes without copying them. The position starts at zero.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            storage: Storage::Shared(bytes.into()),
            ..Self::with_config(BufferConfig::builder().initial_capacity(0).build())
        }
    }

    /// Copies `data` into a new buffer. The position starts at zero.
    pub fn from_slice(data: &[u8]) -> Self {
        Self::from_bytes(Bytes::copy_from_slice(data))
    }

    /// Returns a second handle onto the same bytes with its own position.
    ///
    /// Both handles read the same storage until one of them writes, at which
    /// point the writer gets a private copy.
    pub fn alias(&mut self) -> Self {
        Self {
            storage: Storage::Shared(self.storage.freeze()),
            position: 0,
            max_capacity: self.max_capacity,
            endianness: self.endianness,
            object_encoding: self.object_encoding,
        }
    }

    /// Index of the next byte to read or write.
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Moves the cursor. Fails if `position` is past the end of the data.
    pub fn set_position(&mut self, position: usize) -> Result<(), CursorError> {
        if position > self.len() {
            return Err(CursorError::OutOfBounds {
                position: self.position,
                requested: position.saturating_sub(self.position),
                available: self.bytes_available(),
            });
        }

        self.position = position;
        Ok(())
    }

    /// Number of valid bytes.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Returns `true` if the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Truncates or zero-extends the data. The position is clamped to the new length.
    pub fn set_len(&mut self, len: usize) -> Result<(), CursorError> {
        if let Some(max) = self.max_capacity {
            if len > max {
                return Err(CursorError::OutOfBounds {
                    position: 0,
                    requested: len,
                    available: max,
                });
            }
        }

        self.storage.make_mut().resize(len, 0);
        self.position = self.position.min(len);
        Ok(())
    }

    /// `len() - position()`
    pub fn bytes_available(&self) -> usize {
        self.len() - self.position
    }

    /// Maximum length, if the buffer is bounded.
    pub const fn max_capacity(&self) -> Option<usize> {
        self.max_capacity
    }

    /// Rewinds the cursor to the start.
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Drops all data and rewinds the cursor.
    pub fn clear(&mut self) {
        self.storage = Storage::Owned(BytesMut::new());
        self.position = 0;
    }

    /// Byte order of the multi-byte accessors.
    pub const fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Changes the byte order of the multi-byte accessors.
    pub fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
    }

    /// AMF version used by the object-level helpers.
    pub const fn object_encoding(&self) -> ObjectEncoding {
        self.object_encoding
    }

    /// Changes the AMF version used by the object-level helpers.
    pub fn set_object_encoding(&mut self, object_encoding: ObjectEncoding) {
        self.object_encoding = object_encoding;
    }

    /// All valid bytes, independent of the position.
    pub fn as_bytes(&self) -> &[u8] {
        self.storage.as_slice()
    }

    /// All valid bytes as a cheaply cloneable [`Bytes`].
    ///
    /// The buffer keeps working afterwards; a later write copies the data.
    pub fn to_bytes(&mut self) -> Bytes {
        self.storage.freeze()
    }

    /// Replaces the content with `data` and rewinds the cursor.
    #[cfg(feature = "compression")]
    pub(crate) fn replace(&mut self, data: Vec<u8>) -> Result<(), CursorError> {
        if let Some(max) = self.max_capacity {
            if data.len() > max {
                return Err(CursorError::OutOfBounds {
                    position: 0,
                    requested: data.len(),
                    available: max,
                });
            }
        }

        self.storage = Storage::Owned(BytesMut::from(&data[..]));
        self.position = 0;
        Ok(())
    }

    fn out_of_bounds(&self, requested: usize, available: usize) -> CursorError {
        CursorError::OutOfBounds {
            position: self.position,
            requested,
            available,
        }
    }

    /// Fails unless `count` bytes can be written at the current position.
    pub fn check_writable(&self, count: usize) -> Result<(), CursorError> {
        match self.max_capacity {
            Some(max) if self.position + count > max => {
                Err(self.out_of_bounds(count, max.saturating_sub(self.position)))
            }
            _ => Ok(()),
        }
    }

    fn take(&mut self, count: usize) -> Result<&[u8], CursorError> {
        if count > self.bytes_available() {
            return Err(self.out_of_bounds(count, self.bytes_available()));
        }

        let start = self.position;
        self.position += count;
        Ok(&self.storage.as_slice()[start..start + count])
    }

    fn put(&mut self, data: &[u8]) -> Result<(), CursorError> {
        self.check_writable(data.len())?;

        let start = self.position;
        let end = start + data.len();
        let storage = self.storage.make_mut();
        if end > storage.len() {
            storage.resize(end, 0);
        }
        storage[start..end].copy_from_slice(data);
        self.position = end;
        Ok(())
    }

    fn read_uint(&mut self, nbytes: usize) -> Result<u64, CursorError> {
        let endianness = self.endianness;
        let data = self.take(nbytes)?;
        Ok(match endianness {
            Endianness::Big => BigEndian::read_uint(data, nbytes),
            Endianness::Little => LittleEndian::read_uint(data, nbytes),
        })
    }

    fn read_int(&mut self, nbytes: usize) -> Result<i64, CursorError> {
        let endianness = self.endianness;
        let data = self.take(nbytes)?;
        Ok(match endianness {
            Endianness::Big => BigEndian::read_int(data, nbytes),
            Endianness::Little => LittleEndian::read_int(data, nbytes),
        })
    }

    /// Callers range check `value` against `nbytes` first.
    fn write_uint(&mut self, value: u64, nbytes: usize) -> Result<(), CursorError> {
        let mut scratch = [0u8; 8];
        match self.endianness {
            Endianness::Big => BigEndian::write_uint(&mut scratch, value, nbytes),
            Endianness::Little => LittleEndian::write_uint(&mut scratch, value, nbytes),
        }
        self.put(&scratch[..nbytes])
    }

    /// Callers range check `value` against `nbytes` first.
    fn write_int(&mut self, value: i64, nbytes: usize) -> Result<(), CursorError> {
        let mut scratch = [0u8; 8];
        match self.endianness {
            Endianness::Big => BigEndian::write_int(&mut scratch, value, nbytes),
            Endianness::Little => LittleEndian::write_int(&mut scratch, value, nbytes),
        }
        self.put(&scratch[..nbytes])
    }

    fn read_float(&mut self, layout: FloatLayout) -> Result<f64, CursorError> {
        let bits = self.read_uint(layout.bytes)?;
        Ok(ieee754::unpack(bits, layout))
    }

    fn write_float(&mut self, value: f64, layout: FloatLayout) -> Result<(), CursorError> {
        self.write_uint(ieee754::pack(value, layout), layout.bytes)
    }

    /// Reads one byte, any non-zero value is `true`.
    pub fn read_bool(&mut self) -> Result<bool, CursorError> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads a signed byte.
    pub fn read_i8(&mut self) -> Result<i8, CursorError> {
        Ok(self.read_u8()? as i8)
    }

    /// Reads an unsigned byte.
    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        Ok(self.take(1)?[0])
    }

    /// Reads a signed 16-bit integer.
    pub fn read_i16(&mut self) -> Result<i16, CursorError> {
        Ok(self.read_int(2)? as i16)
    }

    /// Reads an unsigned 16-bit integer.
    pub fn read_u16(&mut self) -> Result<u16, CursorError> {
        Ok(self.read_uint(2)? as u16)
    }

    /// Reads a signed 24-bit integer.
    pub fn read_i24(&mut self) -> Result<i32, CursorError> {
        Ok(self.read_int(3)? as i32)
    }

    /// Reads an unsigned 24-bit integer.
    pub fn read_u24(&mut self) -> Result<u32, CursorError> {
        Ok(self.read_uint(3)? as u32)
    }

    /// Reads a signed 32-bit integer.
    pub fn read_i32(&mut self) -> Result<i32, CursorError> {
        Ok(self.read_int(4)? as i32)
    }

    /// Reads an unsigned 32-bit integer.
    pub fn read_u32(&mut self) -> Result<u32, CursorError> {
        Ok(self.read_uint(4)? as u32)
    }

    /// Reads a signed 40-bit integer.
    pub fn read_i40(&mut self) -> Result<i64, CursorError> {
        self.read_int(5)
    }

    /// Reads an unsigned 40-bit integer.
    pub fn read_u40(&mut self) -> Result<u64, CursorError> {
        self.read_uint(5)
    }

    /// Reads a signed 48-bit integer.
    pub fn read_i48(&mut self) -> Result<i64, CursorError> {
        self.read_int(6)
    }

    /// Reads an unsigned 48-bit integer.
    pub fn read_u48(&mut self) -> Result<u64, CursorError> {
        self.read_uint(6)
    }

    /// Reads a signed 56-bit integer.
    pub fn read_i56(&mut self) -> Result<i64, CursorError> {
        self.read_int(7)
    }

    /// Reads an unsigned 56-bit integer.
    pub fn read_u56(&mut self) -> Result<u64, CursorError> {
        self.read_uint(7)
    }

    /// Reads a signed 64-bit integer.
    pub fn read_i64(&mut self) -> Result<i64, CursorError> {
        self.read_int(8)
    }

    /// Reads an unsigned 64-bit integer.
    pub fn read_u64(&mut self) -> Result<u64, CursorError> {
        self.read_uint(8)
    }

    /// Reads an IEEE-754 half precision float.
    pub fn read_f16(&mut self) -> Result<f32, CursorError> {
        Ok(self.read_float(FloatLayout::HALF)? as f32)
    }

    /// Reads an IEEE-754 single precision float.
    pub fn read_f32(&mut self) -> Result<f32, CursorError> {
        Ok(self.read_float(FloatLayout::SINGLE)? as f32)
    }

    /// Reads an IEEE-754 double precision float.
    pub fn read_f64(&mut self) -> Result<f64, CursorError> {
        self.read_float(FloatLayout::DOUBLE)
    }

    /// Reads `count` bytes. Zero copy when the buffer wraps shared bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<Bytes, CursorError> {
        if count > self.bytes_available() {
            return Err(self.out_of_bounds(count, self.bytes_available()));
        }

        let start = self.position;
        let bytes = match &self.storage {
            Storage::Shared(shared) => shared.slice(start..start + count),
            Storage::Owned(owned) => Bytes::copy_from_slice(&owned[start..start + count]),
        };
        self.position += count;
        Ok(bytes)
    }

    /// Reads `len` bytes of UTF-8.
    ///
    /// The position is left untouched when the bytes are not valid UTF-8.
    pub fn read_utf8(&mut self, len: usize) -> Result<String, CursorError> {
        let start = self.position;
        let text = std::str::from_utf8(self.take(len)?).map(str::to_owned);
        if text.is_err() {
            self.position = start;
        }
        Ok(text?)
    }

    /// Reads a UTF-8 string prefixed by a big-endian 16-bit byte length.
    pub fn read_utf(&mut self) -> Result<String, CursorError> {
        let start = self.position;
        let data = self.as_bytes();
        if data.len() < start + 2 {
            return Err(self.out_of_bounds(2, self.bytes_available()));
        }

        let len = BigEndian::read_u16(&data[start..start + 2]) as usize;
        self.position += 2;
        self.read_utf8(len).inspect_err(|_| self.position = start)
    }

    /// Reads a single byte as the code point of the same value.
    pub fn read_char(&mut self) -> Result<char, CursorError> {
        Ok(char::from(self.read_u8()?))
    }

    /// Reads `len` bytes and decodes them with `charset`.
    pub fn read_multi_byte(&mut self, len: usize, charset: Charset) -> Result<String, CursorError> {
        match charset {
            Charset::Utf8 => self.read_utf8(len),
            Charset::Latin1 | Charset::Ascii => {
                let start = self.position;
                let data = self.take(len)?;
                if let Some(byte) = data
                    .iter()
                    .copied()
                    .find(|&b| u32::from(b) > charset.max_code_point())
                {
                    self.position = start;
                    return Err(CursorError::Decoding {
                        byte,
                        charset: charset.name(),
                    });
                }
                Ok(data.iter().map(|&b| char::from(b)).collect())
            }
        }
    }

    /// Reads `count` signed 16-bit integers.
    pub fn read_i16_array(&mut self, count: usize) -> Result<Vec<i16>, CursorError> {
        if count.saturating_mul(2) > self.bytes_available() {
            return Err(self.out_of_bounds(count.saturating_mul(2), self.bytes_available()));
        }

        (0..count).map(|_| self.read_i16()).collect()
    }

    /// Reads `count` signed 32-bit integers.
    pub fn read_i32_array(&mut self, count: usize) -> Result<Vec<i32>, CursorError> {
        if count.saturating_mul(4) > self.bytes_available() {
            return Err(self.out_of_bounds(count.saturating_mul(4), self.bytes_available()));
        }

        (0..count).map(|_| self.read_i32()).collect()
    }

    /// Writes `1` for `true` and `0` for `false`.
    pub fn write_bool(&mut self, value: bool) -> Result<(), CursorError> {
        self.write_u8(value as u8)
    }

    /// Writes a signed byte.
    pub fn write_i8(&mut self, value: i8) -> Result<(), CursorError> {
        self.put(&[value as u8])
    }

    /// Writes an unsigned byte.
    pub fn write_u8(&mut self, value: u8) -> Result<(), CursorError> {
        self.put(&[value])
    }

    /// Writes a signed 16-bit integer.
    pub fn write_i16(&mut self, value: i16) -> Result<(), CursorError> {
        self.write_int(value.into(), 2)
    }

    /// Writes an unsigned 16-bit integer.
    pub fn write_u16(&mut self, value: u16) -> Result<(), CursorError> {
        self.write_uint(value.into(), 2)
    }

    /// Writes a signed 24-bit integer.
    pub fn write_i24(&mut self, value: i32) -> Result<(), CursorError> {
        range_check!(value, -0x80_0000, 0x7F_FFFF)?;
        self.write_int(value.into(), 3)
    }

    /// Writes an unsigned 24-bit integer.
    pub fn write_u24(&mut self, value: u32) -> Result<(), CursorError> {
        range_check!(value, 0, 0xFF_FFFF)?;
        self.write_uint(value.into(), 3)
    }

    /// Writes a signed 32-bit integer.
    pub fn write_i32(&mut self, value: i32) -> Result<(), CursorError> {
        self.write_int(value.into(), 4)
    }

    /// Writes an unsigned 32-bit integer.
    pub fn write_u32(&mut self, value: u32) -> Result<(), CursorError> {
        self.write_uint(value.into(), 4)
    }

    /// Writes a signed 40-bit integer.
    pub fn write_i40(&mut self, value: i64) -> Result<(), CursorError> {
        range_check!(value, -(1i64 << 39), (1i64 << 39) - 1)?;
        self.write_int(value, 5)
    }

    /// Writes an unsigned 40-bit integer.
    pub fn write_u40(&mut self, value: u64) -> Result<(), CursorError> {
        range_check!(value, 0, (1u64 << 40) - 1)?;
        self.write_uint(value, 5)
    }

    /// Writes a signed 48-bit integer.
    pub fn write_i48(&mut self, value: i64) -> Result<(), CursorError> {
        range_check!(value, -(1i64 << 47), (1i64 << 47) - 1)?;
        self.write_int(value, 6)
    }

    /// Writes an unsigned 48-bit integer.
    pub fn write_u48(&mut self, value: u64) -> Result<(), CursorError> {
        range_check!(value, 0, (1u64 << 48) - 1)?;
        self.write_uint(value, 6)
    }

    /// Writes a signed 56-bit integer.
    pub fn write_i56(&mut self, value: i64) -> Result<(), CursorError> {
        range_check!(value, -(1i64 << 55), (1i64 << 55) - 1)?;
        self.write_int(value, 7)
    }

    /// Writes an unsigned 56-bit integer.
    pub fn write_u56(&mut self, value: u64) -> Result<(), CursorError> {
        range_check!(value, 0, (1u64 << 56) - 1)?;
        self.write_uint(value, 7)
    }

    /// Writes a signed 64-bit integer.
    pub fn write_i64(&mut self, value: i64) -> Result<(), CursorError> {
        self.write_int(value, 8)
    }

    /// Writes an unsigned 64-bit integer.
    pub fn write_u64(&mut self, value: u64) -> Result<(), CursorError> {
        self.write_uint(value, 8)
    }

    /// Writes `value` narrowed to an IEEE-754 half precision float.
    pub fn write_f16(&mut self, value: f64) -> Result<(), CursorError> {
        self.write_float(value, FloatLayout::HALF)
    }

    /// Writes `value` narrowed to an IEEE-754 single precision float.
    ///
    /// The narrowing goes through [`ieee754::pack`](crate::ieee754::pack), so
    /// a halfway value can round up where `value as f32` would round to even.
    pub fn write_f32(&mut self, value: f64) -> Result<(), CursorError> {
        self.write_float(value, FloatLayout::SINGLE)
    }

    /// Writes an IEEE-754 double precision float.
    pub fn write_f64(&mut self, value: f64) -> Result<(), CursorError> {
        self.write_float(value, FloatLayout::DOUBLE)
    }

    /// Writes raw bytes.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), CursorError> {
        self.put(data)
    }

    /// Writes the UTF-8 bytes of `value` without a length prefix.
    pub fn write_utf8(&mut self, value: &str) -> Result<(), CursorError> {
        self.put(value.as_bytes())
    }

    /// Writes a big-endian 16-bit byte length followed by the UTF-8 bytes.
    pub fn write_utf(&mut self, value: &str) -> Result<(), CursorError> {
        let len = value.len();
        range_check!(len, 0, u16::MAX as usize)?;
        self.check_writable(2 + len)?;

        let mut prefix = [0u8; 2];
        BigEndian::write_u16(&mut prefix, len as u16);
        self.put(&prefix)?;
        self.put(value.as_bytes())
    }

    /// Writes a code point up to U+00FF as a single byte.
    pub fn write_char(&mut self, value: char) -> Result<(), CursorError> {
        let byte = u8::try_from(value).map_err(|_| CursorError::Encoding {
            character: value,
            charset: Charset::Latin1.name(),
        })?;
        self.write_u8(byte)
    }

    /// Encodes `value` with `charset` and writes the result.
    pub fn write_multi_byte(&mut self, value: &str, charset: Charset) -> Result<(), CursorError> {
        if charset == Charset::Utf8 {
            return self.write_utf8(value);
        }

        let encoded = value
            .chars()
            .map(|character| {
                if character as u32 > charset.max_code_point() {
                    Err(CursorError::Encoding {
                        character,
                        charset: charset.name(),
                    })
                } else {
                    Ok(character as u8)
                }
            })
            .collect::<Result<Vec<u8>, _>>()?;
        self.put(&encoded)
    }

    /// Writes each value as a signed 16-bit integer.
    pub fn write_i16_array(&mut self, values: &[i16]) -> Result<(), CursorError> {
        self.check_writable(values.len() * 2)?;
        values.iter().try_for_each(|&v| self.write_i16(v))
    }

    /// Writes each value as a signed 32-bit integer.
    pub fn write_i32_array(&mut self, values: &[i32]) -> Result<(), CursorError> {
        self.check_writable(values.len() * 4)?;
        values.iter().try_for_each(|&v| self.write_i32(v))
    }
}
