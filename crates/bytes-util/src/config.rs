use std::fmt::{self, Display};

/// Default number of bytes reserved by a new buffer.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Byte order used by the multi-byte accessors of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    /// Most significant byte first (network order).
    #[default]
    Big,
    /// Least significant byte first.
    Little,
}

impl Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Big => f.write_str("big-endian"),
            Self::Little => f.write_str("little-endian"),
        }
    }
}

/// The AMF version used by the object-level read/write helpers.
///
/// The discriminants match the `objectEncoding` values used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ObjectEncoding {
    /// Action Message Format version 0.
    Amf0 = 0,
    /// Action Message Format version 3.
    #[default]
    Amf3 = 3,
}

impl Display for ObjectEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amf0 => f.write_str("AMF0"),
            Self::Amf3 => f.write_str("AMF3"),
        }
    }
}

/// Construction parameters for a [`CursorBuffer`](crate::CursorBuffer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferConfig {
    /// Bytes reserved up front.
    pub initial_capacity: usize,

    /// Hard upper bound on the buffer length. `None` lets the buffer grow.
    pub max_capacity: Option<usize>,

    /// Byte order of multi-byte accessors.
    pub endianness: Endianness,

    /// Codec used by the object-level helpers.
    pub object_encoding: ObjectEncoding,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            max_capacity: None,
            endianness: Endianness::Big,
            object_encoding: ObjectEncoding::Amf3,
        }
    }
}

impl Display for BufferConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let max_capacity_display = match self.max_capacity {
            Some(max) => format!("{max} bytes"),
            None => "unlimited".to_string(),
        };

        write!(
            f,
            "BufferConfig {{ initial_capacity: {} bytes, max_capacity: {}, endianness: {}, object_encoding: {} }}",
            self.initial_capacity, max_capacity_display, self.endianness, self.object_encoding
        )
    }
}

impl BufferConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> BufferConfigBuilder {
        BufferConfigBuilder::default()
    }

    /// A configuration whose buffer can never hold more than `capacity` bytes.
    pub fn fixed(capacity: usize) -> Self {
        Self {
            initial_capacity: capacity,
            max_capacity: Some(capacity),
            ..Self::default()
        }
    }
}

/// Builder for [`BufferConfig`].
#[derive(Debug, Clone, Default)]
pub struct BufferConfigBuilder {
    config: BufferConfig,
}

impl BufferConfigBuilder {
    /// Bytes reserved up front.
    pub fn initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.config.initial_capacity = initial_capacity;
        self
    }

    /// Upper bound on the buffer length.
    pub fn max_capacity(mut self, max_capacity: usize) -> Self {
        self.config.max_capacity = Some(max_capacity);
        self
    }

    /// Byte order of multi-byte accessors.
    pub fn endianness(mut self, endianness: Endianness) -> Self {
        self.config.endianness = endianness;
        self
    }

    /// Codec used by the object-level helpers.
    pub fn object_encoding(mut self, object_encoding: ObjectEncoding) -> Self {
        self.config.object_encoding = object_encoding;
        self
    }

    /// Finish the configuration. The initial capacity never exceeds the maximum.
    pub fn build(self) -> BufferConfig {
        let mut config = self.config;
        if let Some(max) = config.max_capacity {
            config.initial_capacity = config.initial_capacity.min(max);
        }
        config
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BufferConfig::default();
        assert_eq!(config.initial_capacity, DEFAULT_CAPACITY);
        assert_eq!(config.max_capacity, None);
        assert_eq!(config.endianness, Endianness::Big);
        assert_eq!(config.object_encoding, ObjectEncoding::Amf3);
    }

    #[test]
    fn test_builder_clamps_initial_capacity() {
        let config = BufferConfig::builder()
            .initial_capacity(1024)
            .max_capacity(16)
            .endianness(Endianness::Little)
            .object_encoding(ObjectEncoding::Amf0)
            .build();

        assert_eq!(config.initial_capacity, 16);
        assert_eq!(config.max_capacity, Some(16));
        assert_eq!(config.endianness, Endianness::Little);
        assert_eq!(config.object_encoding, ObjectEncoding::Amf0);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            BufferConfig::fixed(8).to_string(),
            "BufferConfig { initial_capacity: 8 bytes, max_capacity: 8 bytes, endianness: big-endian, object_encoding: AMF3 }"
        );
        assert_eq!(ObjectEncoding::Amf0 as u8, 0);
        assert_eq!(ObjectEncoding::Amf3 as u8, 3);
    }
}
