use std::fmt;

use bytes_util::{CursorError, ObjectEncoding};

use crate::amf0::Amf0Marker;
use crate::amf3::Amf3Marker;

/// Coarse classification shared by read and write errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A read past the data or a write past the capacity.
    Bounds,
    /// A marker that is not part of the format.
    UnknownType,
    /// A number or length outside what the format can represent.
    Range,
    /// A valid marker or value this codec does not handle.
    UnsupportedFeature,
    /// Text that cannot be represented, or an empty property name.
    Encoding,
    /// A back-reference that does not resolve.
    Reference,
}

impl From<&CursorError> for ErrorKind {
    fn from(err: &CursorError) -> Self {
        match err {
            CursorError::OutOfBounds { .. } => Self::Bounds,
            CursorError::OutOfRange { .. } => Self::Range,
            _ => Self::Encoding,
        }
    }
}

/// The reference table a back-reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceTable {
    /// Complex values. The only table of AMF0.
    Objects,
    /// AMF3 strings.
    Strings,
    /// AMF3 traits.
    Traits,
}

impl fmt::Display for ReferenceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Objects => write!(f, "object"),
            Self::Strings => write!(f, "string"),
            Self::Traits => write!(f, "trait"),
        }
    }
}

/// Errors that can occur when decoding AMF data.
#[derive(Debug, thiserror::Error)]
pub enum AmfReadError {
    /// An unknown marker was encountered.
    #[error("unknown {format} marker: {marker:#04x}")]
    UnknownMarker {
        /// Format being decoded.
        format: ObjectEncoding,
        /// The offending byte.
        marker: u8,
    },
    /// An AMF0 marker without a decoder.
    #[error("unsupported type: {0:?}")]
    UnsupportedAmf0Type(Amf0Marker),
    /// An AMF3 marker without a decoder.
    #[error("unsupported type: {0:?}")]
    UnsupportedAmf3Type(Amf3Marker),
    /// An AMF3 object with externalizable traits.
    #[error("externalizable object not supported: {0}")]
    Externalizable(String),
    /// A back-reference past the end of its table.
    #[error("invalid {table} reference: {index}")]
    InvalidReference {
        /// Table the index points into.
        table: ReferenceTable,
        /// The offending index.
        index: usize,
    },
    /// A back-reference to a value that is still being decoded.
    #[error("circular reference: {0}")]
    CircularReference(usize),
    /// Containers nested deeper than the configured limit.
    #[error("nesting deeper than {0} levels")]
    NestingTooDeep(usize),
    /// A wrong type was encountered. Created when using
    /// `Amf0Decoder::decode_with_type` and the next value is not the expected
    /// type.
    #[error("wrong type: expected {expected:?}, got {got:?}")]
    WrongType {
        /// The requested marker.
        expected: Amf0Marker,
        /// The marker found in the data.
        got: Amf0Marker,
    },
    /// The buffer rejected a read.
    #[error("buffer error: {0}")]
    Buffer(#[from] CursorError),
}

impl AmfReadError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownMarker { .. } | Self::WrongType { .. } => ErrorKind::UnknownType,
            Self::UnsupportedAmf0Type(_) | Self::UnsupportedAmf3Type(_) | Self::Externalizable(_) => {
                ErrorKind::UnsupportedFeature
            }
            Self::InvalidReference { .. } | Self::CircularReference(_) => ErrorKind::Reference,
            Self::NestingTooDeep(_) => ErrorKind::Range,
            Self::Buffer(err) => err.into(),
        }
    }
}

/// Errors that can occur when encoding AMF data.
#[derive(Debug, thiserror::Error)]
pub enum AmfWriteError {
    /// A value that does not fit the 29 bit variable length integer.
    #[error("u29 out of range: {0:#x}")]
    UInt29OutOfRange(u32),
    /// A string longer than its length header allows.
    #[error("string too long: {0} bytes")]
    StringTooLong(usize),
    /// An array, byte array or dictionary longer than its count allows.
    #[error("array too long: {0} elements")]
    ArrayTooLong(usize),
    /// An object or ECMA array property with an empty name.
    #[error("empty property name")]
    EmptyKey,
    /// A value the target format cannot express.
    #[error("unsupported {format} type: {kind}")]
    UnsupportedType {
        /// Target format.
        format: ObjectEncoding,
        /// Kind of the rejected value.
        kind: &'static str,
    },
    /// Containers nested deeper than the configured limit.
    #[error("nesting deeper than {0} levels")]
    NestingTooDeep(usize),
    /// The buffer rejected a write.
    #[error("buffer error: {0}")]
    Buffer(#[from] CursorError),
}

impl AmfWriteError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UInt29OutOfRange(_)
            | Self::StringTooLong(_)
            | Self::ArrayTooLong(_)
            | Self::NestingTooDeep(_) => ErrorKind::Range,
            Self::EmptyKey => ErrorKind::Encoding,
            Self::UnsupportedType { .. } => ErrorKind::UnsupportedFeature,
            Self::Buffer(err) => err.into(),
        }
    }
}
