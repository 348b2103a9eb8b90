/// Errors produced by [`CursorBuffer`](crate::CursorBuffer) accessors.
#[derive(Debug, thiserror::Error)]
pub enum CursorError {
    /// A read past `length` or a write past the buffer capacity.
    #[error("out of bounds: {requested} bytes requested at position {position}, {available} available")]
    OutOfBounds {
        /// Position of the cursor when the access was attempted.
        position: usize,
        /// Number of bytes the access needed.
        requested: usize,
        /// Number of bytes that could actually be read or written.
        available: usize,
    },
    /// An integer argument outside the domain of the target width.
    #[error("{name} is out of range [{lower}, {upper}]: {value}")]
    OutOfRange {
        /// Name of the offending expression.
        name: &'static str,
        /// The rejected value.
        value: i128,
        /// Inclusive lower bound.
        lower: i128,
        /// Inclusive upper bound.
        upper: i128,
    },
    /// A character that the requested charset cannot represent.
    #[error("cannot encode {character:?} as {charset}")]
    Encoding {
        /// The offending character.
        character: char,
        /// Name of the target charset.
        charset: &'static str,
    },
    /// A byte that the requested charset does not define.
    #[error("cannot decode byte {byte:#04x} as {charset}")]
    Decoding {
        /// The offending byte.
        byte: u8,
        /// Name of the source charset.
        charset: &'static str,
    },
    /// Bytes that are not valid UTF-8.
    #[error("string parse error: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    /// The compression backend failed.
    #[cfg(feature = "compression")]
    #[error("compression error: {0}")]
    Compression(#[from] std::io::Error),
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let cases = [
            (
                CursorError::OutOfBounds {
                    position: 2,
                    requested: 4,
                    available: 2,
                },
                "out of bounds: 4 bytes requested at position 2, 2 available",
            ),
            (
                CursorError::Encoding {
                    character: 'é',
                    charset: "ascii",
                },
                "cannot encode 'é' as ascii",
            ),
            (
                CursorError::Decoding {
                    byte: 0xE9,
                    charset: "ascii",
                },
                "cannot decode byte 0xe9 as ascii",
            ),
            (
                CursorError::InvalidUtf8(
                    #[allow(unknown_lints, invalid_from_utf8)]
                    std::str::from_utf8(b"\xFF\xFF").unwrap_err(),
                ),
                "string parse error: invalid utf-8 sequence of 1 bytes from index 0",
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }
}
