use num_derive::FromPrimitive;

/// AMF3 marker types.
/// Defined in amf-file-format-spec.pdf section 3.1
///
/// The vector markers (0x0d to 0x10) are deliberately absent, so they decode
/// as unknown markers.
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive)]
#[repr(u8)]
pub enum Amf3Marker {
    /// undefined-marker
    Undefined = 0x00,
    /// null-marker
    Null = 0x01,
    /// false-marker
    False = 0x02,
    /// true-marker
    True = 0x03,
    /// integer-marker
    Integer = 0x04,
    /// double-marker
    Double = 0x05,
    /// string-marker
    String = 0x06,
    /// xml-doc-marker
    ///
    /// not supported
    XmlDocument = 0x07,
    /// date-marker
    Date = 0x08,
    /// array-marker
    Array = 0x09,
    /// object-marker
    Object = 0x0a,
    /// xml-marker
    ///
    /// not supported
    Xml = 0x0b,
    /// byte-array-marker
    ByteArray = 0x0c,
    /// dictionary-marker
    Dictionary = 0x11,
}

/// Smallest integer written with the integer marker.
pub(crate) const INTEGER_MIN: i32 = -(1 << 28);
/// Largest integer written with the integer marker.
pub(crate) const INTEGER_MAX: i32 = (1 << 28) - 1;
/// Exclusive bound of lengths and counts that fit the 28 bit length field.
pub(crate) const MAX_LENGTH: usize = 1 << 28;

/// Header flag: the value is inline rather than a reference.
pub(crate) const INLINE: u32 = 0x01;
/// Object header for inline, dynamic traits with no sealed members.
pub(crate) const DYNAMIC_TRAITS: u32 = 0x0b;
/// Externalizable trait flag combination.
pub(crate) const EXTERNALIZABLE_TRAITS: u32 = 0x07;

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use num_traits::FromPrimitive;

    use super::*;

    #[test]
    fn test_marker_primitive() {
        let cases = [
            (Amf3Marker::Undefined, 0x00),
            (Amf3Marker::Null, 0x01),
            (Amf3Marker::False, 0x02),
            (Amf3Marker::True, 0x03),
            (Amf3Marker::Integer, 0x04),
            (Amf3Marker::Double, 0x05),
            (Amf3Marker::String, 0x06),
            (Amf3Marker::XmlDocument, 0x07),
            (Amf3Marker::Date, 0x08),
            (Amf3Marker::Array, 0x09),
            (Amf3Marker::Object, 0x0a),
            (Amf3Marker::Xml, 0x0b),
            (Amf3Marker::ByteArray, 0x0c),
            (Amf3Marker::Dictionary, 0x11),
        ];

        for (marker, value) in cases {
            assert_eq!(marker as u8, value);
            assert_eq!(Amf3Marker::from_u8(value), Some(marker));
        }

        for vector in 0x0d..=0x10 {
            assert!(Amf3Marker::from_u8(vector).is_none());
        }
        assert!(Amf3Marker::from_u8(0x12).is_none());
    }

    #[test]
    fn test_integer_range() {
        assert_eq!(INTEGER_MIN, -268_435_456);
        assert_eq!(INTEGER_MAX, 268_435_455);
        assert_eq!(MAX_LENGTH, 0x1000_0000);
    }
}
