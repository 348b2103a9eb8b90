use std::sync::Arc;

use amf::amf3::{read_u29, write_u29};
use amf::{
    AmfDate, AmfDictionary, AmfReadError, AmfValue, AmfWriteError, CodecConfig, CursorBufferAmfExt,
    ErrorKind, ReferenceMode, decode, decode_with_config, encode, encode_with_config,
};
use bytes::Bytes;
use bytes_util::{CompressionAlgorithm, CursorBuffer, Endianness, ObjectEncoding};

macro_rules! init_test_tracing {
    () => {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();
    };
}

fn sample() -> AmfValue {
    let shared = AmfValue::object([("id", AmfValue::Number(7.0))]);

    AmfValue::object([
        ("undefined", AmfValue::Undefined),
        ("null", AmfValue::Null),
        ("flag", AmfValue::Boolean(true)),
        ("number", AmfValue::Number(-0.25)),
        ("text", AmfValue::from("héllo")),
        ("empty", AmfValue::from("")),
        ("date", AmfValue::Date(AmfDate::from_millis(1_700_000_000_000.0))),
        (
            "list",
            AmfValue::array([AmfValue::Number(1.0), AmfValue::from("text"), shared.clone()]),
        ),
        (
            "map",
            AmfValue::ecma_array([("0", AmfValue::Null), ("5", AmfValue::Boolean(false))]),
        ),
        ("again", shared),
        (
            "typed",
            AmfValue::typed_object("com.example.Point", [("x", AmfValue::Number(1.5))]),
        ),
    ])
}

#[test]
fn round_trip_amf0() {
    init_test_tracing!();

    let value = sample();
    let bytes = encode(&value, ObjectEncoding::Amf0).unwrap();
    let (decoded, consumed) = decode(&bytes, ObjectEncoding::Amf0).unwrap();

    assert_eq!(decoded, value);
    assert_eq!(consumed, bytes.len());
}

#[test]
fn round_trip_amf3() {
    init_test_tracing!();

    let value = sample();
    let bytes = encode(&value, ObjectEncoding::Amf3).unwrap();
    let (decoded, consumed) = decode(&bytes, ObjectEncoding::Amf3).unwrap();

    assert_eq!(decoded, value);
    assert_eq!(consumed, bytes.len());
}

#[test]
fn round_trip_amf3_only_types() {
    let value = AmfValue::array([
        AmfValue::Integer(-5),
        AmfValue::ByteArray(Bytes::from_static(b"\x00\x01\x02")),
        AmfValue::from(AmfDictionary {
            weak_keys: true,
            entries: vec![
                (AmfValue::Integer(1), AmfValue::from("one")),
                (AmfValue::object([("k", AmfValue::Null)]), AmfValue::Null),
            ],
        }),
    ]);

    let bytes = encode(&value, ObjectEncoding::Amf3).unwrap();
    assert_eq!(decode(&bytes, ObjectEncoding::Amf3).unwrap().0, value);
}

#[test]
fn amf0_embeds_amf3_values() {
    let value = AmfValue::object([(
        "payload",
        AmfValue::ByteArray(Bytes::from_static(b"raw")),
    )]);

    let bytes = encode(&value, ObjectEncoding::Amf0).unwrap();
    assert!(bytes.contains(&0x11));
    assert_eq!(decode(&bytes, ObjectEncoding::Amf0).unwrap().0, value);
}

#[test]
fn decoded_references_share_identity() {
    let shared = AmfValue::array([AmfValue::Null]);
    let value = AmfValue::array([shared.clone(), shared]);

    for format in [ObjectEncoding::Amf0, ObjectEncoding::Amf3] {
        let bytes = encode(&value, format).unwrap();
        let (AmfValue::Array(values), _) = decode(&bytes, format).unwrap() else {
            panic!("expected an array");
        };
        match (&values[0], &values[1]) {
            (AmfValue::Array(a), AmfValue::Array(b)) => assert!(Arc::ptr_eq(a, b)),
            other => panic!("unexpected values: {other:?}"),
        }
    }
}

#[test]
fn u29_boundaries() {
    let cases = [
        (0x7f, 1),
        (0x80, 2),
        (0x3fff, 2),
        (0x4000, 3),
        (0x1f_ffff, 3),
        (0x20_0000, 4),
        (0x3fff_ffff, 4),
    ];

    for (value, len) in cases {
        let mut buffer = CursorBuffer::new();
        write_u29(&mut buffer, value).unwrap();
        assert_eq!(buffer.len(), len, "length of {value:#x}");

        buffer.reset();
        read_u29(&mut buffer).unwrap();
        assert_eq!(buffer.position(), len);
    }

    let mut buffer = CursorBuffer::new();
    let err = write_u29(&mut buffer, 0x4000_0000).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);
}

#[test]
fn amf0_reference_dedup() {
    let object = AmfValue::object([("name", AmfValue::from("value"))]);
    let shared = AmfValue::array([object.clone(), object.clone()]);
    let copies = AmfValue::array([
        object.clone(),
        AmfValue::object([("name", AmfValue::from("value"))]),
    ]);

    let shared_bytes = encode(&shared, ObjectEncoding::Amf0).unwrap();
    let copies_bytes = encode(&copies, ObjectEncoding::Amf0).unwrap();

    // the second element is a reference to index 1, the array being index 0
    assert_eq!(&shared_bytes[shared_bytes.len() - 3..], &[0x07, 0x00, 0x01]);
    assert!(shared_bytes.len() < copies_bytes.len());

    // structural mode treats equal copies as the same value
    let config = CodecConfig::builder()
        .reference_mode(ReferenceMode::Structural)
        .build();
    let structural = encode_with_config(&copies, ObjectEncoding::Amf0, config).unwrap();
    assert_eq!(structural, shared_bytes);
}

#[test]
fn amf3_reference_dedup() {
    let object = AmfValue::object([("name", AmfValue::from("value"))]);
    let shared = AmfValue::array([object.clone(), object.clone()]);
    let copies = AmfValue::array([
        object,
        AmfValue::object([("name", AmfValue::from("value"))]),
    ]);

    let shared_bytes = encode(&shared, ObjectEncoding::Amf3).unwrap();
    let copies_bytes = encode(&copies, ObjectEncoding::Amf3).unwrap();

    assert_eq!(&shared_bytes[shared_bytes.len() - 2..], &[0x0a, 0x02]);
    assert!(shared_bytes.len() < copies_bytes.len());

    let config = CodecConfig::builder()
        .reference_mode(ReferenceMode::Structural)
        .build();
    let structural = encode_with_config(&copies, ObjectEncoding::Amf3, config).unwrap();
    assert_eq!(structural, shared_bytes);
}

#[test]
fn strict_and_associative_arrays() {
    let dense = AmfValue::from_indexed([
        (0, AmfValue::Number(1.0)),
        (1, AmfValue::Number(2.0)),
        (2, AmfValue::Number(3.0)),
    ]);
    let sparse = AmfValue::from_indexed([(0, AmfValue::Number(1.0)), (2, AmfValue::Number(3.0))]);

    assert_eq!(encode(&dense, ObjectEncoding::Amf0).unwrap()[0], 0x0a);
    assert_eq!(encode(&sparse, ObjectEncoding::Amf0).unwrap()[0], 0x08);

    let bytes = encode(&sparse, ObjectEncoding::Amf0).unwrap();
    assert_eq!(decode(&bytes, ObjectEncoding::Amf0).unwrap().0, sparse);
}

#[test]
fn amf0_object_stops_at_end_marker() {
    let mut bytes = vec![0x03, 0x00, 0x01, b'a', 0x05, 0x00, 0x00, 0x09];
    bytes.extend_from_slice(&[0x05, 0x05]);

    let (value, consumed) = decode(&bytes, ObjectEncoding::Amf0).unwrap();
    assert_eq!(value, AmfValue::object([("a", AmfValue::Null)]));
    assert_eq!(consumed, 8);
}

#[test]
fn amf3_object_stops_at_empty_key() {
    let bytes = [0x0a, 0x0b, 0x01, 0x03, b'a', 0x01, 0x01, 0x01];

    let (value, consumed) = decode(&bytes, ObjectEncoding::Amf3).unwrap();
    assert_eq!(value, AmfValue::object([("a", AmfValue::Null)]));
    assert_eq!(consumed, 7);
}

#[test]
fn bounds_failure_keeps_position() {
    let mut buffer = CursorBuffer::from_slice(&[0x01, 0x02]);
    let err = buffer.read_u32().unwrap_err();
    assert_eq!(AmfReadError::from(err).kind(), ErrorKind::Bounds);
    assert_eq!(buffer.position(), 0);

    let mut buffer = CursorBuffer::from_slice(&[0x00, 0x40, 0x45]);
    buffer.set_object_encoding(ObjectEncoding::Amf0);
    let err = buffer.read_object().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Bounds);
    assert_eq!(buffer.position(), 0);
}

#[test]
fn end_to_end_scenarios() {
    let bytes = encode(&AmfValue::Number(42.5), ObjectEncoding::Amf0).unwrap();
    let mut expected = vec![0x00];
    expected.extend_from_slice(&42.5_f64.to_be_bytes());
    assert_eq!(bytes.as_ref(), expected.as_slice());
    assert_eq!(
        decode(&bytes, ObjectEncoding::Amf0).unwrap(),
        (AmfValue::Number(42.5), 9)
    );

    let bytes = encode(&AmfValue::Integer(100), ObjectEncoding::Amf3).unwrap();
    assert_eq!(bytes.as_ref(), &[0x04, 0x64]);

    let bytes = encode(&AmfValue::Integer(-1), ObjectEncoding::Amf3).unwrap();
    assert_eq!(bytes.as_ref(), &[0x04, 0xff, 0xff, 0xff, 0xff]);
    assert_eq!(
        decode(&bytes, ObjectEncoding::Amf3).unwrap().0,
        AmfValue::Integer(-1)
    );
}

#[test]
fn little_endian_buffer_still_writes_network_order() {
    let mut buffer = CursorBuffer::new();
    buffer.set_endianness(Endianness::Little);
    buffer.set_object_encoding(ObjectEncoding::Amf0);

    buffer.write_object(&AmfValue::Number(1.0)).unwrap();
    buffer.write_u16(0x0102).unwrap();

    assert_eq!(&buffer.as_bytes()[1..9], &1.0_f64.to_be_bytes());
    assert_eq!(&buffer.as_bytes()[9..], &[0x02, 0x01]);
}

#[test]
fn failed_encode_leaves_buffer_untouched() {
    let mut buffer = CursorBuffer::new();
    buffer.write_object(&AmfValue::Null).unwrap();

    let bad = AmfValue::array([AmfValue::Number(1.0), AmfValue::XmlDocument("<x/>".into())]);
    let err = buffer.write_object(&bad).unwrap_err();

    assert!(matches!(err, AmfWriteError::UnsupportedType { .. }));
    assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
    assert_eq!(buffer.as_bytes(), &[0x01]);
    assert_eq!(buffer.position(), 1);
}

#[test]
fn nesting_limit_applies_to_both_directions() {
    let mut value = AmfValue::Null;
    for _ in 0..10 {
        value = AmfValue::array([value]);
    }

    let tight = CodecConfig::builder().max_depth(5).build();
    for format in [ObjectEncoding::Amf0, ObjectEncoding::Amf3] {
        let err = encode_with_config(&value, format, tight.clone()).unwrap_err();
        assert!(matches!(err, AmfWriteError::NestingTooDeep(5)));

        let bytes = encode(&value, format).unwrap();
        let err = decode_with_config(&bytes, format, tight.clone()).unwrap_err();
        assert!(matches!(err, AmfReadError::NestingTooDeep(5)));
    }
}

#[test]
fn compressed_payload_round_trip() {
    let value = sample();
    let bytes = encode(&value, ObjectEncoding::Amf3).unwrap();

    for algorithm in [
        CompressionAlgorithm::Deflate,
        CompressionAlgorithm::Zlib,
        CompressionAlgorithm::Lzma,
    ] {
        let mut buffer = CursorBuffer::from_bytes(bytes.clone());
        buffer.compress(algorithm).unwrap();
        buffer.uncompress(algorithm).unwrap();

        assert_eq!(buffer.read_object().unwrap(), value);
    }
}
