//! Concrete end-to-end NetworkMessage scenarios.
//!
//! Each test here builds a specific message shape and checks either the
//! exact wire bytes produced or the exact failure mode on a boundary input,
//! rather than just round-tripping. Property-based round-trip coverage
//! lives in `roundtrip_properties.rs`.

use pubsub_proto::{
    BinaryDecode, BinaryEncode, BuiltinTypeId, CodecConfig, Cursor, DataSetMessage, DataSetMessageHeader,
    DataSetMessagePayload, DataValue, ExtensionObject, FieldEncoding, FieldValue, Guid, GroupHeader,
    JsonCodecContext, LocalizedText, NetworkMessage, NodeId, PayloadHeader, ProtocolError, PublisherId, Reader,
    ScalarValue, UaString, Variant, decode_network_message, encode_network_message,
};

fn minimal_message(fields: Vec<FieldValue>) -> NetworkMessage {
    NetworkMessage {
        version: 1,
        publisher_id: None,
        dataset_class_id: None,
        chunk_message: false,
        group_header: None,
        payload_header: None,
        security_header: None,
        timestamp: None,
        picoseconds: None,
        promoted_fields: None,
        dataset_messages: vec![DataSetMessage {
            header: DataSetMessageHeader { valid: true, ..Default::default() },
            field_encoding: FieldEncoding::Variant,
            payload: DataSetMessagePayload::KeyFrame(fields),
        }],
        security_footer: Vec::new(),
    }
}

/// S1 — minimal keyframe, single UInt32 field, VARIANT encoding.
#[test]
fn s1_minimal_keyframe_exact_bytes() {
    let msg = minimal_message(vec![FieldValue::Variant(Variant::Scalar(ScalarValue::UInt32(27)))]);
    let mut buf = vec![0u8; msg.calc_size()];
    let mut w = Cursor::writer(&mut buf);
    msg.encode(&mut w).unwrap();

    assert_eq!(buf[0], 0x01); // UADP byte: version=1, no other flags
    // byte 1: DataSetFlags1 (valid=1, field_encoding=00, flags2_enabled=1)
    // byte 2: DataSetFlags2 (message_type=KeyFrame=00)
    assert_eq!(&buf[3..5], &[0x01, 0x00]); // field count = 1
    assert_eq!(buf[5], BuiltinTypeId::UInt32 as u8); // Variant type tag
    assert_eq!(&buf[6..10], &27u32.to_le_bytes());

    let mut r = Reader::new(&buf);
    assert_eq!(NetworkMessage::decode(&mut r).unwrap(), msg);
}

/// S2 — two datasets, VARIANT then DATAVALUE, with both per-message size
/// prefixes written contiguously ahead of both dataset message bodies.
#[test]
fn s2_two_datasets_variant_then_datavalue() {
    let msg = NetworkMessage {
        version: 1,
        publisher_id: None,
        dataset_class_id: None,
        chunk_message: false,
        group_header: None,
        payload_header: Some(PayloadHeader { dataset_writer_ids: vec![4, 7] }),
        security_header: None,
        timestamp: None,
        picoseconds: None,
        promoted_fields: None,
        dataset_messages: vec![
            DataSetMessage {
                header: DataSetMessageHeader { valid: true, ..Default::default() },
                field_encoding: FieldEncoding::Variant,
                payload: DataSetMessagePayload::KeyFrame(vec![FieldValue::Variant(Variant::Scalar(
                    ScalarValue::UInt32(27),
                ))]),
            },
            DataSetMessage {
                header: DataSetMessageHeader { valid: true, ..Default::default() },
                field_encoding: FieldEncoding::DataValue,
                payload: DataSetMessagePayload::KeyFrame(vec![
                    FieldValue::DataValue(DataValue {
                        value: Some(Variant::Scalar(ScalarValue::Guid(Guid::from_parts(1, 2, 3, [0; 8])))),
                        ..Default::default()
                    }),
                    FieldValue::DataValue(DataValue {
                        value: Some(Variant::Scalar(ScalarValue::Int64(152_478_978_534))),
                        ..Default::default()
                    }),
                ]),
            },
        ],
        security_footer: Vec::new(),
    };

    let mut buf = vec![0u8; msg.calc_size()];
    let mut w = Cursor::writer(&mut buf);
    msg.encode(&mut w).unwrap();

    let mut r = Reader::new(&buf);
    assert_eq!(NetworkMessage::decode(&mut r).unwrap(), msg);

    // Both dataset messages' sizes are written as one contiguous 4-byte
    // block (2 x u16) before either body follows.
    let first_size = msg.dataset_messages[0].calc_size();
    let second_size = msg.dataset_messages[1].calc_size();
    let header_and_payload_prefix = 1 + 1 + 2 * 2; // UADP byte + writer-count byte + 2 u16 ids
    let sizes_block = &buf[header_and_payload_prefix..header_and_payload_prefix + 4];
    assert_eq!(u16::from_le_bytes([sizes_block[0], sizes_block[1]]) as usize, first_size);
    assert_eq!(u16::from_le_bytes([sizes_block[2], sizes_block[3]]) as usize, second_size);
    // Both bodies follow the sizes block back-to-back, with nothing
    // interleaved between them.
    let first_body_start = header_and_payload_prefix + 4;
    assert_eq!(buf.len(), first_body_start + first_size + second_size);
}

/// S3 — encode into a buffer 5 bytes shorter than `calc_size`; expect
/// BUFFER_TOO_SMALL and no partial state observable on a later, correctly
/// sized encode.
#[test]
fn s3_undersized_buffer_fails_cleanly() {
    let msg = minimal_message(vec![FieldValue::Variant(Variant::Scalar(ScalarValue::UInt32(27)))]);
    let full_size = msg.calc_size();

    let mut short_buf = vec![0u8; full_size - 5];
    let mut w = Cursor::writer(&mut short_buf);
    assert!(matches!(msg.encode(&mut w), Err(ProtocolError::BufferTooSmall { .. })));

    let mut buf = vec![0u8; full_size];
    let mut w = Cursor::writer(&mut buf);
    msg.encode(&mut w).unwrap();
    let mut r = Reader::new(&buf);
    assert_eq!(NetworkMessage::decode(&mut r).unwrap(), msg);
}

/// S4 — JSON round-trip of a keyframe carrying a LocalizedText field.
#[test]
fn s4_json_round_trip_with_localized_text() {
    let cfg = CodecConfig::default();
    let ctx = JsonCodecContext::new(&cfg);

    let msg = NetworkMessage {
        version: 1,
        publisher_id: None,
        dataset_class_id: None,
        chunk_message: false,
        group_header: None,
        payload_header: Some(PayloadHeader { dataset_writer_ids: vec![3] }),
        security_header: None,
        timestamp: None,
        picoseconds: None,
        promoted_fields: None,
        dataset_messages: vec![DataSetMessage {
            header: DataSetMessageHeader { valid: true, ..Default::default() },
            field_encoding: FieldEncoding::Variant,
            payload: DataSetMessagePayload::KeyFrame(vec![FieldValue::Variant(Variant::Scalar(
                ScalarValue::LocalizedText(LocalizedText {
                    locale: UaString::from("en-US"),
                    text: UaString::from("hello"),
                }),
            ))]),
        }],
        security_footer: Vec::new(),
    };

    let json = encode_network_message(&msg, "11111111-1111-1111-1111-111111111111", &ctx).unwrap();
    assert_eq!(json["MessageType"], "ua-data");
    assert_eq!(json["Messages"][0]["DataSetWriterId"], 3);
    assert_eq!(json["Messages"][0]["Payload"]["0"]["Body"]["Locale"], "en-US");
    assert_eq!(json["Messages"][0]["Payload"]["0"]["Body"]["Text"], "hello");

    let ctx = JsonCodecContext::with_dataset_writer_ids(&cfg, &[3]);
    let decoded = decode_network_message(&json, &ctx).unwrap();
    assert_eq!(decoded.payload_header, msg.payload_header);
    match &decoded.dataset_messages[0].payload {
        DataSetMessagePayload::KeyFrame(fields) => {
            assert_eq!(fields.len(), 1);
        },
        other => panic!("expected KeyFrame, got {other:?}"),
    }
}

/// S5 — RT offset path: build a keyframe with two UInt32 fields, mutate
/// both in place via the offset table, and confirm the header bytes are
/// untouched while only the two field values changed.
#[test]
fn s5_rt_offset_path_mutates_only_the_changed_fields() {
    use pubsub_proto::{OffsetKind, OffsetTable};

    let msg = minimal_message(vec![
        FieldValue::Variant(Variant::Scalar(ScalarValue::UInt32(1000))),
        FieldValue::Variant(Variant::Scalar(ScalarValue::UInt32(2000))),
    ]);

    let mut table = OffsetTable::new();
    table.calculate_and_record_offsets(&msg).unwrap();
    table.activate().unwrap();

    let mut buf = vec![0u8; table.total_size()];
    let mut w = Cursor::writer(&mut buf);
    msg.encode(&mut w).unwrap();
    let original_header = buf[..5].to_vec();

    table.write_in_place(&mut buf, OffsetKind::KeyframeField { index: 0, field: 0 }, &1001u32.to_le_bytes()).unwrap();
    table.write_in_place(&mut buf, OffsetKind::KeyframeField { index: 0, field: 1 }, &2001u32.to_le_bytes()).unwrap();

    assert_eq!(&buf[..5], &original_header[..]);

    let mut r = Reader::new(&buf);
    let decoded = NetworkMessage::decode(&mut r).unwrap();
    match &decoded.dataset_messages[0].payload {
        DataSetMessagePayload::KeyFrame(fields) => {
            assert_eq!(fields[0], FieldValue::Variant(Variant::Scalar(ScalarValue::UInt32(1001))));
            assert_eq!(fields[1], FieldValue::Variant(Variant::Scalar(ScalarValue::UInt32(2001))));
        },
        other => panic!("expected KeyFrame, got {other:?}"),
    }
}

/// S6 — a custom structured type wrapped in an ExtensionObject round-trips
/// under both binary and JSON.
#[test]
fn s6_custom_extension_object_round_trips_binary_and_json() {
    // A Point{x,y,z: f32} encoded as its binary body.
    let mut body = Vec::with_capacity(12);
    body.extend_from_slice(&1.5f32.to_le_bytes());
    body.extend_from_slice(&2.5f32.to_le_bytes());
    body.extend_from_slice(&3.5f32.to_le_bytes());
    let point_type = NodeId::numeric(2, 100);
    let ext = ExtensionObject::with_binary_body(point_type.clone(), body);

    let msg = minimal_message(vec![FieldValue::Variant(Variant::Scalar(ScalarValue::ExtensionObject(
        ext.clone(),
    )))]);
    let mut buf = vec![0u8; msg.calc_size()];
    let mut w = Cursor::writer(&mut buf);
    msg.encode(&mut w).unwrap();
    let mut r = Reader::new(&buf);
    assert_eq!(NetworkMessage::decode(&mut r).unwrap(), msg);

    let mut cfg = CodecConfig::default();
    cfg.custom_types.push(pubsub_proto::TypeDescriptor {
        type_id: point_type,
        name: "Point".into(),
        fields: vec![
            pubsub_proto::CustomTypeField { name: "x".into(), kind: BuiltinTypeId::Float },
            pubsub_proto::CustomTypeField { name: "y".into(), kind: BuiltinTypeId::Float },
            pubsub_proto::CustomTypeField { name: "z".into(), kind: BuiltinTypeId::Float },
        ],
    });

    // The registered schema recovers the struct's named fields recursively,
    // bit-exactly, rather than leaving the body as an opaque blob.
    let fields = ext.decode_typed(&cfg).unwrap().expect("Point is registered with a field schema");
    assert_eq!(fields, vec![
        ("x".to_string(), ScalarValue::Float(1.5)),
        ("y".to_string(), ScalarValue::Float(2.5)),
        ("z".to_string(), ScalarValue::Float(3.5)),
    ]);

    let ctx = JsonCodecContext::new(&cfg);
    let json = encode_network_message(&msg, "11111111-1111-1111-1111-111111111111", &ctx).unwrap();
    assert_eq!(json["Messages"][0]["Payload"]["0"]["Body"]["TypeId"], "Point");
    assert_eq!(json["Messages"][0]["Payload"]["0"]["Body"]["Body"]["x"], 1.5);
    assert_eq!(json["Messages"][0]["Payload"]["0"]["Body"]["Body"]["y"], 2.5);
    assert_eq!(json["Messages"][0]["Payload"]["0"]["Body"]["Body"]["z"], 3.5);
}

/// Property 8: a DELTAFRAME with a zero field count encodes to a header
/// plus the two-byte zero count and decodes back to an empty pair list.
#[test]
fn deltaframe_with_zero_fields_round_trips() {
    let msg = DataSetMessage {
        header: DataSetMessageHeader { valid: true, ..Default::default() },
        field_encoding: FieldEncoding::Variant,
        payload: DataSetMessagePayload::DeltaFrame(vec![]),
    };
    let mut buf = vec![0u8; msg.calc_size()];
    let mut w = Cursor::writer(&mut buf);
    msg.encode(&mut w).unwrap();
    assert_eq!(buf.len(), 4); // 2 flag bytes + 2-byte zero count
    assert_eq!(&buf[2..], &[0x00, 0x00]);

    let mut r = Reader::new(&buf);
    let decoded = DataSetMessage::decode(&mut r).unwrap();
    match decoded.payload {
        DataSetMessagePayload::DeltaFrame(pairs) => assert!(pairs.is_empty()),
        other => panic!("expected DeltaFrame, got {other:?}"),
    }
}

/// Property 9: `payload_header_enabled = true` with a single writer id
/// omits the per-message size-prefix array on both encode and decode.
#[test]
fn single_dataset_writer_id_omits_size_prefix() {
    let msg = NetworkMessage {
        version: 1,
        publisher_id: None,
        dataset_class_id: None,
        chunk_message: false,
        group_header: None,
        payload_header: Some(PayloadHeader { dataset_writer_ids: vec![9] }),
        security_header: None,
        timestamp: None,
        picoseconds: None,
        promoted_fields: None,
        dataset_messages: vec![DataSetMessage {
            header: DataSetMessageHeader { valid: true, ..Default::default() },
            field_encoding: FieldEncoding::Variant,
            payload: DataSetMessagePayload::KeyFrame(vec![FieldValue::Variant(Variant::Scalar(
                ScalarValue::Boolean(true),
            ))]),
        }],
        security_footer: Vec::new(),
    };

    let inner_size = msg.dataset_messages[0].calc_size();
    // UADP byte + writer-count byte + one u16 writer id, then straight into
    // the single dataset message with no size prefix.
    assert_eq!(msg.calc_size(), 1 + 1 + 2 + inner_size);

    let mut buf = vec![0u8; msg.calc_size()];
    let mut w = Cursor::writer(&mut buf);
    msg.encode(&mut w).unwrap();
    let mut r = Reader::new(&buf);
    assert_eq!(NetworkMessage::decode(&mut r).unwrap(), msg);
}

/// Group header, publisher id, and sequencing fields all present at once;
/// exercises the full header phase before any security or promoted fields.
#[test]
fn full_group_header_round_trips() {
    let msg = NetworkMessage {
        version: 1,
        publisher_id: Some(PublisherId::String(UaString::from("publisher-1"))),
        dataset_class_id: Some(Guid::from_parts(9, 9, 9, [9; 8])),
        chunk_message: false,
        group_header: Some(GroupHeader {
            writer_group_id: Some(11),
            group_version: Some(42),
            network_message_number: Some(1),
            sequence_number: Some(0),
        }),
        payload_header: None,
        security_header: None,
        timestamp: None,
        picoseconds: None,
        promoted_fields: None,
        dataset_messages: vec![DataSetMessage {
            header: DataSetMessageHeader { valid: true, ..Default::default() },
            field_encoding: FieldEncoding::Variant,
            payload: DataSetMessagePayload::KeepAlive,
        }],
        security_footer: Vec::new(),
    };
    let mut buf = vec![0u8; msg.calc_size()];
    let mut w = Cursor::writer(&mut buf);
    msg.encode(&mut w).unwrap();
    let mut r = Reader::new(&buf);
    assert_eq!(NetworkMessage::decode(&mut r).unwrap(), msg);
}
