//! `proptest` strategies for generating `NetworkMessage` values across the
//! subset of shapes the codec fully supports, so property tests can cover
//! header framing, field encodings, and payload counts without hand-writing
//! every combination.

use proptest::collection::vec;
use proptest::prelude::*;
use pubsub_proto::{
    DataSetMessage, DataSetMessageHeader, DataSetMessagePayload, DataValue, DiagnosticInfo, ExpandedNodeId,
    FieldEncoding, FieldValue, GroupHeader, NetworkMessage, NodeId, PayloadHeader, PublisherId, ScalarValue,
    StatusCode, UaString, Variant,
};

/// A scalar with no recursive structure of its own, used as the leaf case
/// inside the strategies for the variants that nest a `Variant`/`DataValue`,
/// so the generator terminates instead of recursing forever.
fn leaf_scalar_value_strategy() -> impl Strategy<Value = ScalarValue> {
    prop_oneof![
        any::<bool>().prop_map(ScalarValue::Boolean),
        any::<i32>().prop_map(ScalarValue::Int32),
        any::<f64>().prop_filter("NaN compares unequal to itself", |v| !v.is_nan()).prop_map(ScalarValue::Double),
        "[a-zA-Z0-9 ]{0,16}".prop_map(|s| ScalarValue::String(UaString::from(s))),
    ]
}

fn expanded_node_id_strategy() -> impl Strategy<Value = ExpandedNodeId> {
    (0u16..4, 0u32..1000, proptest::option::of("[a-z]{3,8}"), proptest::option::of(any::<u32>())).prop_map(
        |(namespace_index, id, namespace_uri, server_index)| ExpandedNodeId {
            node_id: NodeId::numeric(namespace_index, id),
            namespace_uri: namespace_uri.map(UaString::from),
            server_index,
        },
    )
}

fn diagnostic_info_strategy() -> impl Strategy<Value = DiagnosticInfo> {
    (
        proptest::option::of(any::<i32>()),
        proptest::option::of(any::<i32>()),
        proptest::option::of(any::<i32>()),
        proptest::option::of(any::<i32>()),
        proptest::option::of("[a-zA-Z0-9 ]{0,16}"),
        proptest::option::of(any::<u32>()),
    )
        .prop_map(
            |(symbolic_id, namespace_uri, locale, localized_text, additional_info, inner_status_code)| {
                DiagnosticInfo {
                    symbolic_id,
                    namespace_uri,
                    locale,
                    localized_text,
                    additional_info: additional_info.map(UaString::from),
                    inner_status_code: inner_status_code.map(StatusCode),
                    inner_diagnostic_info: None,
                }
            },
        )
}

fn data_value_strategy() -> impl Strategy<Value = DataValue> {
    leaf_scalar_value_strategy()
        .prop_map(|scalar| DataValue { value: Some(Variant::Scalar(scalar)), ..Default::default() })
}

fn nested_variant_strategy() -> impl Strategy<Value = Variant> {
    leaf_scalar_value_strategy().prop_map(Variant::Scalar)
}

/// One of the fixed-width scalar shapes the offset table can address, plus
/// a spread of the variable-width and recursive ones so round-trip coverage
/// isn't limited to what the realtime path can mutate in place.
pub fn scalar_value_strategy() -> impl Strategy<Value = ScalarValue> {
    prop_oneof![
        any::<bool>().prop_map(ScalarValue::Boolean),
        any::<i8>().prop_map(ScalarValue::SByte),
        any::<u8>().prop_map(ScalarValue::Byte),
        any::<i16>().prop_map(ScalarValue::Int16),
        any::<u16>().prop_map(ScalarValue::UInt16),
        any::<i32>().prop_map(ScalarValue::Int32),
        any::<u32>().prop_map(ScalarValue::UInt32),
        any::<i64>().prop_map(ScalarValue::Int64),
        any::<u64>().prop_map(ScalarValue::UInt64),
        any::<f32>().prop_filter("NaN compares unequal to itself", |v| !v.is_nan()).prop_map(ScalarValue::Float),
        any::<f64>().prop_filter("NaN compares unequal to itself", |v| !v.is_nan()).prop_map(ScalarValue::Double),
        "[a-zA-Z0-9 ]{0,32}".prop_map(|s| ScalarValue::String(UaString::from(s))),
        expanded_node_id_strategy().prop_map(ScalarValue::ExpandedNodeId),
        data_value_strategy().prop_map(|dv| ScalarValue::DataValue(Box::new(dv))),
        nested_variant_strategy().prop_map(|v| ScalarValue::Variant(Box::new(v))),
        diagnostic_info_strategy().prop_map(ScalarValue::DiagnosticInfo),
    ]
}

fn field_value_strategy(encoding: FieldEncoding) -> impl Strategy<Value = FieldValue> {
    scalar_value_strategy().prop_map(move |scalar| match encoding {
        FieldEncoding::Variant | FieldEncoding::Raw => FieldValue::Variant(Variant::Scalar(scalar)),
        FieldEncoding::DataValue => {
            FieldValue::DataValue(pubsub_proto::DataValue { value: Variant::Scalar(scalar), ..Default::default() })
        },
    })
}

fn dataset_message_strategy() -> impl Strategy<Value = DataSetMessage> {
    prop_oneof![Just(FieldEncoding::Variant), Just(FieldEncoding::DataValue)].prop_flat_map(|encoding| {
        vec(field_value_strategy(encoding), 0..6).prop_map(move |fields| DataSetMessage {
            header: DataSetMessageHeader { valid: true, ..Default::default() },
            field_encoding: encoding,
            payload: DataSetMessagePayload::KeyFrame(fields),
        })
    })
}

/// A `NetworkMessage` carrying between one and four key-frame dataset
/// messages, each with variant or datavalue fields, exercising the
/// `PayloadHeader`/size-prefix tie-break rules from both sides.
pub fn network_message_strategy() -> impl Strategy<Value = NetworkMessage> {
    vec(dataset_message_strategy(), 1..5).prop_map(|dataset_messages| {
        let writer_ids: Vec<u16> = (0..dataset_messages.len() as u16).collect();
        let payload_header =
            if dataset_messages.len() > 1 { Some(PayloadHeader { dataset_writer_ids: writer_ids }) } else { None };
        NetworkMessage {
            version: 1,
            publisher_id: Some(PublisherId::UInt16(7)),
            dataset_class_id: None,
            chunk_message: false,
            group_header: Some(GroupHeader {
                writer_group_id: Some(1),
                group_version: Some(1),
                network_message_number: None,
                sequence_number: None,
            }),
            payload_header,
            security_header: None,
            timestamp: None,
            picoseconds: None,
            promoted_fields: None,
            dataset_messages,
            security_footer: Vec::new(),
        }
    })
}
