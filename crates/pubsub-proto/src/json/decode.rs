//! Decoding a JSON PubSub envelope back into a [`NetworkMessage`].

use serde_json::Value;

use super::{base64_decode, JsonCodecContext};
use crate::dataset_message::{
    DataSetMessage, DataSetMessageHeader, DataSetMessagePayload, FieldEncoding, FieldValue, RawField,
};
use crate::datavalue::DataValue;
use crate::error::{ProtocolError, Result};
use crate::network_message::{NetworkMessage, PayloadHeader};
use crate::primitives::json_float_from_token;
use crate::types::{Guid, PublisherId, StatusCode, UaByteString, UaString};
use crate::variant::{BuiltinTypeId, ScalarValue, Variant, VariantDimensions};

fn require_object<'a>(value: &'a Value, what: &str) -> Result<&'a serde_json::Map<String, Value>> {
    value.as_object().ok_or_else(|| ProtocolError::Malformed(format!("{what} must be a JSON object")))
}

fn publisher_id_from_json(value: &Value) -> Result<PublisherId> {
    match value {
        Value::Number(n) => {
            let v = n.as_u64().ok_or_else(|| ProtocolError::Malformed("PublisherId must be a non-negative integer".into()))?;
            if v <= u64::from(u8::MAX) {
                Ok(PublisherId::Byte(v as u8))
            } else if v <= u64::from(u16::MAX) {
                Ok(PublisherId::UInt16(v as u16))
            } else if v <= u64::from(u32::MAX) {
                Ok(PublisherId::UInt32(v as u32))
            } else {
                Ok(PublisherId::UInt64(v))
            }
        },
        Value::String(s) => {
            if let Ok(guid) = Guid::parse(s) {
                Ok(PublisherId::Guid(guid))
            } else if let Ok(v) = s.parse::<u64>() {
                Ok(PublisherId::UInt64(v))
            } else {
                Ok(PublisherId::String(UaString::from(s.clone())))
            }
        },
        other => Err(ProtocolError::Malformed(format!("unsupported PublisherId JSON shape: {other}"))),
    }
}

/// Decode a `Variant`'s JSON body (`{Type, Body[, Dimensions]}`), or a bare
/// scalar field whose type is inferred from the JSON value's own shape when
/// no `Type`/`Body` wrapper is present (the compact, non-reversible form).
fn variant_from_json(value: &Value) -> Result<Variant> {
    if let Some(obj) = value.as_object() {
        if let (Some(type_tag), Some(body)) = (obj.get("Type"), obj.get("Body")) {
            let type_num =
                type_tag.as_u64().ok_or_else(|| ProtocolError::Malformed("Variant.Type must be an integer".into()))?;
            let type_id = BuiltinTypeId::from_tag(type_num as u8)?;
            return if let Some(elements) = body.as_array() {
                let scalars =
                    elements.iter().map(|e| scalar_from_json(type_id, e)).collect::<Result<Vec<_>>>()?;
                let dimensions = obj
                    .get("Dimensions")
                    .and_then(Value::as_array)
                    .map(|dims| dims.iter().filter_map(|d| d.as_u64().map(|v| v as u32)).collect());
                Ok(Variant::Array { elements: scalars, element_type: type_id, dimensions: VariantDimensions(dimensions) })
            } else {
                Ok(Variant::Scalar(scalar_from_json(type_id, body)?))
            };
        }
    }
    if value.is_null() {
        return Ok(Variant::Null);
    }
    // Compact form: infer a type from the JSON value's own shape.
    Ok(Variant::Scalar(match value {
        Value::Bool(b) => ScalarValue::Boolean(*b),
        Value::Number(n) if n.is_i64() || n.is_u64() => ScalarValue::Int32(n.as_i64().unwrap_or(0) as i32),
        Value::Number(n) => ScalarValue::Double(n.as_f64().unwrap_or(0.0)),
        Value::String(s) => ScalarValue::String(UaString::from(s.clone())),
        other => {
            return Err(ProtocolError::Malformed(format!("cannot infer Variant type from JSON value: {other}")))
        },
    }))
}

fn scalar_from_json(type_id: BuiltinTypeId, value: &Value) -> Result<ScalarValue> {
    let as_i64 = |v: &Value| v.as_i64().ok_or_else(|| ProtocolError::Malformed("expected integer".into()));
    let as_u64 = |v: &Value| v.as_u64().ok_or_else(|| ProtocolError::Malformed("expected unsigned integer".into()));
    Ok(match type_id {
        BuiltinTypeId::Boolean => ScalarValue::Boolean(
            value.as_bool().ok_or_else(|| ProtocolError::Malformed("expected boolean".into()))?,
        ),
        BuiltinTypeId::SByte => ScalarValue::SByte(as_i64(value)? as i8),
        BuiltinTypeId::Byte => ScalarValue::Byte(as_u64(value)? as u8),
        BuiltinTypeId::Int16 => ScalarValue::Int16(as_i64(value)? as i16),
        BuiltinTypeId::UInt16 => ScalarValue::UInt16(as_u64(value)? as u16),
        BuiltinTypeId::Int32 => ScalarValue::Int32(as_i64(value)? as i32),
        BuiltinTypeId::UInt32 => ScalarValue::UInt32(as_u64(value)? as u32),
        BuiltinTypeId::Int64 => ScalarValue::Int64(
            value
                .as_str()
                .and_then(|s| s.parse().ok())
                .or_else(|| value.as_i64())
                .ok_or_else(|| ProtocolError::Malformed("expected Int64 as string or number".into()))?,
        ),
        BuiltinTypeId::UInt64 => ScalarValue::UInt64(
            value
                .as_str()
                .and_then(|s| s.parse().ok())
                .or_else(|| value.as_u64())
                .ok_or_else(|| ProtocolError::Malformed("expected UInt64 as string or number".into()))?,
        ),
        BuiltinTypeId::Float => ScalarValue::Float(
            json_float_from_token(value).ok_or_else(|| ProtocolError::Malformed("expected float".into()))? as f32,
        ),
        BuiltinTypeId::Double => ScalarValue::Double(
            json_float_from_token(value).ok_or_else(|| ProtocolError::Malformed("expected double".into()))?,
        ),
        BuiltinTypeId::String => ScalarValue::String(match value {
            Value::Null => UaString::null(),
            Value::String(s) => UaString::from(s.clone()),
            other => return Err(ProtocolError::Malformed(format!("expected string, got {other}"))),
        }),
        BuiltinTypeId::Guid => ScalarValue::Guid(
            Guid::parse(value.as_str().ok_or_else(|| ProtocolError::Malformed("expected GUID string".into()))?)?,
        ),
        BuiltinTypeId::ByteString => ScalarValue::ByteString(match value {
            Value::Null => UaByteString::null(),
            Value::String(s) => UaByteString(Some(base64_decode(s)?)),
            other => return Err(ProtocolError::Malformed(format!("expected base64 string, got {other}"))),
        }),
        BuiltinTypeId::StatusCode => ScalarValue::StatusCode(StatusCode(as_u64(value)? as u32)),
        other => {
            return Err(ProtocolError::Unsupported(format!(
                "decoding Variant scalars of type {other:?} from JSON is not supported"
            )))
        },
    })
}

fn data_value_from_json(obj: &serde_json::Map<String, Value>) -> Result<DataValue> {
    let value = match obj.get("Value") {
        Some(v) => Some(variant_from_json(v)?),
        None => None,
    };
    let status = obj.get("Status").and_then(Value::as_u64).map(|v| StatusCode(v as u32));
    Ok(DataValue {
        value,
        status,
        source_timestamp: None,
        source_picoseconds: obj.get("SourcePicoseconds").and_then(Value::as_u64).map(|v| v as u16),
        server_timestamp: None,
        server_picoseconds: obj.get("ServerPicoseconds").and_then(Value::as_u64).map(|v| v as u16),
    })
}

fn field_value_from_json(value: &Value, field_encoding: FieldEncoding) -> Result<FieldValue> {
    match field_encoding {
        FieldEncoding::Variant => Ok(FieldValue::Variant(variant_from_json(value)?)),
        FieldEncoding::DataValue => {
            let obj = require_object(value, "DataValue field")?;
            Ok(FieldValue::DataValue(data_value_from_json(obj)?))
        },
        FieldEncoding::Raw => {
            let s = value.as_str().ok_or_else(|| ProtocolError::Malformed("raw field must be a base64 string".into()))?;
            Ok(FieldValue::Raw(RawField(base64_decode(s)?)))
        },
    }
}

fn dataset_message_from_json(value: &Value, ctx: &JsonCodecContext<'_>) -> Result<(Option<u16>, DataSetMessage)> {
    let obj = require_object(value, "DataSetMessage")?;
    ctx.charge_tokens(obj.len())?;

    let writer_id = obj.get("DataSetWriterId").and_then(Value::as_u64).map(|v| v as u16);
    let sequence_number = obj.get("SequenceNumber").and_then(Value::as_u64).map(|v| v as u16);
    let status = obj.get("Status").and_then(Value::as_u64).map(|v| StatusCode(v as u32));
    let (config_major_version, config_minor_version) = match obj.get("MetaDataVersion").and_then(Value::as_object) {
        Some(meta) => (
            meta.get("MajorVersion").and_then(Value::as_u64).map(|v| v as u32),
            meta.get("MinorVersion").and_then(Value::as_u64).map(|v| v as u32),
        ),
        None => (None, None),
    };

    let header = DataSetMessageHeader {
        valid: true,
        sequence_number,
        status,
        config_major_version,
        config_minor_version,
        timestamp: None,
        picoseconds: None,
    };

    // Field encoding cannot be recovered from JSON alone (unlike the binary
    // form it carries no flag byte); `Variant` is the only encoding this
    // decoder infers automatically, `DataValue` fields are detected by the
    // presence of a `Value`/`Status`/timestamp-shaped object.
    let field_encoding = FieldEncoding::Variant;

    let payload = match obj.get("Payload").and_then(Value::as_object) {
        Some(payload_obj) => {
            let mut indexed: Vec<(u16, &Value)> = payload_obj
                .iter()
                .map(|(k, v)| {
                    k.parse::<u16>()
                        .map(|idx| (idx, v))
                        .map_err(|_| ProtocolError::Malformed(format!("non-numeric Payload key {k:?}")))
                })
                .collect::<Result<Vec<_>>>()?;
            indexed.sort_by_key(|(idx, _)| *idx);
            let fields = indexed
                .into_iter()
                .map(|(_, v)| field_value_from_json(v, field_encoding))
                .collect::<Result<Vec<_>>>()?;
            DataSetMessagePayload::KeyFrame(fields)
        },
        None => DataSetMessagePayload::KeepAlive,
    };

    Ok((writer_id, DataSetMessage { header, field_encoding, payload }))
}

/// Decode a `ua-data` JSON envelope into a [`NetworkMessage`].
pub fn decode_network_message(value: &Value, ctx: &JsonCodecContext<'_>) -> Result<NetworkMessage> {
    let obj = require_object(value, "NetworkMessage")?;
    ctx.charge_tokens(obj.len())?;

    match obj.get("MessageType").and_then(Value::as_str) {
        Some("ua-data") => {},
        Some("ua-metadata") => {
            return Err(ProtocolError::Unsupported(
                "ua-metadata JSON messages are not supported; only ua-data is decoded".into(),
            ))
        },
        Some(other) => return Err(ProtocolError::Malformed(format!("unknown MessageType {other:?}"))),
        None => return Err(ProtocolError::Malformed("missing MessageType".into())),
    }

    let publisher_id = match obj.get("PublisherId") {
        Some(v) => Some(publisher_id_from_json(v)?),
        None => None,
    };
    let dataset_class_id = match obj.get("DataSetClassId").and_then(Value::as_str) {
        Some(s) => Some(Guid::parse(s)?),
        None => None,
    };

    let messages_json = obj
        .get("Messages")
        .and_then(Value::as_array)
        .ok_or_else(|| ProtocolError::Malformed("missing Messages array".into()))?;

    let mut dataset_messages = Vec::with_capacity(messages_json.len());
    let mut dataset_writer_ids = Vec::with_capacity(messages_json.len());
    for (index, message_json) in messages_json.iter().enumerate() {
        let (writer_id, message) = dataset_message_from_json(message_json, ctx)?;
        let writer_id = writer_id.or_else(|| ctx.dataset_writer_ids.get(index).copied());
        if let Some(id) = writer_id {
            dataset_writer_ids.push(id);
        }
        dataset_messages.push(message);
    }

    let payload_header = if dataset_writer_ids.len() == dataset_messages.len() && !dataset_writer_ids.is_empty() {
        Some(PayloadHeader { dataset_writer_ids })
    } else {
        None
    };

    Ok(NetworkMessage {
        version: 1,
        publisher_id,
        dataset_class_id,
        chunk_message: false,
        group_header: None,
        payload_header,
        security_header: None,
        timestamp: None,
        picoseconds: None,
        promoted_fields: None,
        dataset_messages,
        security_footer: Vec::new(),
    })
}

/// Attempt to decode a `ua-metadata` JSON message. Always fails: dataset
/// metadata modeling is out of scope for this codec.
pub fn decode_ua_metadata(_value: &Value) -> Result<()> {
    Err(ProtocolError::Unsupported("ua-metadata decoding is not implemented".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;
    use crate::json::encode_network_message;

    #[test]
    fn round_trips_through_encode_and_decode() {
        let cfg = CodecConfig::default();
        let ctx = JsonCodecContext::new(&cfg);
        let original = NetworkMessage {
            version: 1,
            publisher_id: Some(PublisherId::UInt32(99)),
            dataset_class_id: None,
            chunk_message: false,
            group_header: None,
            payload_header: Some(PayloadHeader { dataset_writer_ids: vec![3] }),
            security_header: None,
            timestamp: None,
            picoseconds: None,
            promoted_fields: None,
            dataset_messages: vec![DataSetMessage {
                header: DataSetMessageHeader { valid: true, sequence_number: Some(12), ..Default::default() },
                field_encoding: FieldEncoding::Variant,
                payload: DataSetMessagePayload::KeyFrame(vec![
                    FieldValue::Variant(Variant::Scalar(ScalarValue::Boolean(true))),
                    FieldValue::Variant(Variant::Scalar(ScalarValue::UInt16(55))),
                ]),
            }],
            security_footer: Vec::new(),
        };

        let json = encode_network_message(&original, "11111111-1111-1111-1111-111111111111", &ctx).unwrap();
        let decoded = decode_network_message(&json, &ctx).unwrap();
        assert_eq!(decoded.publisher_id, original.publisher_id);
        assert_eq!(decoded.payload_header, original.payload_header);
        assert_eq!(decoded.dataset_messages[0].header.sequence_number, Some(12));
    }

    #[test]
    fn ua_metadata_message_type_is_unsupported() {
        let cfg = CodecConfig::default();
        let ctx = JsonCodecContext::new(&cfg);
        let json = serde_json::json!({ "MessageType": "ua-metadata" });
        assert!(matches!(decode_network_message(&json, &ctx), Err(ProtocolError::Unsupported(_))));
    }
}
