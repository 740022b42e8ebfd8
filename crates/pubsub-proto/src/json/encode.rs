//! Encoding a [`NetworkMessage`] to its JSON envelope.

use serde_json::{Map, Value};

use super::{base64_encode, data_value_to_json, format_rfc3339, JsonCodecContext};
use crate::dataset_message::{DataSetMessage, DataSetMessagePayload, FieldValue};
use crate::error::{ProtocolError, Result};
use crate::network_message::NetworkMessage;
use crate::types::PublisherId;
use crate::variant::Variant;

fn publisher_id_to_json(publisher_id: &PublisherId) -> Value {
    match publisher_id {
        PublisherId::Byte(v) => Value::from(*v),
        PublisherId::UInt16(v) => Value::from(*v),
        PublisherId::UInt32(v) => Value::from(*v),
        PublisherId::UInt64(v) => Value::String(v.to_string()),
        PublisherId::String(v) => Value::String(v.0.clone().unwrap_or_default()),
        PublisherId::Guid(v) => Value::String(v.to_hyphenated_string()),
    }
}

fn field_value_to_json(field: &FieldValue, ctx: &JsonCodecContext<'_>) -> Value {
    match field {
        FieldValue::Variant(v) => v.to_json(ctx),
        FieldValue::DataValue(dv) => data_value_to_json(dv, ctx),
        FieldValue::Raw(raw) => Value::String(base64_encode(&raw.0)),
    }
}

fn dataset_message_to_json(
    message: &DataSetMessage,
    writer_id: Option<u16>,
    ctx: &JsonCodecContext<'_>,
) -> Value {
    let mut map = Map::new();
    if let Some(id) = writer_id {
        map.insert("DataSetWriterId".to_string(), Value::from(id));
    }
    if let Some(seq) = message.header.sequence_number {
        map.insert("SequenceNumber".to_string(), Value::from(seq));
    }
    if let (Some(major), Some(minor)) =
        (message.header.config_major_version, message.header.config_minor_version)
    {
        let mut meta = Map::new();
        meta.insert("MajorVersion".to_string(), Value::from(major));
        meta.insert("MinorVersion".to_string(), Value::from(minor));
        map.insert("MetaDataVersion".to_string(), Value::Object(meta));
    }
    if let Some(ts) = &message.header.timestamp {
        let (secs, nanos) = ts.to_unix();
        map.insert("Timestamp".to_string(), Value::String(format_rfc3339(secs, nanos)));
    }
    if let Some(status) = &message.header.status {
        map.insert("Status".to_string(), Value::from(status.0));
    }

    let payload = match &message.payload {
        DataSetMessagePayload::KeyFrame(fields) | DataSetMessagePayload::Event(fields) => {
            let mut payload_map = Map::new();
            for (index, field) in fields.iter().enumerate() {
                payload_map.insert(index.to_string(), field_value_to_json(field, ctx));
            }
            Value::Object(payload_map)
        },
        DataSetMessagePayload::DeltaFrame(pairs) => {
            let mut payload_map = Map::new();
            for (index, field) in pairs {
                payload_map.insert(index.to_string(), field_value_to_json(field, ctx));
            }
            Value::Object(payload_map)
        },
        DataSetMessagePayload::KeepAlive => Value::Object(Map::new()),
    };
    map.insert("Payload".to_string(), payload);

    Value::Object(map)
}

/// Encode a [`NetworkMessage`] as a `ua-data` JSON envelope.
///
/// `message_id` is the caller-supplied `MessageId` GUID string; the codec
/// has no clock or RNG of its own to mint one.
pub fn encode_network_message(
    message: &NetworkMessage,
    message_id: &str,
    ctx: &JsonCodecContext<'_>,
) -> Result<Value> {
    if message.dataset_messages.len() > 1 && message.payload_header.is_none() {
        return Err(ProtocolError::InvalidArgument(
            "JSON encoding of multiple DataSetMessages requires a PayloadHeader to supply DataSetWriterIds"
                .into(),
        ));
    }

    let mut map = Map::new();
    map.insert("MessageId".to_string(), Value::String(message_id.to_string()));
    map.insert("MessageType".to_string(), Value::String("ua-data".to_string()));
    if let Some(publisher_id) = &message.publisher_id {
        map.insert("PublisherId".to_string(), publisher_id_to_json(publisher_id));
    }
    if let Some(dataset_class_id) = &message.dataset_class_id {
        map.insert("DataSetClassId".to_string(), Value::String(dataset_class_id.to_hyphenated_string()));
    }

    let writer_ids: Vec<Option<u16>> = match &message.payload_header {
        Some(header) => header.dataset_writer_ids.iter().copied().map(Some).collect(),
        None => vec![None; message.dataset_messages.len()],
    };

    let messages: Vec<Value> = message
        .dataset_messages
        .iter()
        .zip(writer_ids)
        .map(|(msg, writer_id)| dataset_message_to_json(msg, writer_id, ctx))
        .collect();
    map.insert("Messages".to_string(), Value::Array(messages));

    Ok(Value::Object(map))
}
