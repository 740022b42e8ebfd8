//! JSON PubSub envelope encoding and decoding.
//!
//! The binary codec in the parent module is fully self-describing; the
//! JSON form is not — a `DataSetMessage`'s `DataSetWriterId` only appears
//! in the enclosing `NetworkMessage`'s envelope, so decoding a single
//! `DataSetMessage` in isolation needs that id threaded in from outside.
//! [`JsonCodecContext`] is that side channel.

mod decode;
mod encode;

pub use decode::{decode_network_message, decode_ua_metadata};
pub use encode::encode_network_message;

use base64::Engine;
use serde_json::{Map, Value};

use crate::config::CodecConfig;
use crate::datavalue::DataValue;
use crate::error::{ProtocolError, Result};
use crate::extension_object::ExtensionObject;
use crate::types::{DiagnosticInfo, ExpandedNodeId, NodeId};

/// Per-call state threaded through JSON encode/decode: the active
/// configuration plus the `DataSetWriterId`s known for the message being
/// processed.
pub struct JsonCodecContext<'a> {
    /// Formatting/rendering configuration.
    pub config: &'a CodecConfig,
    /// `DataSetWriterId` for each `DataSetMessage`, in order, supplied by
    /// the caller (e.g. from the subscriber's configured dataset readers)
    /// since the JSON form doesn't always repeat it per-message.
    pub dataset_writer_ids: &'a [u16],
    /// Running count of JSON tokens consumed so far during decode, checked
    /// against `config.max_json_tokens` to bound worst-case allocation.
    tokens_seen: std::cell::Cell<usize>,
}

impl<'a> JsonCodecContext<'a> {
    /// Build a context for encoding or decoding, with no writer-id side
    /// channel (appropriate when ids are carried `Some` in the payload
    /// itself, or aren't needed because only encoding is in play).
    #[must_use]
    pub fn new(config: &'a CodecConfig) -> Self {
        Self { config, dataset_writer_ids: &[], tokens_seen: std::cell::Cell::new(0) }
    }

    /// Build a context carrying a `DataSetWriterId` side channel for decode.
    #[must_use]
    pub fn with_dataset_writer_ids(config: &'a CodecConfig, dataset_writer_ids: &'a [u16]) -> Self {
        Self { config, dataset_writer_ids, tokens_seen: std::cell::Cell::new(0) }
    }

    /// Record `count` additional JSON tokens consumed, failing once the
    /// configured bound is exceeded.
    pub fn charge_tokens(&self, count: usize) -> Result<()> {
        let total = self.tokens_seen.get() + count;
        if total > self.config.max_json_tokens {
            return Err(ProtocolError::OutOfMemory(format!(
                "JSON token budget exceeded: {total} > {}",
                self.config.max_json_tokens
            )));
        }
        self.tokens_seen.set(total);
        Ok(())
    }
}

/// RFC 3339 timestamp formatting used for `DateTime` JSON fields. Hand
/// rolled rather than pulling in a date/time crate since the only
/// operation needed is formatting a `(seconds, nanoseconds)` Unix pair in
/// UTC with a fixed field width.
#[must_use]
pub fn format_rfc3339(unix_secs: i64, nanos: u32) -> String {
    let days_since_epoch = unix_secs.div_euclid(86400);
    let secs_of_day = unix_secs.rem_euclid(86400);
    let (year, month, day) = civil_from_days(days_since_epoch);
    let hour = secs_of_day / 3600;
    let minute = (secs_of_day % 3600) / 60;
    let second = secs_of_day % 60;
    if nanos == 0 {
        format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}Z")
    } else {
        format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}.{nanos:09}Z")
    }
}

/// Howard Hinnant's `civil_from_days` algorithm: days-since-epoch to
/// proleptic Gregorian `(year, month, day)`, valid across the full `i64`
/// range without relying on a calendar crate.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z: i64 = days + 719_468;
    let era: i64 = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe: i64 = z - era * 146_097;
    let yoe: i64 = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let y: i64 = yoe + era * 400;
    let doy: i64 = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp: i64 = (5 * doy + 2) / 153;
    let d: u32 = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m: u32 = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = if m <= 2 { y + 1 } else { y };
    (year, m, d)
}

/// Base64-encode a byte string for `ByteString`/`XmlElement` JSON fields.
#[must_use]
pub fn base64_encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decode a base64-encoded `ByteString`/`XmlElement` JSON field.
pub fn base64_decode(s: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(s)
        .map_err(|e| ProtocolError::Malformed(format!("invalid base64: {e}")))
}

/// Render a `NodeId` as its JSON string form: `ns=<index>;<kind>=<value>`,
/// or the namespace's registered URI in place of the bare index when
/// `config.string_node_ids` is set.
#[must_use]
pub fn node_id_to_string(node_id: &NodeId, ctx: &JsonCodecContext<'_>) -> String {
    use crate::types::NodeIdIdentifier;

    let ns_prefix = if node_id.namespace_index == 0 {
        String::new()
    } else if ctx.config.string_node_ids {
        match ctx.config.namespace_uri(node_id.namespace_index) {
            Some(uri) => format!("nsu={uri};"),
            None => format!("ns={};", node_id.namespace_index),
        }
    } else {
        format!("ns={};", node_id.namespace_index)
    };

    let ident = match &node_id.identifier {
        NodeIdIdentifier::TwoByte(v) => format!("i={v}"),
        NodeIdIdentifier::FourByte(_, v) => format!("i={v}"),
        NodeIdIdentifier::Numeric(v) => format!("i={v}"),
        NodeIdIdentifier::String(s) => format!("s={}", s.0.clone().unwrap_or_default()),
        NodeIdIdentifier::Guid(g) => format!("g={}", g.to_hyphenated_string()),
        NodeIdIdentifier::Opaque(b) => {
            format!("b={}", base64_encode(b.0.as_deref().unwrap_or_default()))
        },
    };
    format!("{ns_prefix}{ident}")
}

/// Render an `ExpandedNodeId` as its JSON string form: the inner `NodeId`
/// string, prefixed with `nsu=<uri>;` when a namespace URI was carried
/// out-of-band, suffixed with `;svr=<index>` when a server index was.
#[must_use]
pub fn expanded_node_id_to_string(id: &ExpandedNodeId, ctx: &JsonCodecContext<'_>) -> String {
    let base = node_id_to_string(&id.node_id, ctx);
    let uri_prefix = match &id.namespace_uri {
        Some(uri) => format!("nsu={};", uri.0.clone().unwrap_or_default()),
        None => String::new(),
    };
    let server_suffix = match id.server_index {
        Some(idx) => format!(";svr={idx}"),
        None => String::new(),
    };
    format!("{uri_prefix}{base}{server_suffix}")
}

/// Render a `DiagnosticInfo` as its JSON object form, recursing into
/// `InnerDiagnosticInfo` the same way the binary codec recurses into
/// `inner_diagnostic_info`.
#[must_use]
pub fn diagnostic_info_to_json(info: &DiagnosticInfo) -> Value {
    let mut map = Map::new();
    if let Some(v) = info.symbolic_id {
        map.insert("SymbolicId".to_string(), Value::from(v));
    }
    if let Some(v) = info.namespace_uri {
        map.insert("NamespaceUri".to_string(), Value::from(v));
    }
    if let Some(v) = info.locale {
        map.insert("Locale".to_string(), Value::from(v));
    }
    if let Some(v) = info.localized_text {
        map.insert("LocalizedText".to_string(), Value::from(v));
    }
    if let Some(v) = &info.additional_info {
        if let Some(s) = &v.0 {
            map.insert("AdditionalInfo".to_string(), Value::String(s.clone()));
        }
    }
    if let Some(v) = &info.inner_status_code {
        map.insert("InnerStatusCode".to_string(), Value::from(v.0));
    }
    if let Some(v) = &info.inner_diagnostic_info {
        map.insert("InnerDiagnosticInfo".to_string(), diagnostic_info_to_json(v));
    }
    Value::Object(map)
}

/// Render a `DataValue` as its JSON object form (`Value`/`Status`/the four
/// timestamp fields), shared by the `DataSetMessage` field encoder and
/// `ScalarValue::DataValue`'s nested rendering.
#[must_use]
pub fn data_value_to_json(dv: &DataValue, ctx: &JsonCodecContext<'_>) -> Value {
    let mut map = Map::new();
    if let Some(v) = &dv.value {
        map.insert("Value".to_string(), v.to_json(ctx));
    }
    if let Some(s) = &dv.status {
        map.insert("Status".to_string(), Value::from(s.0));
    }
    if let Some(ts) = &dv.source_timestamp {
        let (secs, nanos) = ts.to_unix();
        map.insert("SourceTimestamp".to_string(), Value::String(format_rfc3339(secs, nanos)));
    }
    if let Some(ps) = dv.source_picoseconds {
        map.insert("SourcePicoseconds".to_string(), Value::from(ps));
    }
    if let Some(ts) = &dv.server_timestamp {
        let (secs, nanos) = ts.to_unix();
        map.insert("ServerTimestamp".to_string(), Value::String(format_rfc3339(secs, nanos)));
    }
    if let Some(ps) = dv.server_picoseconds {
        map.insert("ServerPicoseconds".to_string(), Value::from(ps));
    }
    Value::Object(map)
}

/// Render an `ExtensionObject` as JSON: a registered custom type with a
/// byte-string body recursively decodes into `{TypeId, Body: {field: ...}}`
/// using the type's field schema; anything else — unregistered, or a body
/// that doesn't parse against its schema — falls back to `{TypeId, Body}`
/// with `Body` left as an opaque base64 blob.
pub fn extension_object_to_json(obj: &ExtensionObject, ctx: &JsonCodecContext<'_>) -> Value {
    let mut map = Map::new();
    let type_id_str = match ctx.config.custom_type(&obj.type_id) {
        Some(descriptor) => descriptor.name.clone(),
        None => node_id_to_string(&obj.type_id, ctx),
    };
    map.insert("TypeId".to_string(), Value::String(type_id_str));
    match obj.decode_typed(ctx.config) {
        Ok(Some(fields)) => {
            let mut body = Map::new();
            for (name, value) in fields {
                body.insert(name, value.to_json(ctx));
            }
            map.insert("Body".to_string(), Value::Object(body));
        },
        _ => {
            if let Some(bytes) = &obj.body.0 {
                map.insert("Body".to_string(), Value::String(base64_encode(bytes)));
            }
        },
    }
    Value::Object(map)
}
