//! Codec-wide configuration: JSON formatting choices, namespace/server-uri
//! tables for compact node-id rendering, and user-registered extension
//! types.

use serde::{Deserialize, Serialize};

use crate::cursor::{Cursor, Reader};
use crate::error::Result;
use crate::types::NodeId;
use crate::variant::{BuiltinTypeId, ScalarValue};

/// One named field in a registered custom type's binary layout, decoded in
/// declaration order — this codec's custom types are flat structs of
/// built-in scalars, not general nested records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTypeField {
    /// Field name, used as the JSON key when rendering a decoded body.
    pub name: String,
    /// The scalar's wire type.
    pub kind: BuiltinTypeId,
}

/// Describes a user-defined type carried inside an `ExtensionObject`, so
/// binary and JSON decoding can recover its body as named scalar fields
/// instead of an opaque byte blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// The `ExtensionObject.type_id` this descriptor applies to.
    pub type_id: NodeId,
    /// Human-readable name, used as the JSON `TypeId` hint and in
    /// diagnostics; purely informational.
    pub name: String,
    /// Field schema for a byte-string-encoded body, in wire order. Empty
    /// means this type is registered for its name/diagnostics only and its
    /// body still renders as an opaque blob.
    #[serde(default)]
    pub fields: Vec<CustomTypeField>,
}

impl TypeDescriptor {
    /// Recursively decode `body` into `{field name, value}` pairs using
    /// this descriptor's field schema, in declaration order.
    pub fn decode_fields(&self, body: &[u8]) -> Result<Vec<(String, ScalarValue)>> {
        let mut reader = Reader::new(body);
        let mut fields = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            fields.push((field.name.clone(), ScalarValue::decode(field.kind, &mut reader)?));
        }
        Ok(fields)
    }

    /// Encode `{field name, value}` pairs back into a raw byte body, the
    /// inverse of [`Self::decode_fields`]. The caller is responsible for
    /// supplying values in the schema's declared order.
    pub fn encode_fields(&self, fields: &[(String, ScalarValue)]) -> Result<Vec<u8>> {
        let mut counter = Cursor::counter();
        for (_, value) in fields {
            value.encode(&mut counter)?;
        }
        let mut body = vec![0u8; counter.position()];
        let mut cursor = Cursor::writer(&mut body);
        for (_, value) in fields {
            value.encode(&mut cursor)?;
        }
        Ok(body)
    }
}

/// Tunables that shape how binary and JSON encode/decode behave.
///
/// Constructed once per publisher or subscriber and threaded through every
/// codec call that needs it; the codec itself holds no global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Use the fully reversible JSON encoding (numeric type tags, explicit
    /// null fields) instead of the compact non-reversible form.
    pub use_reversible: bool,
    /// Pretty-print JSON output with indentation.
    pub pretty_print: bool,
    /// Omit quotes around JSON object keys that are valid identifiers (a
    /// non-standard JSON5-ish compatibility mode some consumers expect).
    pub unquoted_keys: bool,
    /// Render `NodeId`/`ExpandedNodeId` namespace indexes as their
    /// registered string form (`ns=2;i=42` → `http://example/;i=42`-style)
    /// rather than bare indexes.
    pub string_node_ids: bool,
    /// Namespace URI table, indexed by namespace index.
    pub namespaces: Vec<String>,
    /// Server URI table, indexed by server index, for `ExpandedNodeId`.
    pub server_uris: Vec<String>,
    /// Registered extension types, consulted when rendering
    /// `ExtensionObject` bodies as JSON.
    pub custom_types: Vec<TypeDescriptor>,
    /// Upper bound on JSON tokens accepted while decoding a single message,
    /// guarding against unbounded-allocation inputs.
    pub max_json_tokens: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            use_reversible: true,
            pretty_print: false,
            unquoted_keys: false,
            string_node_ids: false,
            namespaces: Vec::new(),
            server_uris: Vec::new(),
            custom_types: Vec::new(),
            max_json_tokens: 256,
        }
    }
}

impl CodecConfig {
    /// Look up a registered namespace URI by index.
    #[must_use]
    pub fn namespace_uri(&self, index: u16) -> Option<&str> {
        self.namespaces.get(index as usize).map(String::as_str)
    }

    /// Look up a registered server URI by index.
    #[must_use]
    pub fn server_uri(&self, index: u32) -> Option<&str> {
        self.server_uris.get(index as usize).map(String::as_str)
    }

    /// Find the descriptor registered for an `ExtensionObject` type id.
    #[must_use]
    pub fn custom_type(&self, type_id: &NodeId) -> Option<&TypeDescriptor> {
        self.custom_types.iter().find(|d| &d.type_id == type_id)
    }
}
