//! The `Variant` union: a type-tagged, optionally-array-shaped payload used
//! by `DataSetMessage` fields when `field_encoding == VARIANT`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codec::{BinaryDecode, BinaryEncode};
use crate::cursor::{Cursor, Reader};
use crate::datavalue::DataValue;
use crate::error::{ProtocolError, Result};
use crate::extension_object::ExtensionObject;
use crate::primitives::{json_float_from_token, json_float_token};
use crate::types::{
    DiagnosticInfo, ExpandedNodeId, Guid, LocalizedText, NodeId, QualifiedName, StatusCode, UaByteString,
    UaDateTime, UaString,
};

/// The 25 OPC UA built-in scalar type tags, occupying the low 6 bits of a
/// `Variant`'s encoding byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum BuiltinTypeId {
    /// No value.
    Null = 0,
    Boolean = 1,
    SByte = 2,
    Byte = 3,
    Int16 = 4,
    UInt16 = 5,
    Int32 = 6,
    UInt32 = 7,
    Int64 = 8,
    UInt64 = 9,
    Float = 10,
    Double = 11,
    String = 12,
    DateTime = 13,
    Guid = 14,
    ByteString = 15,
    XmlElement = 16,
    NodeId = 17,
    ExpandedNodeId = 18,
    StatusCode = 19,
    QualifiedName = 20,
    LocalizedText = 21,
    ExtensionObject = 22,
    DataValue = 23,
    Variant = 24,
    DiagnosticInfo = 25,
}

impl BuiltinTypeId {
    /// Recover a tag from its 6-bit wire value.
    pub fn from_tag(tag: u8) -> Result<Self> {
        Ok(match tag {
            0 => Self::Null,
            1 => Self::Boolean,
            2 => Self::SByte,
            3 => Self::Byte,
            4 => Self::Int16,
            5 => Self::UInt16,
            6 => Self::Int32,
            7 => Self::UInt32,
            8 => Self::Int64,
            9 => Self::UInt64,
            10 => Self::Float,
            11 => Self::Double,
            12 => Self::String,
            13 => Self::DateTime,
            14 => Self::Guid,
            15 => Self::ByteString,
            16 => Self::XmlElement,
            17 => Self::NodeId,
            18 => Self::ExpandedNodeId,
            19 => Self::StatusCode,
            20 => Self::QualifiedName,
            21 => Self::LocalizedText,
            22 => Self::ExtensionObject,
            23 => Self::DataValue,
            24 => Self::Variant,
            25 => Self::DiagnosticInfo,
            other => return Err(ProtocolError::Malformed(format!("unknown builtin type id {other}"))),
        })
    }
}

/// A single scalar value inside a [`Variant`], or a recursive nested
/// `Variant` for the rare case of a variant-of-variants array.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Boolean(bool),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(UaString),
    DateTime(UaDateTime),
    Guid(Guid),
    ByteString(UaByteString),
    XmlElement(UaByteString),
    NodeId(NodeId),
    ExpandedNodeId(ExpandedNodeId),
    StatusCode(StatusCode),
    QualifiedName(QualifiedName),
    LocalizedText(LocalizedText),
    ExtensionObject(ExtensionObject),
    /// Boxed since `DataValue` carries an `Option<Variant>`, and `Variant`
    /// carries a `ScalarValue` directly: without the indirection this
    /// variant would make `ScalarValue` an infinitely-sized type.
    DataValue(Box<DataValue>),
    /// Boxed for the same reason: a `Variant` holds a `ScalarValue`
    /// directly, so a variant-of-variants needs one level of indirection.
    Variant(Box<Variant>),
    DiagnosticInfo(DiagnosticInfo),
}

impl ScalarValue {
    pub(crate) fn builtin_type_id(&self) -> BuiltinTypeId {
        match self {
            Self::Boolean(_) => BuiltinTypeId::Boolean,
            Self::SByte(_) => BuiltinTypeId::SByte,
            Self::Byte(_) => BuiltinTypeId::Byte,
            Self::Int16(_) => BuiltinTypeId::Int16,
            Self::UInt16(_) => BuiltinTypeId::UInt16,
            Self::Int32(_) => BuiltinTypeId::Int32,
            Self::UInt32(_) => BuiltinTypeId::UInt32,
            Self::Int64(_) => BuiltinTypeId::Int64,
            Self::UInt64(_) => BuiltinTypeId::UInt64,
            Self::Float(_) => BuiltinTypeId::Float,
            Self::Double(_) => BuiltinTypeId::Double,
            Self::String(_) => BuiltinTypeId::String,
            Self::DateTime(_) => BuiltinTypeId::DateTime,
            Self::Guid(_) => BuiltinTypeId::Guid,
            Self::ByteString(_) => BuiltinTypeId::ByteString,
            Self::XmlElement(_) => BuiltinTypeId::XmlElement,
            Self::NodeId(_) => BuiltinTypeId::NodeId,
            Self::ExpandedNodeId(_) => BuiltinTypeId::ExpandedNodeId,
            Self::StatusCode(_) => BuiltinTypeId::StatusCode,
            Self::QualifiedName(_) => BuiltinTypeId::QualifiedName,
            Self::LocalizedText(_) => BuiltinTypeId::LocalizedText,
            Self::ExtensionObject(_) => BuiltinTypeId::ExtensionObject,
            Self::DataValue(_) => BuiltinTypeId::DataValue,
            Self::Variant(_) => BuiltinTypeId::Variant,
            Self::DiagnosticInfo(_) => BuiltinTypeId::DiagnosticInfo,
        }
    }

    pub(crate) fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        match self {
            Self::Boolean(v) => v.encode(cursor),
            Self::SByte(v) => v.encode(cursor),
            Self::Byte(v) => v.encode(cursor),
            Self::Int16(v) => v.encode(cursor),
            Self::UInt16(v) => v.encode(cursor),
            Self::Int32(v) => v.encode(cursor),
            Self::UInt32(v) => v.encode(cursor),
            Self::Int64(v) => v.encode(cursor),
            Self::UInt64(v) => v.encode(cursor),
            Self::Float(v) => v.encode(cursor),
            Self::Double(v) => v.encode(cursor),
            Self::String(v) => v.encode(cursor),
            Self::DateTime(v) => v.encode(cursor),
            Self::Guid(v) => v.encode(cursor),
            Self::ByteString(v) | Self::XmlElement(v) => v.encode(cursor),
            Self::NodeId(v) => v.encode(cursor),
            Self::ExpandedNodeId(v) => v.encode(cursor),
            Self::StatusCode(v) => v.encode(cursor),
            Self::QualifiedName(v) => v.encode(cursor),
            Self::LocalizedText(v) => v.encode(cursor),
            Self::ExtensionObject(v) => v.encode(cursor),
            Self::DataValue(v) => v.encode(cursor),
            Self::Variant(v) => v.encode(cursor),
            Self::DiagnosticInfo(v) => v.encode(cursor),
        }
    }

    pub(crate) fn decode(kind: BuiltinTypeId, reader: &mut Reader<'_>) -> Result<Self> {
        Ok(match kind {
            BuiltinTypeId::Boolean => Self::Boolean(bool::decode(reader)?),
            BuiltinTypeId::SByte => Self::SByte(i8::decode(reader)?),
            BuiltinTypeId::Byte => Self::Byte(u8::decode(reader)?),
            BuiltinTypeId::Int16 => Self::Int16(i16::decode(reader)?),
            BuiltinTypeId::UInt16 => Self::UInt16(u16::decode(reader)?),
            BuiltinTypeId::Int32 => Self::Int32(i32::decode(reader)?),
            BuiltinTypeId::UInt32 => Self::UInt32(u32::decode(reader)?),
            BuiltinTypeId::Int64 => Self::Int64(i64::decode(reader)?),
            BuiltinTypeId::UInt64 => Self::UInt64(u64::decode(reader)?),
            BuiltinTypeId::Float => Self::Float(f32::decode(reader)?),
            BuiltinTypeId::Double => Self::Double(f64::decode(reader)?),
            BuiltinTypeId::String => Self::String(UaString::decode(reader)?),
            BuiltinTypeId::DateTime => Self::DateTime(UaDateTime::decode(reader)?),
            BuiltinTypeId::Guid => Self::Guid(Guid::decode(reader)?),
            BuiltinTypeId::ByteString => Self::ByteString(UaByteString::decode(reader)?),
            BuiltinTypeId::XmlElement => Self::XmlElement(UaByteString::decode(reader)?),
            BuiltinTypeId::NodeId => Self::NodeId(NodeId::decode(reader)?),
            BuiltinTypeId::ExpandedNodeId => Self::ExpandedNodeId(ExpandedNodeId::decode(reader)?),
            BuiltinTypeId::StatusCode => Self::StatusCode(StatusCode::decode(reader)?),
            BuiltinTypeId::QualifiedName => Self::QualifiedName(QualifiedName::decode(reader)?),
            BuiltinTypeId::LocalizedText => Self::LocalizedText(LocalizedText::decode(reader)?),
            BuiltinTypeId::ExtensionObject => Self::ExtensionObject(ExtensionObject::decode(reader)?),
            BuiltinTypeId::DataValue => Self::DataValue(Box::new(DataValue::decode(reader)?)),
            BuiltinTypeId::Variant => Self::Variant(Box::new(Variant::decode(reader)?)),
            BuiltinTypeId::DiagnosticInfo => Self::DiagnosticInfo(DiagnosticInfo::decode(reader)?),
            BuiltinTypeId::Null => {
                return Err(ProtocolError::Malformed(
                    "Null is not a valid scalar value type inside a Variant".into(),
                ))
            },
        })
    }

    pub(crate) fn to_json(&self, ctx: &crate::json::JsonCodecContext<'_>) -> Value {
        match self {
            Self::Boolean(v) => Value::Bool(*v),
            Self::SByte(v) => Value::from(*v),
            Self::Byte(v) => Value::from(*v),
            Self::Int16(v) => Value::from(*v),
            Self::UInt16(v) => Value::from(*v),
            Self::Int32(v) => Value::from(*v),
            Self::UInt32(v) => Value::from(*v),
            Self::Int64(v) => Value::String(v.to_string()),
            Self::UInt64(v) => Value::String(v.to_string()),
            Self::Float(v) => json_float_token(f64::from(*v)),
            Self::Double(v) => json_float_token(*v),
            Self::String(v) => match &v.0 {
                Some(s) => Value::String(s.clone()),
                None => Value::Null,
            },
            Self::DateTime(v) => {
                let (secs, nanos) = v.to_unix();
                Value::String(crate::json::format_rfc3339(secs, nanos))
            },
            Self::Guid(v) => Value::String(v.to_hyphenated_string()),
            Self::ByteString(v) | Self::XmlElement(v) => match &v.0 {
                Some(b) => Value::String(crate::json::base64_encode(b)),
                None => Value::Null,
            },
            Self::NodeId(v) => Value::String(crate::json::node_id_to_string(v, ctx)),
            Self::ExpandedNodeId(v) => Value::String(crate::json::expanded_node_id_to_string(v, ctx)),
            Self::StatusCode(v) => Value::from(v.0),
            Self::QualifiedName(v) => Value::String(match &v.name.0 {
                Some(n) if v.namespace_index != 0 => format!("{}:{}", v.namespace_index, n),
                Some(n) => n.clone(),
                None => String::new(),
            }),
            Self::LocalizedText(v) => {
                let mut map = Map::new();
                if let Some(locale) = &v.locale.0 {
                    map.insert("Locale".to_string(), Value::String(locale.clone()));
                }
                if let Some(text) = &v.text.0 {
                    map.insert("Text".to_string(), Value::String(text.clone()));
                }
                Value::Object(map)
            },
            Self::ExtensionObject(v) => crate::json::extension_object_to_json(v, ctx),
            Self::DataValue(v) => crate::json::data_value_to_json(v, ctx),
            Self::Variant(v) => v.to_json(ctx),
            Self::DiagnosticInfo(v) => crate::json::diagnostic_info_to_json(v),
        }
    }
}

/// An array of [`ScalarValue`]s of the same `BuiltinTypeId`, with optional
/// multi-dimensional shape metadata (`Variant.dimensions`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariantDimensions(pub Option<Vec<u32>>);

/// The OPC UA `Variant` union: either a single scalar, or an array of
/// scalars sharing one [`BuiltinTypeId`].
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    /// An empty variant (type id 0, no array bit).
    Null,
    /// A single scalar value.
    Scalar(ScalarValue),
    /// A flat array plus optional dimensions for a multi-dimensional shape.
    Array {
        /// The array elements. All share one [`BuiltinTypeId`]; empty
        /// arrays still carry a type id since the tag precedes the count.
        elements: Vec<ScalarValue>,
        /// Element type, needed to disambiguate an empty array.
        element_type: BuiltinTypeId,
        /// Row-major dimension sizes, if the array is non-flat.
        dimensions: VariantDimensions,
    },
}

impl Default for Variant {
    fn default() -> Self {
        Self::Null
    }
}

const IS_ARRAY_BIT: u8 = 0x80;
const HAS_DIMENSIONS_BIT: u8 = 0x40;
const TYPE_ID_MASK: u8 = 0x3F;

impl BinaryEncode for Variant {
    fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        match self {
            Self::Null => (BuiltinTypeId::Null as u8).encode(cursor),
            Self::Scalar(v) => {
                (v.builtin_type_id() as u8).encode(cursor)?;
                v.encode(cursor)
            },
            Self::Array { elements, element_type, dimensions } => {
                let mut tag = (*element_type as u8) | IS_ARRAY_BIT;
                if dimensions.0.is_some() {
                    tag |= HAS_DIMENSIONS_BIT;
                }
                tag.encode(cursor)?;
                let len = i32::try_from(elements.len())
                    .map_err(|_| ProtocolError::InvalidArgument("variant array too long".into()))?;
                len.encode(cursor)?;
                for element in elements {
                    element.encode(cursor)?;
                }
                if let Some(dims) = &dimensions.0 {
                    let dims_len = i32::try_from(dims.len())
                        .map_err(|_| ProtocolError::InvalidArgument("dimensions array too long".into()))?;
                    dims_len.encode(cursor)?;
                    for d in dims {
                        d.encode(cursor)?;
                    }
                }
                Ok(())
            },
        }
    }
}

impl BinaryDecode for Variant {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let tag = u8::decode(reader)?;
        let is_array = tag & IS_ARRAY_BIT != 0;
        let has_dimensions = tag & HAS_DIMENSIONS_BIT != 0;
        let type_id = BuiltinTypeId::from_tag(tag & TYPE_ID_MASK)?;

        if !is_array {
            if matches!(type_id, BuiltinTypeId::Null) {
                return Ok(Self::Null);
            }
            return Ok(Self::Scalar(ScalarValue::decode(type_id, reader)?));
        }

        let count = i32::decode(reader)?;
        if count < 0 {
            return Ok(Self::Array {
                elements: Vec::new(),
                element_type: type_id,
                dimensions: VariantDimensions(None),
            });
        }
        let count = count as usize;
        let mut elements = Vec::with_capacity(count.min(1 << 16));
        for _ in 0..count {
            elements.push(ScalarValue::decode(type_id, reader)?);
        }

        let dimensions = if has_dimensions {
            let dims_count = i32::decode(reader)?;
            if dims_count < 0 {
                VariantDimensions(None)
            } else {
                let mut dims = Vec::with_capacity((dims_count as usize).min(1 << 16));
                for _ in 0..dims_count {
                    dims.push(u32::decode(reader)?);
                }
                VariantDimensions(Some(dims))
            }
        } else {
            VariantDimensions(None)
        };

        Ok(Self::Array { elements, element_type: type_id, dimensions })
    }
}

impl Variant {
    /// Render as a JSON `Variant` body (used by the `DataValue`/`ua-data`
    /// JSON encoding, not the array-shorthand used elsewhere).
    #[must_use]
    pub fn to_json(&self, ctx: &crate::json::JsonCodecContext<'_>) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Scalar(v) => {
                let mut map = Map::new();
                map.insert("Type".to_string(), Value::from(v.builtin_type_id() as u8));
                map.insert("Body".to_string(), v.to_json(ctx));
                Value::Object(map)
            },
            Self::Array { elements, element_type, dimensions } => {
                let mut map = Map::new();
                map.insert("Type".to_string(), Value::from(*element_type as u8));
                map.insert(
                    "Body".to_string(),
                    Value::Array(elements.iter().map(|e| e.to_json(ctx)).collect()),
                );
                if let Some(dims) = &dimensions.0 {
                    map.insert(
                        "Dimensions".to_string(),
                        Value::Array(dims.iter().map(|d| Value::from(*d)).collect()),
                    );
                }
                Value::Object(map)
            },
        }
    }
}
