//! `ExtensionObject`: a type-id-tagged opaque body, used to carry
//! structured types the codec has no built-in support for.

use crate::codec::{BinaryDecode, BinaryEncode};
use crate::config::CodecConfig;
use crate::cursor::{Cursor, Reader};
use crate::error::{ProtocolError, Result};
use crate::types::{NodeId, UaByteString};
use crate::variant::ScalarValue;

/// How an `ExtensionObject`'s body is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionObjectEncoding {
    /// No body follows.
    NoBody,
    /// Body is an opaque byte string (typically a binary-encoded struct).
    ByteString,
    /// Body is an XML element (carried as an opaque byte string, too).
    XmlElement,
}

impl ExtensionObjectEncoding {
    fn to_bits(self) -> u8 {
        match self {
            Self::NoBody => 0x00,
            Self::ByteString => 0x01,
            Self::XmlElement => 0x02,
        }
    }

    fn from_bits(bits: u8) -> Result<Self> {
        Ok(match bits {
            0x00 => Self::NoBody,
            0x01 => Self::ByteString,
            0x02 => Self::XmlElement,
            other => {
                return Err(ProtocolError::Malformed(format!("unknown ExtensionObject encoding {other:#04x}")))
            },
        })
    }
}

/// `{type_id: NodeId, encoding: u8, body: UaByteString}`.
///
/// The codec treats the body as opaque: decoding a known type's fields is
/// the caller's job (via [`crate::config::CodecConfig::custom_types`] for
/// the JSON textual form), not this crate's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionObject {
    /// Identifies the encoded type.
    pub type_id: NodeId,
    /// How `body` is encoded.
    pub encoding: ExtensionObjectEncoding,
    /// The opaque payload; `None` when `encoding` is `NoBody`.
    pub body: UaByteString,
}

impl ExtensionObject {
    /// An `ExtensionObject` carrying no body.
    #[must_use]
    pub fn empty(type_id: NodeId) -> Self {
        Self { type_id, encoding: ExtensionObjectEncoding::NoBody, body: UaByteString::null() }
    }

    /// Wrap an already binary-encoded struct body.
    #[must_use]
    pub fn with_binary_body(type_id: NodeId, body: Vec<u8>) -> Self {
        Self { type_id, encoding: ExtensionObjectEncoding::ByteString, body: UaByteString(Some(body)) }
    }

    /// Recursively decode this object's body into `{field name, value}`
    /// pairs using `config`'s registered schema for `type_id`. Returns
    /// `Ok(None)` — not an error — when `type_id` isn't registered, carries
    /// no field schema, or `encoding` isn't `ByteString`; in all of those
    /// cases the body stays an opaque byte blob to the caller.
    pub fn decode_typed(&self, config: &CodecConfig) -> Result<Option<Vec<(String, ScalarValue)>>> {
        if self.encoding != ExtensionObjectEncoding::ByteString {
            return Ok(None);
        }
        let Some(descriptor) = config.custom_type(&self.type_id) else {
            return Ok(None);
        };
        if descriptor.fields.is_empty() {
            return Ok(None);
        }
        let body = self.body.0.as_deref().unwrap_or(&[]);
        Ok(Some(descriptor.decode_fields(body)?))
    }

    /// Build a byte-string-encoded `ExtensionObject` from `{field name,
    /// value}` pairs, the inverse of [`Self::decode_typed`]. Fails if
    /// `type_id` has no registered schema in `config`.
    pub fn from_typed(type_id: NodeId, fields: &[(String, ScalarValue)], config: &CodecConfig) -> Result<Self> {
        let descriptor = config.custom_type(&type_id).ok_or_else(|| {
            ProtocolError::Unsupported(format!("no registered custom type for {type_id:?}"))
        })?;
        let body = descriptor.encode_fields(fields)?;
        Ok(Self::with_binary_body(type_id, body))
    }
}

impl BinaryEncode for ExtensionObject {
    fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        self.type_id.encode(cursor)?;
        self.encoding.to_bits().encode(cursor)?;
        match self.encoding {
            ExtensionObjectEncoding::NoBody => Ok(()),
            ExtensionObjectEncoding::ByteString | ExtensionObjectEncoding::XmlElement => {
                self.body.encode(cursor)
            },
        }
    }
}

impl BinaryDecode for ExtensionObject {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let type_id = NodeId::decode(reader)?;
        let encoding = ExtensionObjectEncoding::from_bits(u8::decode(reader)?)?;
        let body = match encoding {
            ExtensionObjectEncoding::NoBody => UaByteString::null(),
            ExtensionObjectEncoding::ByteString | ExtensionObjectEncoding::XmlElement => {
                UaByteString::decode(reader)?
            },
        };
        Ok(Self { type_id, encoding, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_body_round_trips() {
        let e = ExtensionObject::empty(NodeId::numeric(0, 1));
        let mut buf = vec![0u8; e.calc_size()];
        let mut w = Cursor::writer(&mut buf);
        e.encode(&mut w).unwrap();
        let mut r = Reader::new(&buf);
        assert_eq!(ExtensionObject::decode(&mut r).unwrap(), e);
    }

    #[test]
    fn binary_body_round_trips() {
        let e = ExtensionObject::with_binary_body(NodeId::numeric(1, 42), vec![1, 2, 3, 4]);
        let mut buf = vec![0u8; e.calc_size()];
        let mut w = Cursor::writer(&mut buf);
        e.encode(&mut w).unwrap();
        let mut r = Reader::new(&buf);
        assert_eq!(ExtensionObject::decode(&mut r).unwrap(), e);
    }

    #[test]
    fn rejects_unknown_encoding() {
        let mut buf = vec![0u8; 10];
        {
            let mut w = Cursor::writer(&mut buf);
            NodeId::numeric(0, 1).encode(&mut w).unwrap();
            0xFFu8.encode(&mut w).unwrap();
        }
        let mut r = Reader::new(&buf[..3]);
        assert!(ExtensionObject::decode(&mut r).is_err());
    }
}
