//! Built-in structured types: strings, byte strings, GUIDs, date-times,
//! status codes, localized text, qualified names, node ids, and publisher
//! ids.

use serde::{Deserialize, Serialize};

use crate::codec::{BinaryDecode, BinaryEncode};
use crate::cursor::{Cursor, Reader};
use crate::error::{ProtocolError, Result};

/// `{length: i32, bytes}` with `length = -1` meaning "null" (distinct from
/// an empty string).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UaString(pub Option<String>);

impl UaString {
    /// A null string.
    #[must_use]
    pub fn null() -> Self {
        Self(None)
    }

    /// Construct from anything convertible to a `String`.
    pub fn from(value: impl Into<String>) -> Self {
        Self(Some(value.into()))
    }
}

impl BinaryEncode for UaString {
    fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        match &self.0 {
            None => (-1i32).encode(cursor),
            Some(s) => {
                let bytes = s.as_bytes();
                let len = i32::try_from(bytes.len())
                    .map_err(|_| ProtocolError::InvalidArgument("string too long".into()))?;
                len.encode(cursor)?;
                cursor.put_bytes(bytes)
            },
        }
    }
}

impl BinaryDecode for UaString {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let len = i32::decode(reader)?;
        if len < 0 {
            return Ok(Self(None));
        }
        let bytes = reader.take(len as usize)?;
        let s = String::from_utf8(bytes.to_vec())
            .map_err(|e| ProtocolError::Malformed(format!("string is not valid utf-8: {e}")))?;
        Ok(Self(Some(s)))
    }
}

/// `{length: i32, bytes}` with `length = -1` meaning "null", same framing
/// as [`UaString`] but the payload is opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UaByteString(pub Option<Vec<u8>>);

impl UaByteString {
    /// A null byte string.
    #[must_use]
    pub fn null() -> Self {
        Self(None)
    }
}

impl BinaryEncode for UaByteString {
    fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        match &self.0 {
            None => (-1i32).encode(cursor),
            Some(bytes) => {
                let len = i32::try_from(bytes.len())
                    .map_err(|_| ProtocolError::InvalidArgument("byte string too long".into()))?;
                len.encode(cursor)?;
                cursor.put_bytes(bytes)
            },
        }
    }
}

impl BinaryDecode for UaByteString {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let len = i32::decode(reader)?;
        if len < 0 {
            return Ok(Self(None));
        }
        Ok(Self(Some(reader.take(len as usize)?.to_vec())))
    }
}

/// 128-bit GUID, encoded on the wire as `{data1: u32, data2: u16, data3:
/// u16, data4: [u8; 8]}` (the .NET `Guid` layout OPC UA uses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guid {
    data1: u32,
    data2: u16,
    data3: u16,
    data4: [u8; 8],
}

impl Guid {
    /// Build a GUID from its four wire components.
    #[must_use]
    pub fn from_parts(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self { data1, data2, data3, data4 }
    }

    /// Parse the canonical `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` string
    /// form used by JSON encoding.
    pub fn parse(s: &str) -> Result<Self> {
        let uuid = uuid::Uuid::parse_str(s)
            .map_err(|e| ProtocolError::Malformed(format!("invalid GUID string: {e}")))?;
        let bytes = uuid.as_bytes();
        Ok(Self {
            data1: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            data2: u16::from_be_bytes([bytes[4], bytes[5]]),
            data3: u16::from_be_bytes([bytes[6], bytes[7]]),
            data4: bytes[8..16].try_into().unwrap_or([0u8; 8]),
        })
    }

    /// Render the canonical string form used by JSON encoding.
    #[must_use]
    pub fn to_hyphenated_string(&self) -> String {
        let mut bytes = [0u8; 16];
        bytes[0..4].copy_from_slice(&self.data1.to_be_bytes());
        bytes[4..6].copy_from_slice(&self.data2.to_be_bytes());
        bytes[6..8].copy_from_slice(&self.data3.to_be_bytes());
        bytes[8..16].copy_from_slice(&self.data4);
        uuid::Uuid::from_bytes(bytes).to_string()
    }
}

impl BinaryEncode for Guid {
    fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        self.data1.encode(cursor)?;
        self.data2.encode(cursor)?;
        self.data3.encode(cursor)?;
        cursor.put_bytes(&self.data4)
    }

    fn calc_size(&self) -> usize {
        16
    }
}

impl BinaryDecode for Guid {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let data1 = u32::decode(reader)?;
        let data2 = u16::decode(reader)?;
        let data3 = u16::decode(reader)?;
        let data4 = reader.take_array::<8>()?;
        Ok(Self { data1, data2, data3, data4 })
    }
}

/// 64-bit Windows FILETIME tick count (100-ns ticks since 1601-01-01).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UaDateTime(pub i64);

/// Ticks between the FILETIME epoch (1601-01-01) and the Unix epoch
/// (1970-01-01), in 100-ns units.
const FILETIME_UNIX_EPOCH_DIFF_TICKS: i64 = 116_444_736_000_000_000;

impl UaDateTime {
    /// Construct from raw 100-ns ticks since the FILETIME epoch.
    #[must_use]
    pub fn from_ticks(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Seconds and nanoseconds since the Unix epoch.
    #[must_use]
    pub fn to_unix(self) -> (i64, u32) {
        let unix_ticks = self.0 - FILETIME_UNIX_EPOCH_DIFF_TICKS;
        let secs = unix_ticks.div_euclid(10_000_000);
        let subsec_ticks = unix_ticks.rem_euclid(10_000_000);
        (secs, (subsec_ticks * 100) as u32)
    }

    /// Build from Unix seconds and nanoseconds.
    #[must_use]
    pub fn from_unix(secs: i64, nanos: u32) -> Self {
        let ticks = secs * 10_000_000 + i64::from(nanos) / 100;
        Self(ticks + FILETIME_UNIX_EPOCH_DIFF_TICKS)
    }
}

impl BinaryEncode for UaDateTime {
    fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        self.0.encode(cursor)
    }

    fn calc_size(&self) -> usize {
        8
    }
}

impl BinaryDecode for UaDateTime {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self(i64::decode(reader)?))
    }
}

/// A 32-bit status/result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusCode(pub u32);

impl StatusCode {
    /// `Good` (0x00000000): no error.
    pub const GOOD: Self = Self(0x0000_0000);

    /// Top two bits classify severity: 0=Good, 1=Uncertain, 2=Bad.
    #[must_use]
    pub fn is_good(self) -> bool {
        self.0 & 0xC000_0000 == 0
    }
}

impl BinaryEncode for StatusCode {
    fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        self.0.encode(cursor)
    }

    fn calc_size(&self) -> usize {
        4
    }
}

impl BinaryDecode for StatusCode {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self(u32::decode(reader)?))
    }
}

/// A language-tagged piece of text: `{locale, text}`, both nullable
/// [`UaString`]s, gated by a 2-bit encoding mask on the wire
/// (bit 0 = locale present, bit 1 = text present).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalizedText {
    /// RFC 5646 locale, e.g. `"en-US"`.
    pub locale: UaString,
    /// The text itself.
    pub text: UaString,
}

impl BinaryEncode for LocalizedText {
    fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        let mut mask = 0u8;
        if self.locale.0.is_some() {
            mask |= 0x01;
        }
        if self.text.0.is_some() {
            mask |= 0x02;
        }
        mask.encode(cursor)?;
        if self.locale.0.is_some() {
            self.locale.encode(cursor)?;
        }
        if self.text.0.is_some() {
            self.text.encode(cursor)?;
        }
        Ok(())
    }
}

impl BinaryDecode for LocalizedText {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let mask = u8::decode(reader)?;
        if mask & !0x03 != 0 {
            return Err(ProtocolError::Malformed("LocalizedText: reserved mask bits set".into()));
        }
        let locale = if mask & 0x01 != 0 { UaString::decode(reader)? } else { UaString::null() };
        let text = if mask & 0x02 != 0 { UaString::decode(reader)? } else { UaString::null() };
        Ok(Self { locale, text })
    }
}

/// `{namespace_index: u16, name: UaString}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QualifiedName {
    /// Index into the namespace table.
    pub namespace_index: u16,
    /// The local name.
    pub name: UaString,
}

impl BinaryEncode for QualifiedName {
    fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        self.namespace_index.encode(cursor)?;
        self.name.encode(cursor)
    }
}

impl BinaryDecode for QualifiedName {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let namespace_index = u16::decode(reader)?;
        let name = UaString::decode(reader)?;
        Ok(Self { namespace_index, name })
    }
}

/// The identifier half of a [`NodeId`]: numeric, string, GUID, or opaque
/// byte-string, tagged by the node id's encoding byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeIdIdentifier {
    /// A 2-byte (`0x00`) numeric identifier, `0..=255`.
    TwoByte(u8),
    /// A 4-byte (`0x01`) numeric identifier: namespace `0..=255`, value
    /// `0..=65535`.
    FourByte(u8, u16),
    /// A full numeric identifier (`0x02`).
    Numeric(u32),
    /// A string identifier (`0x03`).
    String(UaString),
    /// A GUID identifier (`0x04`).
    Guid(Guid),
    /// An opaque byte-string identifier (`0x05`).
    Opaque(UaByteString),
}

/// `{encoding: u8, namespace_index, identifier}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeId {
    /// Namespace this identifier lives in. Absent on `TwoByte`/`FourByte`
    /// forms, which pack it into the identifier itself.
    pub namespace_index: u16,
    /// The identifier value.
    pub identifier: NodeIdIdentifier,
}

impl NodeId {
    /// A numeric node id in namespace 0, using the most compact wire
    /// encoding that fits.
    #[must_use]
    pub fn numeric(namespace_index: u16, value: u32) -> Self {
        let identifier = if namespace_index == 0 && value <= 255 {
            NodeIdIdentifier::TwoByte(value as u8)
        } else if namespace_index <= 255 && value <= 65535 {
            NodeIdIdentifier::FourByte(namespace_index as u8, value as u16)
        } else {
            NodeIdIdentifier::Numeric(value)
        };
        Self { namespace_index, identifier }
    }
}

impl BinaryEncode for NodeId {
    fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        match &self.identifier {
            NodeIdIdentifier::TwoByte(v) => {
                0x00u8.encode(cursor)?;
                v.encode(cursor)
            },
            NodeIdIdentifier::FourByte(ns, v) => {
                0x01u8.encode(cursor)?;
                ns.encode(cursor)?;
                v.encode(cursor)
            },
            NodeIdIdentifier::Numeric(v) => {
                0x02u8.encode(cursor)?;
                self.namespace_index.encode(cursor)?;
                v.encode(cursor)
            },
            NodeIdIdentifier::String(s) => {
                0x03u8.encode(cursor)?;
                self.namespace_index.encode(cursor)?;
                s.encode(cursor)
            },
            NodeIdIdentifier::Guid(g) => {
                0x04u8.encode(cursor)?;
                self.namespace_index.encode(cursor)?;
                g.encode(cursor)
            },
            NodeIdIdentifier::Opaque(b) => {
                0x05u8.encode(cursor)?;
                self.namespace_index.encode(cursor)?;
                b.encode(cursor)
            },
        }
    }
}

impl BinaryDecode for NodeId {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let encoding = u8::decode(reader)?;
        Ok(match encoding {
            0x00 => Self { namespace_index: 0, identifier: NodeIdIdentifier::TwoByte(u8::decode(reader)?) },
            0x01 => {
                let ns = u8::decode(reader)?;
                let v = u16::decode(reader)?;
                Self { namespace_index: u16::from(ns), identifier: NodeIdIdentifier::FourByte(ns, v) }
            },
            0x02 => {
                let ns = u16::decode(reader)?;
                Self { namespace_index: ns, identifier: NodeIdIdentifier::Numeric(u32::decode(reader)?) }
            },
            0x03 => {
                let ns = u16::decode(reader)?;
                Self { namespace_index: ns, identifier: NodeIdIdentifier::String(UaString::decode(reader)?) }
            },
            0x04 => {
                let ns = u16::decode(reader)?;
                Self { namespace_index: ns, identifier: NodeIdIdentifier::Guid(Guid::decode(reader)?) }
            },
            0x05 => {
                let ns = u16::decode(reader)?;
                Self {
                    namespace_index: ns,
                    identifier: NodeIdIdentifier::Opaque(UaByteString::decode(reader)?),
                }
            },
            other => return Err(ProtocolError::Malformed(format!("unknown NodeId encoding {other:#04x}"))),
        })
    }
}

/// A [`NodeId`] extended with an out-of-band namespace URI and/or server
/// index, gated by the top two bits of the encoding byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedNodeId {
    /// The local node id.
    pub node_id: NodeId,
    /// Namespace URI, if the namespace is identified out-of-band.
    pub namespace_uri: Option<UaString>,
    /// Originating server index, if not the local server.
    pub server_index: Option<u32>,
}

impl BinaryEncode for ExpandedNodeId {
    fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        // Encode the NodeId body, then OR the two ExpandedNodeId-only flag
        // bits into its first (encoding) byte.
        let mut body = vec![0u8; self.node_id.calc_size()];
        {
            let mut w = Cursor::writer(&mut body);
            self.node_id.encode(&mut w)?;
        }
        if self.namespace_uri.is_some() {
            body[0] |= 0x80;
        }
        if self.server_index.is_some() {
            body[0] |= 0x40;
        }
        cursor.put_bytes(&body)?;
        if let Some(uri) = &self.namespace_uri {
            uri.encode(cursor)?;
        }
        if let Some(idx) = &self.server_index {
            idx.encode(cursor)?;
        }
        Ok(())
    }
}

impl BinaryDecode for ExpandedNodeId {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let flags = reader.peek_u8()?;
        let has_uri = flags & 0x80 != 0;
        let has_server_index = flags & 0x40 != 0;

        // NodeId::decode expects a clean encoding byte in its low 6 bits;
        // mask the two ExpandedNodeId-only flag bits off before delegating.
        let masked_first_byte = flags & 0x3F;
        let node_id = decode_node_id_with_masked_tag(reader, masked_first_byte)?;

        let namespace_uri = if has_uri { Some(UaString::decode(reader)?) } else { None };
        let server_index = if has_server_index { Some(u32::decode(reader)?) } else { None };
        Ok(Self { node_id, namespace_uri, server_index })
    }
}

/// Decode a [`NodeId`] whose leading encoding byte has already been peeked
/// and had the `ExpandedNodeId`-only flag bits masked off.
fn decode_node_id_with_masked_tag(reader: &mut Reader<'_>, masked_tag: u8) -> Result<NodeId> {
    // Consume the real (unmasked) tag byte, then dispatch on the masked
    // value so the encoding-byte parsing logic lives in one place.
    let _actual_tag = u8::decode(reader)?;
    Ok(match masked_tag {
        0x00 => NodeId { namespace_index: 0, identifier: NodeIdIdentifier::TwoByte(u8::decode(reader)?) },
        0x01 => {
            let ns = u8::decode(reader)?;
            let v = u16::decode(reader)?;
            NodeId { namespace_index: u16::from(ns), identifier: NodeIdIdentifier::FourByte(ns, v) }
        },
        0x02 => {
            let ns = u16::decode(reader)?;
            NodeId { namespace_index: ns, identifier: NodeIdIdentifier::Numeric(u32::decode(reader)?) }
        },
        0x03 => {
            let ns = u16::decode(reader)?;
            NodeId { namespace_index: ns, identifier: NodeIdIdentifier::String(UaString::decode(reader)?) }
        },
        0x04 => {
            let ns = u16::decode(reader)?;
            NodeId { namespace_index: ns, identifier: NodeIdIdentifier::Guid(Guid::decode(reader)?) }
        },
        0x05 => {
            let ns = u16::decode(reader)?;
            NodeId {
                namespace_index: ns,
                identifier: NodeIdIdentifier::Opaque(UaByteString::decode(reader)?),
            }
        },
        other => return Err(ProtocolError::Malformed(format!("unknown NodeId encoding {other:#04x}"))),
    })
}

const DIAG_HAS_SYMBOLIC_ID: u8 = 0x01;
const DIAG_HAS_NAMESPACE_URI: u8 = 0x02;
const DIAG_HAS_LOCALIZED_TEXT: u8 = 0x04;
const DIAG_HAS_LOCALE: u8 = 0x08;
const DIAG_HAS_ADDITIONAL_INFO: u8 = 0x10;
const DIAG_HAS_INNER_STATUS_CODE: u8 = 0x20;
const DIAG_HAS_INNER_DIAGNOSTIC_INFO: u8 = 0x40;

/// Server-side diagnostic detail attached to a result, addressed through a
/// leading bitmask byte naming which optional fields follow. `symbolic_id`,
/// `namespace_uri`, `locale`, and `localized_text` are indexes into a
/// side-channel string table carried by the enclosing service response, not
/// inline strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiagnosticInfo {
    /// Index into the response's string table naming a symbolic error id.
    pub symbolic_id: Option<i32>,
    /// Index into the response's string table naming a namespace URI.
    pub namespace_uri: Option<i32>,
    /// Index into the response's string table naming a locale.
    pub locale: Option<i32>,
    /// Index into the response's string table naming localized text.
    pub localized_text: Option<i32>,
    /// Free-form diagnostic text, carried inline rather than by index.
    pub additional_info: Option<UaString>,
    /// The status code of a nested operation this diagnostic elaborates on.
    pub inner_status_code: Option<StatusCode>,
    /// Diagnostic detail for that nested operation, recursively.
    pub inner_diagnostic_info: Option<Box<DiagnosticInfo>>,
}

impl BinaryEncode for DiagnosticInfo {
    fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        let mut mask = 0u8;
        if self.symbolic_id.is_some() {
            mask |= DIAG_HAS_SYMBOLIC_ID;
        }
        if self.namespace_uri.is_some() {
            mask |= DIAG_HAS_NAMESPACE_URI;
        }
        if self.locale.is_some() {
            mask |= DIAG_HAS_LOCALE;
        }
        if self.localized_text.is_some() {
            mask |= DIAG_HAS_LOCALIZED_TEXT;
        }
        if self.additional_info.is_some() {
            mask |= DIAG_HAS_ADDITIONAL_INFO;
        }
        if self.inner_status_code.is_some() {
            mask |= DIAG_HAS_INNER_STATUS_CODE;
        }
        if self.inner_diagnostic_info.is_some() {
            mask |= DIAG_HAS_INNER_DIAGNOSTIC_INFO;
        }
        mask.encode(cursor)?;
        if let Some(v) = &self.symbolic_id {
            v.encode(cursor)?;
        }
        if let Some(v) = &self.namespace_uri {
            v.encode(cursor)?;
        }
        if let Some(v) = &self.locale {
            v.encode(cursor)?;
        }
        if let Some(v) = &self.localized_text {
            v.encode(cursor)?;
        }
        if let Some(v) = &self.additional_info {
            v.encode(cursor)?;
        }
        if let Some(v) = &self.inner_status_code {
            v.encode(cursor)?;
        }
        if let Some(v) = &self.inner_diagnostic_info {
            v.encode(cursor)?;
        }
        Ok(())
    }
}

impl BinaryDecode for DiagnosticInfo {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let mask = u8::decode(reader)?;
        let symbolic_id = if mask & DIAG_HAS_SYMBOLIC_ID != 0 { Some(i32::decode(reader)?) } else { None };
        let namespace_uri =
            if mask & DIAG_HAS_NAMESPACE_URI != 0 { Some(i32::decode(reader)?) } else { None };
        let locale = if mask & DIAG_HAS_LOCALE != 0 { Some(i32::decode(reader)?) } else { None };
        let localized_text =
            if mask & DIAG_HAS_LOCALIZED_TEXT != 0 { Some(i32::decode(reader)?) } else { None };
        let additional_info =
            if mask & DIAG_HAS_ADDITIONAL_INFO != 0 { Some(UaString::decode(reader)?) } else { None };
        let inner_status_code =
            if mask & DIAG_HAS_INNER_STATUS_CODE != 0 { Some(StatusCode::decode(reader)?) } else { None };
        let inner_diagnostic_info = if mask & DIAG_HAS_INNER_DIAGNOSTIC_INFO != 0 {
            Some(Box::new(DiagnosticInfo::decode(reader)?))
        } else {
            None
        };
        Ok(Self {
            symbolic_id,
            namespace_uri,
            locale,
            localized_text,
            additional_info,
            inner_status_code,
            inner_diagnostic_info,
        })
    }
}

/// Which wire representation a `PublisherId` uses, packed into the low 3
/// bits of `ExtendedFlags1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherIdKind {
    /// No publisher id present on the wire.
    None,
    /// A single byte.
    Byte,
    /// A `u16`.
    UInt16,
    /// A `u32`.
    UInt32,
    /// A `u64`.
    UInt64,
    /// A [`UaString`].
    String,
    /// A [`Guid`].
    Guid,
}

impl PublisherIdKind {
    /// The 3-bit tag this variant occupies in `ExtendedFlags1`.
    #[must_use]
    pub fn to_bits(self) -> u8 {
        match self {
            Self::None => 0x00,
            Self::Byte => 0x01,
            Self::UInt16 => 0x02,
            Self::UInt32 => 0x03,
            Self::UInt64 => 0x04,
            Self::String => 0x05,
            Self::Guid => 0x06,
        }
    }

    /// Recover a variant from its 3-bit tag.
    pub fn from_bits(bits: u8) -> Result<Self> {
        Ok(match bits {
            0x00 => Self::None,
            0x01 => Self::Byte,
            0x02 => Self::UInt16,
            0x03 => Self::UInt32,
            0x04 => Self::UInt64,
            0x05 => Self::String,
            0x06 => Self::Guid,
            other => {
                return Err(ProtocolError::Malformed(format!("unknown PublisherId kind tag {other:#03x}")))
            },
        })
    }
}

/// A publisher identifier, tagged by [`PublisherIdKind`]. Carried in the
/// NetworkMessage header when `publisher_id_enabled` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublisherId {
    /// A single byte.
    Byte(u8),
    /// A `u16`.
    UInt16(u16),
    /// A `u32`.
    UInt32(u32),
    /// A `u64`.
    UInt64(u64),
    /// A string.
    String(UaString),
    /// A GUID.
    Guid(Guid),
}

impl PublisherId {
    /// The [`PublisherIdKind`] this value would encode as.
    #[must_use]
    pub fn kind(&self) -> PublisherIdKind {
        match self {
            Self::Byte(_) => PublisherIdKind::Byte,
            Self::UInt16(_) => PublisherIdKind::UInt16,
            Self::UInt32(_) => PublisherIdKind::UInt32,
            Self::UInt64(_) => PublisherIdKind::UInt64,
            Self::String(_) => PublisherIdKind::String,
            Self::Guid(_) => PublisherIdKind::Guid,
        }
    }

    /// Decode a `PublisherId` whose wire representation is already known
    /// from the surrounding `ExtendedFlags1`.
    pub fn decode_as(kind: PublisherIdKind, reader: &mut Reader<'_>) -> Result<Option<Self>> {
        Ok(match kind {
            PublisherIdKind::None => None,
            PublisherIdKind::Byte => Some(Self::Byte(u8::decode(reader)?)),
            PublisherIdKind::UInt16 => Some(Self::UInt16(u16::decode(reader)?)),
            PublisherIdKind::UInt32 => Some(Self::UInt32(u32::decode(reader)?)),
            PublisherIdKind::UInt64 => Some(Self::UInt64(u64::decode(reader)?)),
            PublisherIdKind::String => Some(Self::String(UaString::decode(reader)?)),
            PublisherIdKind::Guid => Some(Self::Guid(Guid::decode(reader)?)),
        })
    }
}

impl BinaryEncode for PublisherId {
    fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        match self {
            Self::Byte(v) => v.encode(cursor),
            Self::UInt16(v) => v.encode(cursor),
            Self::UInt32(v) => v.encode(cursor),
            Self::UInt64(v) => v.encode(cursor),
            Self::String(v) => v.encode(cursor),
            Self::Guid(v) => v.encode(cursor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publisher_id_kind_bits_round_trip() {
        for kind in [
            PublisherIdKind::None,
            PublisherIdKind::Byte,
            PublisherIdKind::UInt16,
            PublisherIdKind::UInt32,
            PublisherIdKind::UInt64,
            PublisherIdKind::String,
            PublisherIdKind::Guid,
        ] {
            assert_eq!(PublisherIdKind::from_bits(kind.to_bits()).unwrap(), kind);
        }
    }

    #[test]
    fn null_vs_empty_string() {
        let null = UaString::null();
        let empty = UaString::from("");
        assert_ne!(null, empty);

        let mut buf = vec![0u8; null.calc_size()];
        let mut w = Cursor::writer(&mut buf);
        null.encode(&mut w).unwrap();
        assert_eq!(buf, (-1i32).to_le_bytes());
    }

    #[test]
    fn guid_round_trips_through_string_form() {
        let guid = Guid::from_parts(0x1234_5678, 0xABCD, 0xEF01, [1, 2, 3, 4, 5, 6, 7, 8]);
        let s = guid.to_hyphenated_string();
        assert_eq!(Guid::parse(&s).unwrap(), guid);
    }

    #[test]
    fn guid_rejects_malformed_string() {
        assert!(Guid::parse("not-a-guid").is_err());
    }

    #[test]
    fn node_id_picks_compact_encoding() {
        let n = NodeId::numeric(0, 42);
        assert!(matches!(n.identifier, NodeIdIdentifier::TwoByte(42)));
        assert_eq!(n.calc_size(), 2);

        let n = NodeId::numeric(3, 1000);
        assert!(matches!(n.identifier, NodeIdIdentifier::FourByte(3, 1000)));

        let n = NodeId::numeric(300, 1000);
        assert!(matches!(n.identifier, NodeIdIdentifier::Numeric(1000)));
    }

    #[test]
    fn expanded_node_id_round_trip_with_uri_and_server_index() {
        let e = ExpandedNodeId {
            node_id: NodeId::numeric(2, 77),
            namespace_uri: Some(UaString::from("urn:example")),
            server_index: Some(5),
        };
        let mut buf = vec![0u8; e.calc_size()];
        let mut w = Cursor::writer(&mut buf);
        e.encode(&mut w).unwrap();
        let mut r = Reader::new(&buf);
        let decoded = ExpandedNodeId::decode(&mut r).unwrap();
        assert_eq!(decoded, e);
    }
}
