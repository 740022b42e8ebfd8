//! `DataSetMessage`: one publisher dataset's worth of field values plus its
//! own header, nested inside a `NetworkMessage` payload.

use crate::codec::{BinaryDecode, BinaryEncode};
use crate::cursor::{Cursor, Reader};
use crate::datavalue::DataValue;
use crate::error::{ProtocolError, Result};
use crate::flags::{DataSetFlags1, DataSetFlags2};
use crate::types::StatusCode;
use crate::variant::Variant;

/// What kind of update a `DataSetMessage` carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSetMessageType {
    /// A full snapshot of every field.
    KeyFrame,
    /// Only the fields that changed since the last key frame.
    DeltaFrame,
    /// No field data; a liveness signal only.
    KeepAlive,
    /// An out-of-band event notification.
    Event,
}

impl DataSetMessageType {
    fn to_bits(self) -> u8 {
        match self {
            Self::KeyFrame => 0,
            Self::DeltaFrame => 1,
            Self::KeepAlive => 2,
            Self::Event => 3,
        }
    }

    fn from_bits(bits: u8) -> Result<Self> {
        Ok(match bits {
            0 => Self::KeyFrame,
            1 => Self::DeltaFrame,
            2 => Self::KeepAlive,
            3 => Self::Event,
            other => {
                return Err(ProtocolError::Malformed(format!("unknown DataSetMessage type {other}")))
            },
        })
    }
}

/// How each field in `DataSetMessagePayload::KeyFrame`/`DeltaFrame` is
/// encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEncoding {
    /// Each field is a `Variant`.
    Variant,
    /// Each field is the raw scalar bytes, with no type tag (requires the
    /// reader to already know the field's type from its dataset metadata).
    Raw,
    /// Each field is a `DataValue` (value plus quality/timestamps).
    DataValue,
}

impl FieldEncoding {
    fn to_bits(self) -> u8 {
        match self {
            Self::Variant => 0,
            Self::Raw => 1,
            Self::DataValue => 2,
        }
    }

    fn from_bits(bits: u8) -> Result<Self> {
        Ok(match bits & 0x03 {
            0 => Self::Variant,
            1 => Self::Raw,
            2 => Self::DataValue,
            _ => {
                return Err(ProtocolError::Unsupported(
                    "DataSetMessage field encoding RESERVED (3) is not supported".into(),
                ))
            },
        })
    }
}

/// A raw field value under `FieldEncoding::Raw`: opaque bytes whose length
/// and interpretation the caller must already know from dataset metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField(pub Vec<u8>);

/// One dataset field, shaped by the message's `FieldEncoding`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// `FieldEncoding::Variant`.
    Variant(Variant),
    /// `FieldEncoding::Raw`. The caller supplies the byte length per field
    /// since raw fields carry no self-describing length prefix.
    Raw(RawField),
    /// `FieldEncoding::DataValue`.
    DataValue(DataValue),
}

/// The payload carried by a `DataSetMessage`, shaped by its
/// `DataSetMessageType`.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSetMessagePayload {
    /// A full snapshot: one value per configured field, in field order.
    KeyFrame(Vec<FieldValue>),
    /// A sparse update: `(field_index, value)` pairs for changed fields
    /// only, field count taken from the pair count itself (the documented
    /// historic bug of reusing the preceding key frame's field count is
    /// deliberately not reproduced here).
    DeltaFrame(Vec<(u16, FieldValue)>),
    /// No payload.
    KeepAlive,
    /// A single event record, same field shape as a key frame.
    Event(Vec<FieldValue>),
}

/// Header fields preceding a `DataSetMessage`'s payload, gated by
/// [`DataSetFlags1`]/[`DataSetFlags2`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataSetMessageHeader {
    /// Whether the dataset is valid (a publisher clears this to signal a
    /// transient fault while still sending a placeholder message).
    pub valid: bool,
    /// Sequence number of this dataset message, if carried.
    pub sequence_number: Option<u16>,
    /// Quality of the dataset as a whole, if carried.
    pub status: Option<StatusCode>,
    /// Major version of the configuration this message was produced under.
    pub config_major_version: Option<u32>,
    /// Minor version of the configuration this message was produced under.
    pub config_minor_version: Option<u32>,
    /// Message timestamp, if carried.
    pub timestamp: Option<crate::types::UaDateTime>,
    /// Sub-100ns precision for `timestamp`, if carried.
    pub picoseconds: Option<u16>,
}

/// A complete `DataSetMessage`: header plus type-shaped payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSetMessage {
    /// Header fields.
    pub header: DataSetMessageHeader,
    /// How payload fields are encoded.
    pub field_encoding: FieldEncoding,
    /// The payload itself.
    pub payload: DataSetMessagePayload,
}

impl DataSetMessage {
    fn message_type(&self) -> DataSetMessageType {
        match &self.payload {
            DataSetMessagePayload::KeyFrame(_) => DataSetMessageType::KeyFrame,
            DataSetMessagePayload::DeltaFrame(_) => DataSetMessageType::DeltaFrame,
            DataSetMessagePayload::KeepAlive => DataSetMessageType::KeepAlive,
            DataSetMessagePayload::Event(_) => DataSetMessageType::Event,
        }
    }

    fn encode_field(&self, value: &FieldValue, cursor: &mut Cursor<'_>) -> Result<()> {
        match value {
            FieldValue::Variant(v) => v.encode(cursor),
            FieldValue::Raw(r) => cursor.put_bytes(&r.0),
            FieldValue::DataValue(v) => v.encode(cursor),
        }
    }

    fn decode_field(field_encoding: FieldEncoding, reader: &mut Reader<'_>) -> Result<FieldValue> {
        Ok(match field_encoding {
            FieldEncoding::Variant => FieldValue::Variant(Variant::decode(reader)?),
            FieldEncoding::DataValue => FieldValue::DataValue(DataValue::decode(reader)?),
            FieldEncoding::Raw => {
                return Err(ProtocolError::Unsupported(
                    "raw field decode requires a caller-supplied field length".into(),
                ))
            },
        })
    }
}

impl BinaryEncode for DataSetMessage {
    fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        let message_type = self.message_type();
        let flags1 = DataSetFlags1 {
            valid: self.header.valid,
            field_encoding: self.field_encoding.to_bits(),
            sequence_number_enabled: self.header.sequence_number.is_some(),
            status_enabled: self.header.status.is_some(),
            config_major_version_enabled: self.header.config_major_version.is_some(),
            config_minor_version_enabled: self.header.config_minor_version.is_some(),
            flags2_enabled: true,
        };
        flags1.pack().encode(cursor)?;

        let flags2 = DataSetFlags2 {
            message_type: message_type.to_bits(),
            timestamp_enabled: self.header.timestamp.is_some(),
            picoseconds_enabled: self.header.picoseconds.is_some(),
        };
        flags2.pack().encode(cursor)?;

        if let Some(v) = &self.header.sequence_number {
            v.encode(cursor)?;
        }
        if let Some(v) = &self.header.timestamp {
            v.encode(cursor)?;
        }
        if let Some(v) = &self.header.picoseconds {
            v.encode(cursor)?;
        }
        if let Some(v) = &self.header.status {
            v.encode(cursor)?;
        }
        if let Some(v) = &self.header.config_major_version {
            v.encode(cursor)?;
        }
        if let Some(v) = &self.header.config_minor_version {
            v.encode(cursor)?;
        }

        match &self.payload {
            DataSetMessagePayload::KeyFrame(fields) | DataSetMessagePayload::Event(fields) => {
                // A RAW-encoded keyframe/event carries no field_count: its
                // payload is a single opaque blob the reader must already
                // know the length of from dataset metadata.
                if self.field_encoding != FieldEncoding::Raw {
                    let count = u16::try_from(fields.len())
                        .map_err(|_| ProtocolError::InvalidArgument("too many dataset fields".into()))?;
                    count.encode(cursor)?;
                }
                for field in fields {
                    self.encode_field(field, cursor)?;
                }
            },
            DataSetMessagePayload::DeltaFrame(pairs) => {
                let count = u16::try_from(pairs.len())
                    .map_err(|_| ProtocolError::InvalidArgument("too many delta fields".into()))?;
                count.encode(cursor)?;
                for (index, field) in pairs {
                    index.encode(cursor)?;
                    self.encode_field(field, cursor)?;
                }
            },
            DataSetMessagePayload::KeepAlive => {},
        }
        Ok(())
    }
}

/// Decode a `DataSetMessage` from `reader`.
///
/// Unlike most types here this isn't a plain [`BinaryDecode::decode`]
/// because the field count for `KeepAlive` is zero by definition and for
/// `DeltaFrame` must come from the pairs actually present on the wire, not
/// from any previously decoded key frame's field count.
impl BinaryDecode for DataSetMessage {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let flags1 = DataSetFlags1::unpack(u8::decode(reader)?);
        let flags2_byte = if flags1.flags2_enabled {
            u8::decode(reader)?
        } else {
            0
        };
        let flags2 = crate::flags::DataSetFlags2::unpack(flags2_byte);

        let field_encoding = FieldEncoding::from_bits(flags1.field_encoding)?;
        let message_type = DataSetMessageType::from_bits(flags2.message_type)?;

        let sequence_number =
            if flags1.sequence_number_enabled { Some(u16::decode(reader)?) } else { None };
        let timestamp =
            if flags2.timestamp_enabled { Some(crate::types::UaDateTime::decode(reader)?) } else { None };
        let picoseconds = if flags2.picoseconds_enabled { Some(u16::decode(reader)?) } else { None };
        let status = if flags1.status_enabled { Some(StatusCode::decode(reader)?) } else { None };
        let config_major_version =
            if flags1.config_major_version_enabled { Some(u32::decode(reader)?) } else { None };
        let config_minor_version =
            if flags1.config_minor_version_enabled { Some(u32::decode(reader)?) } else { None };

        let header = DataSetMessageHeader {
            valid: flags1.valid,
            sequence_number,
            status,
            config_major_version,
            config_minor_version,
            timestamp,
            picoseconds,
        };

        let payload = match message_type {
            DataSetMessageType::KeepAlive => DataSetMessagePayload::KeepAlive,
            DataSetMessageType::KeyFrame => {
                if field_encoding == FieldEncoding::Raw {
                    return Err(ProtocolError::Unsupported(
                        "RAW-encoded keyframe carries no field_count; decode requires a caller-supplied \
                         field layout"
                            .into(),
                    ));
                }
                let count = u16::decode(reader)?;
                let mut fields = Vec::with_capacity((count as usize).min(1 << 16));
                for _ in 0..count {
                    fields.push(DataSetMessage::decode_field(field_encoding, reader)?);
                }
                DataSetMessagePayload::KeyFrame(fields)
            },
            DataSetMessageType::Event => {
                if field_encoding == FieldEncoding::Raw {
                    return Err(ProtocolError::Unsupported(
                        "RAW-encoded event carries no field_count; decode requires a caller-supplied \
                         field layout"
                            .into(),
                    ));
                }
                let count = u16::decode(reader)?;
                let mut fields = Vec::with_capacity((count as usize).min(1 << 16));
                for _ in 0..count {
                    fields.push(DataSetMessage::decode_field(field_encoding, reader)?);
                }
                DataSetMessagePayload::Event(fields)
            },
            DataSetMessageType::DeltaFrame => {
                // The count here is this message's own delta-field count,
                // read fresh off the wire; it is never taken from a
                // previously decoded key frame.
                let count = u16::decode(reader)?;
                let mut pairs = Vec::with_capacity((count as usize).min(1 << 16));
                for _ in 0..count {
                    let index = u16::decode(reader)?;
                    let field = DataSetMessage::decode_field(field_encoding, reader).map_err(|e| {
                        ProtocolError::Malformed(format!("delta field {index} decode failed: {e}"))
                    })?;
                    pairs.push((index, field));
                }
                DataSetMessagePayload::DeltaFrame(pairs)
            },
        };

        Ok(Self { header, field_encoding, payload })
    }
}
