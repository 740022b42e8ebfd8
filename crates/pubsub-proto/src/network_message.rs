//! `NetworkMessage`: the top-level UADP binary frame carrying one or more
//! `DataSetMessage`s, bracketed by chained optional headers and an optional
//! security footer.

use crate::codec::{BinaryDecode, BinaryEncode};
use crate::cursor::{Cursor, Reader};
use crate::dataset_message::DataSetMessage;
use crate::error::{ProtocolError, Result};
use crate::flags::{ExtendedFlags1, ExtendedFlags2, GroupFlags, SecurityFlags, UadpHeaderByte};
use crate::types::{Guid, PublisherId, UaDateTime};
use crate::variant::Variant;

/// The network message type carried in `ExtendedFlags2.message_type`. Only
/// `DataSet` is supported; the others are recognized on decode so a
/// sensible error can be raised rather than a generic parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkMessageType {
    /// Carries `DataSetMessage`s; the only type this codec encodes/decodes.
    DataSet,
    /// A subscriber's request for dataset metadata; not implemented.
    DiscoveryRequest,
    /// A publisher's response to a discovery request; not implemented.
    DiscoveryResponse,
}

impl NetworkMessageType {
    fn to_bits(self) -> u8 {
        match self {
            Self::DataSet => 0,
            Self::DiscoveryRequest => 1,
            Self::DiscoveryResponse => 2,
        }
    }

    fn from_bits(bits: u8) -> Result<Self> {
        Ok(match bits {
            0 => Self::DataSet,
            1 => Self::DiscoveryRequest,
            2 => Self::DiscoveryResponse,
            other => return Err(ProtocolError::Malformed(format!("unknown NetworkMessage type {other}"))),
        })
    }
}

/// `GroupHeader`: writer group identity and sequencing, present when
/// `UadpHeaderByte.group_header_enabled`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupHeader {
    /// Identifies the writer group this message belongs to.
    pub writer_group_id: Option<u16>,
    /// Changes whenever the writer group's configuration changes.
    pub group_version: Option<u32>,
    /// Monotonic counter identifying this specific network message.
    pub network_message_number: Option<u16>,
    /// Monotonic sequence counter for loss detection.
    pub sequence_number: Option<u16>,
}

/// `PayloadHeader`: which dataset writers contributed the `DataSetMessage`s
/// that follow, present when `UadpHeaderByte.payload_header_enabled`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PayloadHeader {
    /// One id per `DataSetMessage`, same order as the payload.
    pub dataset_writer_ids: Vec<u16>,
}

/// `SecurityHeader`: present when `ExtendedFlags1.security_enabled`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecurityHeader {
    /// Whether the message is signed.
    pub signed: bool,
    /// Whether the message is encrypted.
    pub encrypted: bool,
    /// Identifies which key (from a rotating key set) secured this message.
    pub security_token_id: u32,
    /// Per-message nonce consumed by the security policy.
    pub nonce: Vec<u8>,
    /// Size of the trailing security footer (e.g. signature), if present.
    pub footer_size: Option<u16>,
}

/// A complete UADP `NetworkMessage`.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkMessage {
    /// Protocol version, low nibble of the first wire byte.
    pub version: u8,
    /// Who published this message, if carried.
    pub publisher_id: Option<PublisherId>,
    /// Identifies which dataset class the payload conforms to, if carried.
    pub dataset_class_id: Option<Guid>,
    /// True if this message is one chunk of a larger logical message (not
    /// reassembled by this crate; carried through as metadata only).
    pub chunk_message: bool,
    /// Group-level header fields.
    pub group_header: Option<GroupHeader>,
    /// Which dataset writer produced each `DataSetMessage`.
    pub payload_header: Option<PayloadHeader>,
    /// Security framing, if the message is signed and/or encrypted.
    pub security_header: Option<SecurityHeader>,
    /// Message-level timestamp, if carried.
    pub timestamp: Option<UaDateTime>,
    /// Sub-100ns precision for `timestamp`, if carried.
    pub picoseconds: Option<u16>,
    /// A small set of fields lifted to this header for low-latency
    /// subscriber filtering, framed by a `u16` byte length (not element
    /// count) ahead of the variants themselves.
    pub promoted_fields: Option<Vec<Variant>>,
    /// The dataset messages carried by this network message.
    pub dataset_messages: Vec<DataSetMessage>,
    /// Trailing signature bytes, present when `security_header` requests a
    /// footer. Populated by the caller's security policy, not this codec.
    pub security_footer: Vec<u8>,
}

fn publisher_id_enabled(publisher_id: &Option<PublisherId>) -> bool {
    publisher_id.is_some()
}

fn extended_flags1_needed(msg: &NetworkMessage) -> bool {
    msg.publisher_id.is_some()
        || msg.dataset_class_id.is_some()
        || msg.security_header.is_some()
        || msg.timestamp.is_some()
        || msg.picoseconds.is_some()
        || extended_flags2_needed(msg)
}

fn extended_flags2_needed(msg: &NetworkMessage) -> bool {
    msg.chunk_message || msg.promoted_fields.is_some()
}

impl BinaryEncode for NetworkMessage {
    fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        let ext1_needed = extended_flags1_needed(self);
        let ext2_needed = extended_flags2_needed(self);

        let header_byte = UadpHeaderByte {
            version: self.version,
            publisher_id_enabled: publisher_id_enabled(&self.publisher_id),
            group_header_enabled: self.group_header.is_some(),
            payload_header_enabled: self.payload_header.is_some(),
            extended_flags1_enabled: ext1_needed,
        };
        header_byte.pack().encode(cursor)?;

        if ext1_needed {
            let flags1 = ExtendedFlags1 {
                publisher_id_kind: self
                    .publisher_id
                    .as_ref()
                    .map_or(crate::types::PublisherIdKind::None, PublisherId::kind),
                dataset_class_id_enabled: self.dataset_class_id.is_some(),
                security_enabled: self.security_header.is_some(),
                timestamp_enabled: self.timestamp.is_some(),
                picoseconds_enabled: self.picoseconds.is_some(),
                extended_flags2_enabled: ext2_needed,
            };
            flags1.pack().encode(cursor)?;

            if ext2_needed {
                let flags2 = ExtendedFlags2 {
                    chunk_message: self.chunk_message,
                    promoted_fields_enabled: self.promoted_fields.is_some(),
                    message_type: NetworkMessageType::DataSet.to_bits(),
                };
                flags2.pack().encode(cursor)?;
            }
        }

        if let Some(publisher_id) = &self.publisher_id {
            publisher_id.encode(cursor)?;
        }
        if let Some(dataset_class_id) = &self.dataset_class_id {
            dataset_class_id.encode(cursor)?;
        }

        if let Some(group) = &self.group_header {
            let group_flags = GroupFlags {
                writer_group_id_enabled: group.writer_group_id.is_some(),
                group_version_enabled: group.group_version.is_some(),
                network_message_number_enabled: group.network_message_number.is_some(),
                sequence_number_enabled: group.sequence_number.is_some(),
            };
            group_flags.pack().encode(cursor)?;
            if let Some(v) = group.writer_group_id {
                v.encode(cursor)?;
            }
            if let Some(v) = group.group_version {
                v.encode(cursor)?;
            }
            if let Some(v) = group.network_message_number {
                v.encode(cursor)?;
            }
            if let Some(v) = group.sequence_number {
                v.encode(cursor)?;
            }
        }

        if let Some(payload_header) = &self.payload_header {
            let count = u8::try_from(payload_header.dataset_writer_ids.len())
                .map_err(|_| ProtocolError::InvalidArgument("too many dataset writers".into()))?;
            count.encode(cursor)?;
            for id in &payload_header.dataset_writer_ids {
                id.encode(cursor)?;
            }
        }

        if let Some(v) = &self.timestamp {
            v.encode(cursor)?;
        }
        if let Some(v) = &self.picoseconds {
            v.encode(cursor)?;
        }
        if let Some(fields) = &self.promoted_fields {
            let byte_len: usize = fields.iter().map(BinaryEncode::calc_size).sum();
            let byte_len = u16::try_from(byte_len)
                .map_err(|_| ProtocolError::InvalidArgument("promoted fields too large".into()))?;
            byte_len.encode(cursor)?;
            for field in fields {
                field.encode(cursor)?;
            }
        }

        if let Some(security) = &self.security_header {
            let security_flags = SecurityFlags {
                signed: security.signed,
                encrypted: security.encrypted,
                footer_enabled: security.footer_size.is_some(),
                force_key_reset: false,
            };
            security_flags.pack().encode(cursor)?;
            security.security_token_id.encode(cursor)?;
            let nonce_len = u8::try_from(security.nonce.len())
                .map_err(|_| ProtocolError::InvalidArgument("security nonce too long".into()))?;
            nonce_len.encode(cursor)?;
            cursor.put_bytes(&security.nonce)?;
            if let Some(footer_size) = security.footer_size {
                footer_size.encode(cursor)?;
            }
        }

        // When more than one DataSetMessage is present, the full array of
        // per-message byte sizes is written first, as one contiguous block,
        // followed by the dataset message bodies themselves, also as one
        // contiguous block, so a reader can split the payload into frames
        // before decoding any of them. A single message needs no size
        // prefix since it simply runs to the end of the payload region.
        let needs_size_prefixes = self.dataset_messages.len() > 1;
        if needs_size_prefixes {
            for message in &self.dataset_messages {
                let size = u16::try_from(message.calc_size())
                    .map_err(|_| ProtocolError::InvalidArgument("dataset message too large".into()))?;
                size.encode(cursor)?;
            }
        }
        for message in &self.dataset_messages {
            message.encode(cursor)?;
        }

        if self.security_header.as_ref().is_some_and(|s| s.footer_size.is_some()) {
            cursor.put_bytes(&self.security_footer)?;
        }

        Ok(())
    }
}

impl BinaryDecode for NetworkMessage {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let header_byte = UadpHeaderByte::unpack(u8::decode(reader)?);

        let mut flags1 = ExtendedFlags1 {
            publisher_id_kind: crate::types::PublisherIdKind::None,
            dataset_class_id_enabled: false,
            security_enabled: false,
            timestamp_enabled: false,
            picoseconds_enabled: false,
            extended_flags2_enabled: false,
        };
        let mut chunk_message = false;
        let mut message_type = NetworkMessageType::DataSet;
        let mut promoted_fields_enabled = false;

        if header_byte.extended_flags1_enabled {
            flags1 = ExtendedFlags1::unpack(u8::decode(reader)?)?;
            if flags1.extended_flags2_enabled {
                let flags2 = ExtendedFlags2::unpack(u8::decode(reader)?);
                chunk_message = flags2.chunk_message;
                promoted_fields_enabled = flags2.promoted_fields_enabled;
                message_type = NetworkMessageType::from_bits(flags2.message_type)?;
            }
        }

        if message_type != NetworkMessageType::DataSet {
            return Err(ProtocolError::Unsupported(format!(
                "NetworkMessage type {message_type:?} is not supported"
            )));
        }

        let publisher_id = PublisherId::decode_as(flags1.publisher_id_kind, reader)?;
        let dataset_class_id =
            if flags1.dataset_class_id_enabled { Some(Guid::decode(reader)?) } else { None };

        let group_header = if header_byte.group_header_enabled {
            let group_flags = GroupFlags::unpack(u8::decode(reader)?);
            Some(GroupHeader {
                writer_group_id: if group_flags.writer_group_id_enabled {
                    Some(u16::decode(reader)?)
                } else {
                    None
                },
                group_version: if group_flags.group_version_enabled {
                    Some(u32::decode(reader)?)
                } else {
                    None
                },
                network_message_number: if group_flags.network_message_number_enabled {
                    Some(u16::decode(reader)?)
                } else {
                    None
                },
                sequence_number: if group_flags.sequence_number_enabled {
                    Some(u16::decode(reader)?)
                } else {
                    None
                },
            })
        } else {
            None
        };

        let payload_header = if header_byte.payload_header_enabled {
            let count = u8::decode(reader)?;
            let mut dataset_writer_ids = Vec::with_capacity(count as usize);
            for _ in 0..count {
                dataset_writer_ids.push(u16::decode(reader)?);
            }
            Some(PayloadHeader { dataset_writer_ids })
        } else {
            None
        };

        let timestamp = if flags1.timestamp_enabled { Some(UaDateTime::decode(reader)?) } else { None };
        let picoseconds = if flags1.picoseconds_enabled { Some(u16::decode(reader)?) } else { None };

        let promoted_fields = if promoted_fields_enabled {
            let byte_len = u16::decode(reader)? as usize;
            let bytes = reader.take(byte_len)?;
            let mut sub_reader = Reader::new(bytes);
            let mut fields = Vec::new();
            while sub_reader.remaining() > 0 {
                fields.push(Variant::decode(&mut sub_reader)?);
            }
            Some(fields)
        } else {
            None
        };

        let security_header = if flags1.security_enabled {
            let security_flags = SecurityFlags::unpack(u8::decode(reader)?);
            let security_token_id = u32::decode(reader)?;
            let nonce_len = u8::decode(reader)?;
            let nonce = reader.take(nonce_len as usize)?.to_vec();
            let footer_size =
                if security_flags.footer_enabled { Some(u16::decode(reader)?) } else { None };
            Some(SecurityHeader {
                signed: security_flags.signed,
                encrypted: security_flags.encrypted,
                security_token_id,
                nonce,
                footer_size,
            })
        } else {
            None
        };

        let expected_count = payload_header.as_ref().map(|h| h.dataset_writer_ids.len());
        let dataset_messages = decode_dataset_messages(reader, expected_count)?;

        let security_footer = if let Some(security) = &security_header {
            match security.footer_size {
                Some(size) => reader.take(size as usize)?.to_vec(),
                None => Vec::new(),
            }
        } else {
            Vec::new()
        };

        Ok(Self {
            version: header_byte.version,
            publisher_id,
            dataset_class_id,
            chunk_message,
            group_header,
            payload_header,
            security_header,
            timestamp,
            picoseconds,
            promoted_fields,
            dataset_messages,
            security_footer,
        })
    }
}

fn decode_dataset_messages(
    reader: &mut Reader<'_>,
    expected_count: Option<usize>,
) -> Result<Vec<DataSetMessage>> {
    let count = expected_count.unwrap_or(1);
    let mut messages = Vec::with_capacity(count.min(1 << 16));
    if count > 1 {
        let mut sizes = Vec::with_capacity(count);
        for _ in 0..count {
            sizes.push(u16::decode(reader)? as usize);
        }
        for size in sizes {
            let bytes = reader.take(size)?;
            let mut sub_reader = Reader::new(bytes);
            messages.push(DataSetMessage::decode(&mut sub_reader)?);
        }
    } else {
        for _ in 0..count {
            messages.push(DataSetMessage::decode(reader)?);
        }
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset_message::{DataSetMessageHeader, DataSetMessagePayload, FieldEncoding, FieldValue};
    use crate::variant::{ScalarValue, Variant};

    fn sample_dataset_message() -> DataSetMessage {
        DataSetMessage {
            header: DataSetMessageHeader { valid: true, ..Default::default() },
            field_encoding: FieldEncoding::Variant,
            payload: DataSetMessagePayload::KeyFrame(vec![FieldValue::Variant(Variant::Scalar(
                ScalarValue::UInt32(42),
            ))]),
        }
    }

    #[test]
    fn minimal_network_message_round_trips() {
        let msg = NetworkMessage {
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
            dataset_messages: vec![sample_dataset_message()],
            security_footer: Vec::new(),
        };
        let mut buf = vec![0u8; msg.calc_size()];
        let mut w = Cursor::writer(&mut buf);
        msg.encode(&mut w).unwrap();
        let mut r = Reader::new(&buf);
        assert_eq!(NetworkMessage::decode(&mut r).unwrap(), msg);
    }

    #[test]
    fn full_network_message_round_trips_with_multiple_payloads() {
        let msg = NetworkMessage {
            version: 1,
            publisher_id: Some(PublisherId::UInt16(7)),
            dataset_class_id: Some(Guid::from_parts(1, 2, 3, [0; 8])),
            chunk_message: false,
            group_header: Some(GroupHeader {
                writer_group_id: Some(5),
                group_version: Some(100),
                network_message_number: None,
                sequence_number: Some(9),
            }),
            payload_header: Some(PayloadHeader { dataset_writer_ids: vec![1, 2] }),
            security_header: None,
            timestamp: Some(UaDateTime::from_ticks(123_456)),
            picoseconds: None,
            promoted_fields: None,
            dataset_messages: vec![sample_dataset_message(), sample_dataset_message()],
            security_footer: Vec::new(),
        };
        let mut buf = vec![0u8; msg.calc_size()];
        let mut w = Cursor::writer(&mut buf);
        msg.encode(&mut w).unwrap();
        let mut r = Reader::new(&buf);
        assert_eq!(NetworkMessage::decode(&mut r).unwrap(), msg);
    }

    #[test]
    fn promoted_fields_round_trip_alongside_security_header() {
        let msg = NetworkMessage {
            version: 1,
            publisher_id: None,
            dataset_class_id: None,
            chunk_message: false,
            group_header: None,
            payload_header: None,
            security_header: Some(SecurityHeader {
                signed: true,
                encrypted: false,
                security_token_id: 42,
                nonce: vec![1, 2, 3, 4],
                footer_size: None,
            }),
            timestamp: Some(UaDateTime::from_ticks(1)),
            picoseconds: Some(500),
            promoted_fields: Some(vec![Variant::Scalar(ScalarValue::UInt32(7)), Variant::Scalar(ScalarValue::Boolean(true))]),
            dataset_messages: vec![sample_dataset_message()],
            security_footer: Vec::new(),
        };
        let mut buf = vec![0u8; msg.calc_size()];
        let mut w = Cursor::writer(&mut buf);
        msg.encode(&mut w).unwrap();
        let mut r = Reader::new(&buf);
        assert_eq!(NetworkMessage::decode(&mut r).unwrap(), msg);
    }

    #[test]
    fn non_dataset_message_type_is_unsupported() {
        let mut buf = vec![0u8; 4];
        {
            let mut w = Cursor::writer(&mut buf);
            let header_byte =
                UadpHeaderByte { version: 1, publisher_id_enabled: false, group_header_enabled: false, payload_header_enabled: false, extended_flags1_enabled: true };
            header_byte.pack().encode(&mut w).unwrap();
            let flags1 = ExtendedFlags1 {
                publisher_id_kind: crate::types::PublisherIdKind::None,
                dataset_class_id_enabled: false,
                security_enabled: false,
                timestamp_enabled: false,
                picoseconds_enabled: false,
                extended_flags2_enabled: true,
            };
            flags1.pack().encode(&mut w).unwrap();
            let flags2 = ExtendedFlags2 {
                chunk_message: false,
                promoted_fields_enabled: false,
                message_type: NetworkMessageType::DiscoveryRequest.to_bits(),
            };
            flags2.pack().encode(&mut w).unwrap();
        }
        let mut r = Reader::new(&buf[..3]);
        assert!(matches!(NetworkMessage::decode(&mut r), Err(ProtocolError::Unsupported(_))));
    }
}
