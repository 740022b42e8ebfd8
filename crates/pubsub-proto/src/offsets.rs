//! The realtime offset table: a precomputed map of `{field kind, absolute
//! byte offset}` pairs that lets a publisher mutate an already-encoded
//! `NetworkMessage` buffer in place, skipping the general encoder on the
//! hot path.

use crate::codec::BinaryEncode;
use crate::error::{ProtocolError, Result};
use crate::network_message::NetworkMessage;

/// What a single offset-table entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetKind {
    /// The `NetworkMessage`-level sequence number, if present.
    NetworkMessageSequenceNumber,
    /// The `GroupHeader.group_version` field, if present.
    GroupVersion,
    /// Size prefix of dataset message `index` (only present when more than
    /// one `DataSetMessage` is carried).
    PayloadSize {
        /// Index into `dataset_messages`.
        index: usize,
    },
    /// The per-`DataSetMessage` sequence number at `index`, if present.
    DataSetMessageSequenceNumber {
        /// Index into `dataset_messages`.
        index: usize,
    },
    /// The per-`DataSetMessage` timestamp at `index`, if present.
    Timestamp {
        /// Index into `dataset_messages`.
        index: usize,
    },
    /// The per-`DataSetMessage` status code at `index`, if present.
    Status {
        /// Index into `dataset_messages`.
        index: usize,
    },
    /// A single field inside dataset message `index`'s key frame, at field
    /// position `field`. Only fixed-width scalar fields are addressable
    /// this way; variable-width fields (e.g. strings) cannot move without
    /// invalidating every later offset, so they are excluded up front.
    KeyframeField {
        /// Index into `dataset_messages`.
        index: usize,
        /// Field position inside that message's key frame.
        field: usize,
    },
    /// A single raw-encoded field inside dataset message `index`, at byte
    /// offset `field` within the raw blob, spanning `length` bytes.
    RawField {
        /// Index into `dataset_messages`.
        index: usize,
        /// Field position inside that message's raw-encoded payload.
        field: usize,
        /// Width in bytes of this raw field.
        length: usize,
    },
    /// Where the security signature computation starts (the first byte
    /// after the `SecurityHeader`).
    SignatureStart,
    /// Where encryption begins (the first byte of the payload region).
    EncryptStart,
}

/// One `{kind, absolute offset}` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetEntry {
    /// What this offset points at.
    pub kind: OffsetKind,
    /// Byte offset from the start of the publish buffer.
    pub offset: usize,
    /// Width in bytes of the field at `offset`, used to validate that an
    /// in-place mutation would not change the encoded length.
    pub width: usize,
}

/// Lifecycle state of an [`OffsetTable`], mirroring a PubSub connection's
/// own state machine: a table is built once a `NetworkMessage` shape is
/// fixed, used repeatedly while that shape holds, and invalidated the
/// moment a reconfiguration could move any recorded offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetTableState {
    /// No table has been computed yet.
    Uninitialized,
    /// A shape is fixed and a table has been computed, but the buffer it
    /// describes has not yet been published.
    Configured,
    /// The table is being used for repeated in-place publishes.
    Operational,
    /// The table is no longer valid; the shape must be recomputed.
    Disposed,
}

/// A computed offset table for one `NetworkMessage` shape, plus the state
/// machine guarding its validity.
#[derive(Debug, Clone)]
pub struct OffsetTable {
    entries: Vec<OffsetEntry>,
    state: OffsetTableState,
    total_size: usize,
}

impl OffsetTable {
    /// An empty table in the `Uninitialized` state.
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Vec::new(), state: OffsetTableState::Uninitialized, total_size: 0 }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> OffsetTableState {
        self.state
    }

    /// Recorded offset entries, in the order they were discovered during
    /// the shaping encode pass.
    #[must_use]
    pub fn entries(&self) -> &[OffsetEntry] {
        &self.entries
    }

    /// Total encoded size of the `NetworkMessage` this table describes.
    #[must_use]
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Compute offsets for `message`'s current shape and move the table to
    /// `Configured`. Only fixed-width header and key-frame scalar fields
    /// are recorded; anything variable-width (strings, delta frames, raw
    /// fields of caller-defined length) is left out of the table and must
    /// go through the general encoder.
    pub fn calculate_and_record_offsets(&mut self, message: &NetworkMessage) -> Result<()> {
        self.entries.clear();
        let mut pos = 0usize;

        pos += 1; // UadpHeaderByte
        let ext2_present = message.chunk_message || message.promoted_fields.is_some();
        let ext1_present = message.publisher_id.is_some()
            || message.dataset_class_id.is_some()
            || message.security_header.is_some()
            || message.timestamp.is_some()
            || message.picoseconds.is_some()
            || ext2_present;
        if ext1_present {
            pos += 1; // ExtendedFlags1
            if ext2_present {
                pos += 1; // ExtendedFlags2
            }
        }

        if let Some(publisher_id) = &message.publisher_id {
            pos += publisher_id.calc_size();
        }
        if let Some(dataset_class_id) = &message.dataset_class_id {
            pos += dataset_class_id.calc_size();
        }

        if let Some(group) = &message.group_header {
            pos += 1; // GroupFlags
            if group.writer_group_id.is_some() {
                pos += 2;
            }
            if group.group_version.is_some() {
                self.entries.push(OffsetEntry { kind: OffsetKind::GroupVersion, offset: pos, width: 4 });
                pos += 4;
            }
            if group.network_message_number.is_some() {
                pos += 2;
            }
            if group.sequence_number.is_some() {
                self.entries.push(OffsetEntry {
                    kind: OffsetKind::NetworkMessageSequenceNumber,
                    offset: pos,
                    width: 2,
                });
                pos += 2;
            }
        }

        if let Some(payload_header) = &message.payload_header {
            pos += 1; // count byte
            pos += 2 * payload_header.dataset_writer_ids.len();
        }

        if message.timestamp.is_some() {
            pos += 8;
        }
        if message.picoseconds.is_some() {
            pos += 2;
        }
        if let Some(fields) = &message.promoted_fields {
            pos += 2; // u16 byte-length prefix
            pos += fields.iter().map(BinaryEncode::calc_size).sum::<usize>();
        }

        if let Some(security) = &message.security_header {
            pos += 1; // SecurityFlags
            pos += 4; // security_token_id
            pos += 1; // nonce length byte
            pos += security.nonce.len();
            if security.footer_size.is_some() {
                pos += 2;
            }
        }
        self.entries.push(OffsetEntry { kind: OffsetKind::SignatureStart, offset: pos, width: 0 });
        self.entries.push(OffsetEntry { kind: OffsetKind::EncryptStart, offset: pos, width: 0 });

        let multi_message = message.dataset_messages.len() > 1;
        if multi_message {
            for index in 0..message.dataset_messages.len() {
                self.entries.push(OffsetEntry { kind: OffsetKind::PayloadSize { index }, offset: pos, width: 2 });
                pos += 2;
            }
        }
        for (index, dsm) in message.dataset_messages.iter().enumerate() {
            pos = self.record_dataset_message_offsets(dsm, index, pos)?;
        }

        self.total_size = pos;
        self.state = OffsetTableState::Configured;
        Ok(())
    }

    fn record_dataset_message_offsets(
        &mut self,
        dsm: &crate::dataset_message::DataSetMessage,
        index: usize,
        start: usize,
    ) -> Result<usize> {
        use crate::dataset_message::{DataSetMessagePayload, FieldEncoding, FieldValue};
        use crate::variant::Variant;

        let mut pos = start;
        pos += 1; // DataSetFlags1
        pos += 1; // DataSetFlags2 (flags2_enabled is always set by this codec's encoder)

        if dsm.header.sequence_number.is_some() {
            self.entries.push(OffsetEntry {
                kind: OffsetKind::DataSetMessageSequenceNumber { index },
                offset: pos,
                width: 2,
            });
            pos += 2;
        }
        if dsm.header.timestamp.is_some() {
            self.entries.push(OffsetEntry { kind: OffsetKind::Timestamp { index }, offset: pos, width: 8 });
            pos += 8;
        }
        if dsm.header.picoseconds.is_some() {
            pos += 2;
        }
        if dsm.header.status.is_some() {
            self.entries.push(OffsetEntry { kind: OffsetKind::Status { index }, offset: pos, width: 4 });
            pos += 4;
        }
        if dsm.header.config_major_version.is_some() {
            pos += 4;
        }
        if dsm.header.config_minor_version.is_some() {
            pos += 4;
        }

        match &dsm.payload {
            DataSetMessagePayload::KeyFrame(fields) | DataSetMessagePayload::Event(fields) => {
                // A RAW-encoded keyframe/event carries no field_count on the wire.
                if dsm.field_encoding != FieldEncoding::Raw {
                    pos += 2; // field count
                }
                for (field_index, field) in fields.iter().enumerate() {
                    match field {
                        FieldValue::Variant(Variant::Scalar(scalar)) => {
                            let width = scalar_fixed_width(scalar);
                            if let Some(width) = width {
                                // +1 for the Variant type-tag byte preceding the scalar body.
                                self.entries.push(OffsetEntry {
                                    kind: OffsetKind::KeyframeField { index, field: field_index },
                                    offset: pos + 1,
                                    width,
                                });
                            }
                            pos += field.calc_size();
                        },
                        FieldValue::Raw(raw) => {
                            self.entries.push(OffsetEntry {
                                kind: OffsetKind::RawField { index, field: field_index, length: raw.0.len() },
                                offset: pos,
                                width: raw.0.len(),
                            });
                            pos += field.calc_size();
                        },
                        other => pos += other.calc_size(),
                    }
                }
            },
            DataSetMessagePayload::DeltaFrame(pairs) => {
                pos += 2;
                for (_, field) in pairs {
                    pos += field.calc_size();
                }
            },
            DataSetMessagePayload::KeepAlive => {},
        }
        Ok(pos)
    }

    /// Move from `Configured`/`Operational` back to `Operational`, the
    /// state a publisher stays in while repeatedly mutating the same
    /// buffer shape in place.
    pub fn activate(&mut self) -> Result<()> {
        match self.state {
            OffsetTableState::Configured | OffsetTableState::Operational => {
                self.state = OffsetTableState::Operational;
                Ok(())
            },
            other => Err(ProtocolError::OffsetInvalidated(format!(
                "cannot activate an offset table in state {other:?}"
            ))),
        }
    }

    /// Mark the table invalid, forcing the next publish to fall back to
    /// the general encoder and rebuild the table.
    pub fn dispose(&mut self) {
        self.state = OffsetTableState::Disposed;
    }

    /// Mutate the fixed-width field recorded under `kind`, failing if the
    /// table isn't `Operational` or `new_bytes.len()` would change the
    /// field's encoded width.
    pub fn write_in_place(&self, buf: &mut [u8], kind: OffsetKind, new_bytes: &[u8]) -> Result<()> {
        if self.state != OffsetTableState::Operational {
            return Err(ProtocolError::OffsetInvalidated(format!(
                "offset table is {:?}, not Operational",
                self.state
            )));
        }
        let entry = self
            .entries
            .iter()
            .find(|e| e.kind == kind)
            .ok_or_else(|| ProtocolError::OffsetInvalidated(format!("no offset recorded for {kind:?}")))?;
        if new_bytes.len() != entry.width {
            return Err(ProtocolError::OffsetInvalidated(format!(
                "write of {} bytes does not match recorded width {} for {kind:?}",
                new_bytes.len(),
                entry.width
            )));
        }
        if entry.offset + entry.width > buf.len() {
            return Err(ProtocolError::BufferTooSmall {
                needed: entry.offset + entry.width,
                available: buf.len(),
            });
        }
        buf[entry.offset..entry.offset + entry.width].copy_from_slice(new_bytes);
        Ok(())
    }
}

impl Default for OffsetTable {
    fn default() -> Self {
        Self::new()
    }
}

fn scalar_fixed_width(scalar: &crate::variant::ScalarValue) -> Option<usize> {
    use crate::variant::ScalarValue;
    Some(match scalar {
        ScalarValue::Boolean(_) | ScalarValue::SByte(_) | ScalarValue::Byte(_) => 1,
        ScalarValue::Int16(_) | ScalarValue::UInt16(_) => 2,
        ScalarValue::Int32(_) | ScalarValue::UInt32(_) | ScalarValue::Float(_) => 4,
        ScalarValue::Int64(_) | ScalarValue::UInt64(_) | ScalarValue::Double(_) => 8,
        ScalarValue::DateTime(_) => 8,
        ScalarValue::StatusCode(_) => 4,
        _ => return None,
    })
}

impl BinaryEncode for crate::dataset_message::FieldValue {
    fn encode(&self, cursor: &mut crate::cursor::Cursor<'_>) -> Result<()> {
        match self {
            Self::Variant(v) => v.encode(cursor),
            Self::Raw(r) => cursor.put_bytes(&r.0),
            Self::DataValue(v) => v.encode(cursor),
        }
    }
}
