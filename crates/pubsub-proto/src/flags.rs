//! Flag-byte framing: packing and unpacking the chained flag bytes that
//! gate which optional NetworkMessage/DataSetMessage fields follow.
//!
//! Each mask byte gets a dedicated pack/unpack pair rather than ad-hoc bit
//! arithmetic sprinkled through the encoder.

use crate::error::{ProtocolError, Result};
use crate::types::PublisherIdKind;

/// The first wire byte: `[version:4 | pub_id_enabled:1 | grp_hdr_enabled:1
/// | payload_hdr_enabled:1 | ext1_enabled:1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UadpHeaderByte {
    /// Low nibble version, 0..=15.
    pub version: u8,
    /// Bit 4.
    pub publisher_id_enabled: bool,
    /// Bit 5.
    pub group_header_enabled: bool,
    /// Bit 6.
    pub payload_header_enabled: bool,
    /// Bit 7.
    pub extended_flags1_enabled: bool,
}

impl UadpHeaderByte {
    /// Pack into one byte.
    #[must_use]
    pub fn pack(self) -> u8 {
        let mut v = self.version & 0x0F;
        if self.publisher_id_enabled {
            v |= 0x10;
        }
        if self.group_header_enabled {
            v |= 0x20;
        }
        if self.payload_header_enabled {
            v |= 0x40;
        }
        if self.extended_flags1_enabled {
            v |= 0x80;
        }
        v
    }

    /// Unpack from one byte.
    #[must_use]
    pub fn unpack(byte: u8) -> Self {
        Self {
            version: byte & 0x0F,
            publisher_id_enabled: byte & 0x10 != 0,
            group_header_enabled: byte & 0x20 != 0,
            payload_header_enabled: byte & 0x40 != 0,
            extended_flags1_enabled: byte & 0x80 != 0,
        }
    }
}

/// `[pub_id_type:3 | dsclass_enabled:1 | sec_enabled:1 | ts_enabled:1 |
/// ps_enabled:1 | ext2_enabled:1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedFlags1 {
    /// Which union arm `PublisherId` uses on the wire.
    pub publisher_id_kind: PublisherIdKind,
    /// Bit 3.
    pub dataset_class_id_enabled: bool,
    /// Bit 4.
    pub security_enabled: bool,
    /// Bit 5.
    pub timestamp_enabled: bool,
    /// Bit 6.
    pub picoseconds_enabled: bool,
    /// Bit 7.
    pub extended_flags2_enabled: bool,
}

impl ExtendedFlags1 {
    /// Pack into one byte.
    #[must_use]
    pub fn pack(self) -> u8 {
        let mut v = self.publisher_id_kind.to_bits() & 0x07;
        if self.dataset_class_id_enabled {
            v |= 0x08;
        }
        if self.security_enabled {
            v |= 0x10;
        }
        if self.timestamp_enabled {
            v |= 0x20;
        }
        if self.picoseconds_enabled {
            v |= 0x40;
        }
        if self.extended_flags2_enabled {
            v |= 0x80;
        }
        v
    }

    /// Unpack from one byte.
    pub fn unpack(byte: u8) -> Result<Self> {
        Ok(Self {
            publisher_id_kind: PublisherIdKind::from_bits(byte & 0x07)?,
            dataset_class_id_enabled: byte & 0x08 != 0,
            security_enabled: byte & 0x10 != 0,
            timestamp_enabled: byte & 0x20 != 0,
            picoseconds_enabled: byte & 0x40 != 0,
            extended_flags2_enabled: byte & 0x80 != 0,
        })
    }
}

/// `[chunk:1 | promoted:1 | msg_type:3 | reserved:3]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedFlags2 {
    /// Bit 0.
    pub chunk_message: bool,
    /// Bit 1.
    pub promoted_fields_enabled: bool,
    /// Bits 2..=4.
    pub message_type: u8,
}

impl ExtendedFlags2 {
    /// Pack into one byte.
    #[must_use]
    pub fn pack(self) -> u8 {
        let mut v = (self.message_type & 0x07) << 2;
        if self.chunk_message {
            v |= 0x01;
        }
        if self.promoted_fields_enabled {
            v |= 0x02;
        }
        v
    }

    /// Unpack from one byte. Reserved bits (5..=7) are ignored on decode to
    /// tolerate future extension, matching the source's masking.
    #[must_use]
    pub fn unpack(byte: u8) -> Self {
        Self {
            chunk_message: byte & 0x01 != 0,
            promoted_fields_enabled: byte & 0x02 != 0,
            message_type: (byte >> 2) & 0x07,
        }
    }
}

/// `[wgid:1 | gver:1 | nm_num:1 | seq_num:1 | reserved:4]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupFlags {
    /// Bit 0.
    pub writer_group_id_enabled: bool,
    /// Bit 1.
    pub group_version_enabled: bool,
    /// Bit 2.
    pub network_message_number_enabled: bool,
    /// Bit 3.
    pub sequence_number_enabled: bool,
}

impl GroupFlags {
    /// Pack into one byte.
    #[must_use]
    pub fn pack(self) -> u8 {
        let mut v = 0u8;
        if self.writer_group_id_enabled {
            v |= 0x01;
        }
        if self.group_version_enabled {
            v |= 0x02;
        }
        if self.network_message_number_enabled {
            v |= 0x04;
        }
        if self.sequence_number_enabled {
            v |= 0x08;
        }
        v
    }

    /// Unpack from one byte.
    #[must_use]
    pub fn unpack(byte: u8) -> Self {
        Self {
            writer_group_id_enabled: byte & 0x01 != 0,
            group_version_enabled: byte & 0x02 != 0,
            network_message_number_enabled: byte & 0x04 != 0,
            sequence_number_enabled: byte & 0x08 != 0,
        }
    }
}

/// `[signed:1 | encrypted:1 | footer:1 | key_reset:1 | reserved:4]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SecurityFlags {
    /// Bit 0.
    pub signed: bool,
    /// Bit 1.
    pub encrypted: bool,
    /// Bit 2.
    pub footer_enabled: bool,
    /// Bit 3.
    pub force_key_reset: bool,
}

impl SecurityFlags {
    /// Pack into one byte.
    #[must_use]
    pub fn pack(self) -> u8 {
        let mut v = 0u8;
        if self.signed {
            v |= 0x01;
        }
        if self.encrypted {
            v |= 0x02;
        }
        if self.footer_enabled {
            v |= 0x04;
        }
        if self.force_key_reset {
            v |= 0x08;
        }
        v
    }

    /// Unpack from one byte.
    #[must_use]
    pub fn unpack(byte: u8) -> Self {
        Self {
            signed: byte & 0x01 != 0,
            encrypted: byte & 0x02 != 0,
            footer_enabled: byte & 0x04 != 0,
            force_key_reset: byte & 0x08 != 0,
        }
    }
}

/// `[valid:1 | field_enc:2 | seq_nr:1 | status:1 | cfg_major:1 |
/// cfg_minor:1 | flags2:1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSetFlags1 {
    /// Bit 0.
    pub valid: bool,
    /// Bits 1..=2.
    pub field_encoding: u8,
    /// Bit 3.
    pub sequence_number_enabled: bool,
    /// Bit 4.
    pub status_enabled: bool,
    /// Bit 5.
    pub config_major_version_enabled: bool,
    /// Bit 6.
    pub config_minor_version_enabled: bool,
    /// Bit 7.
    pub flags2_enabled: bool,
}

impl DataSetFlags1 {
    /// Pack into one byte.
    #[must_use]
    pub fn pack(self) -> u8 {
        let mut v = (self.field_encoding & 0x03) << 1;
        if self.valid {
            v |= 0x01;
        }
        if self.sequence_number_enabled {
            v |= 0x08;
        }
        if self.status_enabled {
            v |= 0x10;
        }
        if self.config_major_version_enabled {
            v |= 0x20;
        }
        if self.config_minor_version_enabled {
            v |= 0x40;
        }
        if self.flags2_enabled {
            v |= 0x80;
        }
        v
    }

    /// Unpack from one byte.
    #[must_use]
    pub fn unpack(byte: u8) -> Self {
        Self {
            valid: byte & 0x01 != 0,
            field_encoding: (byte >> 1) & 0x03,
            sequence_number_enabled: byte & 0x08 != 0,
            status_enabled: byte & 0x10 != 0,
            config_major_version_enabled: byte & 0x20 != 0,
            config_minor_version_enabled: byte & 0x40 != 0,
            flags2_enabled: byte & 0x80 != 0,
        }
    }
}

/// `[msg_type:4 | ts:1 | ps:1 | reserved:2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSetFlags2 {
    /// Bits 0..=3.
    pub message_type: u8,
    /// Bit 4.
    pub timestamp_enabled: bool,
    /// Bit 5.
    pub picoseconds_enabled: bool,
}

impl DataSetFlags2 {
    /// Pack into one byte.
    #[must_use]
    pub fn pack(self) -> u8 {
        let mut v = self.message_type & 0x0F;
        if self.timestamp_enabled {
            v |= 0x10;
        }
        if self.picoseconds_enabled {
            v |= 0x20;
        }
        v
    }

    /// Unpack from one byte.
    #[must_use]
    pub fn unpack(byte: u8) -> Self {
        Self {
            message_type: byte & 0x0F,
            timestamp_enabled: byte & 0x10 != 0,
            picoseconds_enabled: byte & 0x20 != 0,
        }
    }
}

/// Validate that a 3-bit field fits; used for construction helpers where a
/// caller passes raw numbers instead of the strongly typed flag structs.
pub fn require_bits(value: u8, bits: u8, what: &str) -> Result<()> {
    let max = (1u16 << bits) - 1;
    if u16::from(value) > max {
        return Err(ProtocolError::InvalidArgument(format!(
            "{what} does not fit in {bits} bits: {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uadp_header_byte_round_trips() {
        let h = UadpHeaderByte {
            version: 1,
            publisher_id_enabled: true,
            group_header_enabled: false,
            payload_header_enabled: true,
            extended_flags1_enabled: false,
        };
        assert_eq!(UadpHeaderByte::unpack(h.pack()), h);
    }

    #[test]
    fn dataset_flags1_packs_field_encoding_in_bits_1_2() {
        let f = DataSetFlags1 {
            valid: true,
            field_encoding: 0b10,
            sequence_number_enabled: false,
            status_enabled: false,
            config_major_version_enabled: false,
            config_minor_version_enabled: false,
            flags2_enabled: false,
        };
        let byte = f.pack();
        assert_eq!(byte & 0x01, 1);
        assert_eq!((byte >> 1) & 0x03, 0b10);
        assert_eq!(DataSetFlags1::unpack(byte), f);
    }
}
