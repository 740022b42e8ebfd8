//! `DataValue`: a `Variant` plus optional quality and timestamp metadata,
//! used by `DataSetMessage` fields when `field_encoding == DATAVALUE`.

use crate::codec::{BinaryDecode, BinaryEncode};
use crate::cursor::{Cursor, Reader};
use crate::error::Result;
use crate::types::{StatusCode, UaDateTime};
use crate::variant::Variant;

const HAS_VALUE: u8 = 0x01;
const HAS_STATUS: u8 = 0x02;
const HAS_SOURCE_TIMESTAMP: u8 = 0x04;
const HAS_SERVER_TIMESTAMP: u8 = 0x08;
const HAS_SOURCE_PICOSECONDS: u8 = 0x10;
const HAS_SERVER_PICOSECONDS: u8 = 0x20;

/// A value plus optional quality/timestamp metadata, gated field-by-field
/// by a leading encoding mask byte.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataValue {
    /// The value itself, if present.
    pub value: Option<Variant>,
    /// Quality code, if present.
    pub status: Option<StatusCode>,
    /// When the value was read at the source, if present.
    pub source_timestamp: Option<UaDateTime>,
    /// Sub-100ns precision for `source_timestamp`, if present.
    pub source_picoseconds: Option<u16>,
    /// When the server received/produced the value, if present.
    pub server_timestamp: Option<UaDateTime>,
    /// Sub-100ns precision for `server_timestamp`, if present.
    pub server_picoseconds: Option<u16>,
}

impl BinaryEncode for DataValue {
    fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        let mut mask = 0u8;
        if self.value.is_some() {
            mask |= HAS_VALUE;
        }
        if self.status.is_some() {
            mask |= HAS_STATUS;
        }
        if self.source_timestamp.is_some() {
            mask |= HAS_SOURCE_TIMESTAMP;
        }
        if self.server_timestamp.is_some() {
            mask |= HAS_SERVER_TIMESTAMP;
        }
        if self.source_picoseconds.is_some() {
            mask |= HAS_SOURCE_PICOSECONDS;
        }
        if self.server_picoseconds.is_some() {
            mask |= HAS_SERVER_PICOSECONDS;
        }
        mask.encode(cursor)?;
        if let Some(v) = &self.value {
            v.encode(cursor)?;
        }
        if let Some(v) = &self.status {
            v.encode(cursor)?;
        }
        if let Some(v) = &self.source_timestamp {
            v.encode(cursor)?;
        }
        if let Some(v) = &self.source_picoseconds {
            v.encode(cursor)?;
        }
        if let Some(v) = &self.server_timestamp {
            v.encode(cursor)?;
        }
        if let Some(v) = &self.server_picoseconds {
            v.encode(cursor)?;
        }
        Ok(())
    }
}

impl BinaryDecode for DataValue {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let mask = u8::decode(reader)?;
        let value = if mask & HAS_VALUE != 0 { Some(Variant::decode(reader)?) } else { None };
        let status = if mask & HAS_STATUS != 0 { Some(StatusCode::decode(reader)?) } else { None };
        let source_timestamp =
            if mask & HAS_SOURCE_TIMESTAMP != 0 { Some(UaDateTime::decode(reader)?) } else { None };
        let source_picoseconds =
            if mask & HAS_SOURCE_PICOSECONDS != 0 { Some(u16::decode(reader)?) } else { None };
        let server_timestamp =
            if mask & HAS_SERVER_TIMESTAMP != 0 { Some(UaDateTime::decode(reader)?) } else { None };
        let server_picoseconds =
            if mask & HAS_SERVER_PICOSECONDS != 0 { Some(u16::decode(reader)?) } else { None };
        Ok(Self {
            value,
            status,
            source_timestamp,
            source_picoseconds,
            server_timestamp,
            server_picoseconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::ScalarValue;

    #[test]
    fn empty_data_value_round_trips() {
        let dv = DataValue::default();
        let mut buf = vec![0u8; dv.calc_size()];
        let mut w = Cursor::writer(&mut buf);
        dv.encode(&mut w).unwrap();
        assert_eq!(buf, vec![0u8]);
        let mut r = Reader::new(&buf);
        assert_eq!(DataValue::decode(&mut r).unwrap(), dv);
    }

    #[test]
    fn full_data_value_round_trips() {
        let dv = DataValue {
            value: Some(Variant::Scalar(ScalarValue::UInt32(7))),
            status: Some(StatusCode::GOOD),
            source_timestamp: Some(UaDateTime::from_ticks(1000)),
            source_picoseconds: Some(5),
            server_timestamp: Some(UaDateTime::from_ticks(2000)),
            server_picoseconds: Some(9),
        };
        let mut buf = vec![0u8; dv.calc_size()];
        let mut w = Cursor::writer(&mut buf);
        dv.encode(&mut w).unwrap();
        let mut r = Reader::new(&buf);
        assert_eq!(DataValue::decode(&mut r).unwrap(), dv);
    }
}
