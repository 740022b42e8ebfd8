//! Built-in scalar codecs: integers and IEEE 754 floats, little-endian on
//! the wire.

use crate::codec::{BinaryDecode, BinaryEncode};
use crate::cursor::{Cursor, Reader};
use crate::error::Result;

macro_rules! impl_int_codec {
    ($ty:ty, $size:expr) => {
        impl BinaryEncode for $ty {
            fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
                cursor.put_bytes(&self.to_le_bytes())
            }

            fn calc_size(&self) -> usize {
                $size
            }
        }

        impl BinaryDecode for $ty {
            fn decode(reader: &mut Reader<'_>) -> Result<Self> {
                Ok(Self::from_le_bytes(reader.take_array::<$size>()?))
            }
        }
    };
}

impl_int_codec!(u8, 1);
impl_int_codec!(u16, 2);
impl_int_codec!(u32, 4);
impl_int_codec!(u64, 8);
impl_int_codec!(i8, 1);
impl_int_codec!(i16, 2);
impl_int_codec!(i32, 4);
impl_int_codec!(i64, 8);

impl BinaryEncode for bool {
    fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        u8::from(*self).encode(cursor)
    }

    fn calc_size(&self) -> usize {
        1
    }
}

impl BinaryDecode for bool {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(u8::decode(reader)? != 0)
    }
}

/// IEEE 754 binary32. Special values (±∞, NaN) round-trip bit-exactly.
impl BinaryEncode for f32 {
    fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        cursor.put_bytes(&self.to_le_bytes())
    }

    fn calc_size(&self) -> usize {
        4
    }
}

impl BinaryDecode for f32 {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self::from_le_bytes(reader.take_array::<4>()?))
    }
}

/// IEEE 754 binary64. Special values (±∞, NaN) round-trip bit-exactly.
impl BinaryEncode for f64 {
    fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()> {
        cursor.put_bytes(&self.to_le_bytes())
    }

    fn calc_size(&self) -> usize {
        8
    }
}

impl BinaryDecode for f64 {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self::from_le_bytes(reader.take_array::<8>()?))
    }
}

/// JSON float formatting for special values: `Infinity`, `-Infinity`, and
/// `NaN` map to those literal strings since JSON has no native
/// representation for them.
pub fn json_float_token(value: f64) -> serde_json::Value {
    if value.is_nan() {
        serde_json::Value::String("NaN".to_string())
    } else if value.is_infinite() {
        serde_json::Value::String(if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string())
    } else {
        serde_json::Number::from_f64(value)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(value.to_string()))
    }
}

/// Inverse of [`json_float_token`].
pub fn json_float_from_token(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => match s.as_str() {
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            "NaN" => Some(f64::NAN),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<T>(value: T)
    where
        T: BinaryEncode + BinaryDecode + PartialEq + std::fmt::Debug + Copy,
    {
        let mut buf = vec![0u8; value.calc_size()];
        let mut w = Cursor::writer(&mut buf);
        value.encode(&mut w).unwrap();
        let mut r = Reader::new(&buf);
        assert_eq!(T::decode(&mut r).unwrap(), value);
    }

    #[test]
    fn integers_round_trip() {
        round_trip(0u8);
        round_trip(255u8);
        round_trip(0x1234u16);
        round_trip(0x1B_u32);
        round_trip(152_478_978_534_i64);
        round_trip(-1i32);
    }

    #[test]
    fn special_floats_round_trip_bit_exact() {
        for value in [f32::INFINITY, f32::NEG_INFINITY, f32::NAN, 0.0, -0.0] {
            let mut buf = vec![0u8; 4];
            let mut w = Cursor::writer(&mut buf);
            value.encode(&mut w).unwrap();
            let mut r = Reader::new(&buf);
            let decoded = f32::decode(&mut r).unwrap();
            assert_eq!(value.to_bits(), decoded.to_bits());
        }
    }

    #[test]
    fn json_float_tokens_round_trip() {
        assert_eq!(json_float_from_token(&json_float_token(f64::NAN)).unwrap().is_nan(), true);
        assert_eq!(json_float_from_token(&json_float_token(f64::INFINITY)), Some(f64::INFINITY));
        assert_eq!(json_float_token(1.5), serde_json::json!(1.5));
    }
}
