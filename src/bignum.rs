//! Arbitrary-base-10 big number representation: `sign * significand *
//! 10^exponent`.

use crate::error::{Error, Result};
use crate::varint::{uleb128_decode, uleb128_encode, zigzag_decode, zigzag_encode};

/// A decoded or to-be-encoded BONJSON big number.
///
/// The significand is capped at [`crate::limits::Limits::max_bignum_magnitude`]
/// bytes by both decoders (8 bytes in this implementation), so it always
/// fits in a `u64`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BigNumber {
    pub sign: i8,
    pub significand: u64,
    pub exponent: i64,
}

impl BigNumber {
    pub fn new(sign: i8, significand: u64, exponent: i64) -> Self {
        let sign = if significand == 0 { 0 } else { sign.signum() };
        BigNumber {
            sign,
            significand,
            exponent,
        }
    }

    pub fn zero() -> Self {
        BigNumber {
            sign: 0,
            significand: 0,
            exponent: 0,
        }
    }

    /// Number of bytes needed to hold the significand, normalized (no
    /// trailing zero byte).
    pub(crate) fn significand_len(&self) -> usize {
        if self.significand == 0 {
            0
        } else {
            8 - (self.significand.leading_zeros() as usize / 8)
        }
    }

    /// Encode as tag `0xB2` payload: zigzag-leb128 exponent, zigzag-leb128
    /// signed_length (magnitude byte count, negated for a negative sign),
    /// then the little-endian magnitude bytes.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        uleb128_encode(zigzag_encode(self.exponent), buf);
        let len = self.significand_len();
        if len == 0 {
            uleb128_encode(zigzag_encode(0), buf);
            return;
        }
        let signed_len = if self.sign < 0 { -(len as i64) } else { len as i64 };
        uleb128_encode(zigzag_encode(signed_len), buf);
        let bytes = self.significand.to_le_bytes();
        buf.extend_from_slice(&bytes[..len]);
    }

    /// Decode a big number's payload starting at `buf[offset]`, returning
    /// the value and the number of bytes consumed.
    pub fn decode(buf: &[u8], offset: usize, max_magnitude: usize) -> Result<(BigNumber, usize)> {
        let mut pos = offset;
        let (zz_exponent, n) = uleb128_decode(&buf[pos - offset..], pos)?;
        pos += n;
        let exponent = zigzag_decode(zz_exponent);

        let (zz_signed_len, n) = uleb128_decode(&buf[pos - offset..], pos)?;
        pos += n;
        let signed_len = zigzag_decode(zz_signed_len);
        let negative = signed_len < 0;
        let len = signed_len.unsigned_abs() as usize;

        if len == 0 {
            return Ok((BigNumber::zero(), pos - offset));
        }
        if len > max_magnitude {
            return Err(Error::ValueOutOfRange {
                byte_offset: offset,
                reason: "big number magnitude exceeds the configured limit",
            });
        }
        let mag_bytes = buf
            .get(pos - offset..pos - offset + len)
            .ok_or(Error::Incomplete { byte_offset: pos })?;
        pos += len;

        let mut raw = [0u8; 8];
        raw[..len].copy_from_slice(mag_bytes);
        let significand = u64::from_le_bytes(raw);

        Ok((
            BigNumber::new(if negative { -1 } else { 1 }, significand, exponent),
            pos - offset,
        ))
    }

    pub fn to_f64(self) -> f64 {
        (self.sign as f64) * (self.significand as f64) * 10f64.powi(self.exponent as i32)
    }
}
