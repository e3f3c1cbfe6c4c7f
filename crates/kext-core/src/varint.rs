//! Zigzag variable-length integers.
//!
//! A signed value `v` is first mapped to `(v << 1) ^ (v >> 63)` so that
//! small magnitudes of either sign stay small, then emitted as
//! little-endian base-128 groups. Every byte except the last has its high
//! bit set. The full `i64` range fits in at most [`MAX_VARINT_LEN`] bytes.

use bytes::BufMut;

use crate::error::DecodeError;

/// Maximum encoded length of a 64-bit varint.
pub const MAX_VARINT_LEN: usize = 10;

/// Map a signed value onto the unsigned zigzag domain.
#[inline]
pub fn zigzag(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

/// Inverse of [`zigzag`].
#[inline]
pub fn unzigzag(bits: u64) -> i64 {
    ((bits >> 1) as i64) ^ -((bits & 1) as i64)
}

/// Number of bytes [`encode_varint`] produces for `v`.
///
/// # Examples
///
/// ```
/// use kext_core::varint_len;
///
/// assert_eq!(varint_len(0), 1);
/// assert_eq!(varint_len(-1), 1);
/// assert_eq!(varint_len(64), 2);
/// assert_eq!(varint_len(i64::MAX), 10);
/// ```
#[inline]
pub fn varint_len(v: i64) -> usize {
    let bits = zigzag(v);
    let significant = (u64::BITS - bits.leading_zeros()) as usize;
    significant.div_ceil(7).max(1)
}

/// Encode `v` as a zigzag varint.
///
/// # Examples
///
/// ```
/// use kext_core::encode_varint;
///
/// assert_eq!(encode_varint(0), vec![0x00]);
/// assert_eq!(encode_varint(-1), vec![0x01]);
/// assert_eq!(encode_varint(64), vec![0x80, 0x01]);
/// ```
pub fn encode_varint(v: i64) -> Vec<u8> {
    let mut out = Vec::with_capacity(varint_len(v));
    encode_varint_into(v, &mut out);
    out
}

/// Append the zigzag varint encoding of `v` to `buf`.
pub fn encode_varint_into(v: i64, buf: &mut impl BufMut) {
    let mut bits = zigzag(v);
    while bits & !0x7F != 0 {
        buf.put_u8((bits & 0x7F) as u8 | 0x80);
        bits >>= 7;
    }
    buf.put_u8(bits as u8);
}

/// Decode a zigzag varint from the start of `buf`.
///
/// Returns the value and the number of bytes consumed. Input that ends
/// before the final group, or that runs past [`MAX_VARINT_LEN`] bytes,
/// is rejected.
pub fn decode_varint(buf: &[u8]) -> Result<(i64, usize), DecodeError> {
    let mut bits = 0u64;
    for (i, &byte) in buf.iter().enumerate() {
        if i == MAX_VARINT_LEN {
            return Err(DecodeError::VarintOverflow { offset: 0 });
        }
        bits |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            if i == MAX_VARINT_LEN - 1 && byte > 0x01 {
                return Err(DecodeError::VarintOverflow { offset: 0 });
            }
            return Ok((unzigzag(bits), i + 1));
        }
    }
    Err(DecodeError::Truncated {
        offset: buf.len(),
        needed: 1,
        remaining: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_is_single_zero_byte() {
        assert_eq!(encode_varint(0), vec![0x00]);
    }

    #[test]
    fn minus_one_is_single_byte() {
        assert_eq!(encode_varint(-1), vec![0x01]);
        assert_eq!(encode_varint(1), vec![0x02]);
    }

    #[test]
    fn two_byte_boundary_at_two_pow_six() {
        assert_eq!(encode_varint(63), vec![0x7E]);
        assert_eq!(encode_varint(-64), vec![0x7F]);
        assert_eq!(encode_varint(64), vec![0x80, 0x01]);
        assert_eq!(encode_varint(-65), vec![0x81, 0x01]);
        assert_eq!(encode_varint(300), vec![0xD8, 0x04]);
    }

    #[test]
    fn two_pow_62_is_ten_bytes() {
        let mut expected = vec![0x80; 9];
        expected.push(0x01);
        assert_eq!(encode_varint(1 << 62), expected);
    }

    #[test]
    fn max_is_ten_bytes_ending_in_one() {
        let enc = encode_varint(i64::MAX);
        assert_eq!(enc.len(), 10);
        assert_eq!(enc[9], 0x01);
    }

    #[test]
    fn min_is_ten_bytes() {
        let enc = encode_varint(i64::MIN);
        assert_eq!(enc.len(), 10);
        assert_eq!(enc[9], 0x01);
        assert_eq!(decode_varint(&enc).unwrap(), (i64::MIN, 10));
    }

    #[test]
    fn minus_two_pow_62_is_nine_bytes_ending_in_7f() {
        let enc = encode_varint(-(1 << 62));
        assert_eq!(enc.len(), 9);
        assert_eq!(enc[8], 0x7F);
    }

    #[test]
    fn truncated_input_rejected() {
        let result = decode_varint(&[0x80, 0x80]);
        assert!(matches!(result, Err(DecodeError::Truncated { .. })));
        assert!(decode_varint(&[]).is_err());
    }

    #[test]
    fn eleven_group_input_rejected() {
        let buf = [0xFFu8; 11];
        assert!(matches!(
            decode_varint(&buf),
            Err(DecodeError::VarintOverflow { .. })
        ));
    }

    #[test]
    fn tenth_byte_above_one_rejected() {
        let mut buf = vec![0x80u8; 9];
        buf.push(0x02);
        assert!(matches!(
            decode_varint(&buf),
            Err(DecodeError::VarintOverflow { .. })
        ));
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        let mut buf = encode_varint(150);
        let len = buf.len();
        buf.extend_from_slice(&[0xAA, 0xBB]);
        assert_eq!(decode_varint(&buf).unwrap(), (150, len));
    }

    proptest! {
        #[test]
        fn roundtrip(v in any::<i64>()) {
            let enc = encode_varint(v);
            prop_assert_eq!(decode_varint(&enc).unwrap(), (v, enc.len()));
        }

        #[test]
        fn len_matches_encoding(v in any::<i64>()) {
            let enc = encode_varint(v);
            prop_assert_eq!(enc.len(), varint_len(v));
            prop_assert!((1..=MAX_VARINT_LEN).contains(&enc.len()));
        }

        #[test]
        fn len_non_decreasing_in_zigzag_magnitude(a in any::<i64>(), b in any::<i64>()) {
            let (lo, hi) = if zigzag(a) <= zigzag(b) { (a, b) } else { (b, a) };
            prop_assert!(varint_len(lo) <= varint_len(hi));
        }

        #[test]
        fn continuation_bit_on_all_but_last(v in any::<i64>()) {
            let enc = encode_varint(v);
            let (last, init) = enc.split_last().unwrap();
            prop_assert!(init.iter().all(|b| b & 0x80 != 0));
            prop_assert_eq!(last & 0x80, 0);
        }
    }
}
