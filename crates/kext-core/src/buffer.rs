//! Flyweight frame buffers.
//!
//! [`FrameWriter`] is a fixed-capacity scratch region that frames are
//! encoded into. Writes append at a cursor and fail with
//! [`CodecError::ScratchOverflow`] instead of growing past the configured
//! capacity. [`FrameReader`] is the matching bounds-checked cursor over a
//! borrowed byte slice.
//!
//! Both sides speak the same variable-length encodings:
//!
//! | Encoding          | Prefix | Null  |
//! |-------------------|--------|-------|
//! | `string16`        | `i16`  | `-1`  |
//! | `bytes16`         | `i16`  | never |
//! | `nullable_bytes32`| `i32`  | `-1`  |
//! | `array32`         | `i32` byte length + `i32` count | never |

use bytes::{BufMut, Bytes, BytesMut};

use crate::config::CodecConfig;
use crate::error::{CodecError, DecodeError};
use crate::varint::{decode_varint, encode_varint_into, varint_len};

/// A value with a fixed wire encoding.
pub trait WireEncode {
    /// Append this value's encoding to `w`.
    fn encode(&self, w: &mut FrameWriter) -> Result<(), CodecError>;
}

/// A value that can be read back from its wire encoding.
pub trait WireDecode: Sized {
    /// Read one value at the reader's cursor.
    fn decode(r: &mut FrameReader<'_>) -> Result<Self, DecodeError>;
}

/// Encode a single value into a fresh, unbounded buffer.
///
/// Used to freeze sub-structures for byte-wise comparison, where the
/// scratch limit of a frame builder does not apply.
pub fn encode_to_bytes<T: WireEncode + ?Sized>(value: &T) -> Result<Bytes, CodecError> {
    let mut w = FrameWriter::unbounded();
    value.encode(&mut w)?;
    Ok(w.finish())
}

/// Slices encode as `array32`.
impl<T: WireEncode> WireEncode for [T] {
    fn encode(&self, w: &mut FrameWriter) -> Result<(), CodecError> {
        w.put_array32(self)
    }
}

impl<T: WireEncode> WireEncode for Vec<T> {
    fn encode(&self, w: &mut FrameWriter) -> Result<(), CodecError> {
        w.put_array32(self)
    }
}

// ── Writer ──────────────────────────────────────────────────────

/// Append-only scratch buffer with a hard capacity.
///
/// # Examples
///
/// ```
/// use kext_core::{CodecConfig, FrameWriter};
///
/// let mut w = FrameWriter::new(&CodecConfig::default()).unwrap();
/// w.put_i32(7).unwrap();
/// w.put_u8(1).unwrap();
/// assert_eq!(w.limit(), 5);
/// assert_eq!(&w.finish()[..], &[7, 0, 0, 0, 1]);
/// ```
#[derive(Debug)]
pub struct FrameWriter {
    buf: BytesMut,
    capacity: usize,
}

impl FrameWriter {
    /// Create a writer sized by `config`.
    ///
    /// Returns `CodecError::Config` if the configuration is invalid.
    pub fn new(config: &CodecConfig) -> Result<Self, CodecError> {
        config.validate()?;
        Ok(Self::with_capacity(config.scratch_capacity))
    }

    /// Create a writer with an explicit capacity, skipping validation.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Create a writer that never reports overflow.
    pub fn unbounded() -> Self {
        Self {
            buf: BytesMut::new(),
            capacity: usize::MAX,
        }
    }

    /// Bytes written so far.
    pub fn limit(&self) -> usize {
        self.buf.len()
    }

    /// Maximum number of bytes this writer accepts.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Copy exactly [`limit`](Self::limit) bytes out as an immutable frame.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }

    fn ensure(&self, n: usize) -> Result<(), CodecError> {
        let required = self.buf.len().saturating_add(n);
        if required > self.capacity {
            return Err(CodecError::ScratchOverflow {
                capacity: self.capacity,
                required,
            });
        }
        Ok(())
    }

    /// Write a single byte.
    pub fn put_u8(&mut self, v: u8) -> Result<(), CodecError> {
        self.ensure(1)?;
        self.buf.put_u8(v);
        Ok(())
    }

    /// Write a little-endian i16.
    pub fn put_i16(&mut self, v: i16) -> Result<(), CodecError> {
        self.ensure(2)?;
        self.buf.put_i16_le(v);
        Ok(())
    }

    /// Write a little-endian i32.
    pub fn put_i32(&mut self, v: i32) -> Result<(), CodecError> {
        self.ensure(4)?;
        self.buf.put_i32_le(v);
        Ok(())
    }

    /// Write a little-endian i64.
    pub fn put_i64(&mut self, v: i64) -> Result<(), CodecError> {
        self.ensure(8)?;
        self.buf.put_i64_le(v);
        Ok(())
    }

    /// Write raw bytes with no length prefix.
    pub fn put_bytes(&mut self, b: &[u8]) -> Result<(), CodecError> {
        self.ensure(b.len())?;
        self.buf.put_slice(b);
        Ok(())
    }

    /// Write a zigzag varint.
    pub fn put_varint(&mut self, v: i64) -> Result<(), CodecError> {
        self.ensure(varint_len(v))?;
        encode_varint_into(v, &mut self.buf);
        Ok(())
    }

    /// Write a `string16`: i16 length then UTF-8 bytes, `-1` for `None`.
    pub fn put_string16(&mut self, s: Option<&str>) -> Result<(), CodecError> {
        match s {
            None => self.put_i16(-1),
            Some(s) => {
                let len = len16("string16", s.len())?;
                self.put_i16(len)?;
                self.put_bytes(s.as_bytes())
            }
        }
    }

    /// Write a `bytes16`: i16 length then bytes. Never null.
    pub fn put_bytes16(&mut self, b: &[u8]) -> Result<(), CodecError> {
        let len = len16("bytes16", b.len())?;
        self.put_i16(len)?;
        self.put_bytes(b)
    }

    /// Write a `nullable_bytes32`: i32 length then bytes, `-1` for `None`.
    pub fn put_nullable_bytes32(&mut self, b: Option<&[u8]>) -> Result<(), CodecError> {
        match b {
            None => self.put_i32(-1),
            Some(b) => {
                let len = len32("nullable_bytes32", b.len())?;
                self.put_i32(len)?;
                self.put_bytes(b)
            }
        }
    }

    /// Reserve four bytes for an i32 written later with [`patch_i32`](Self::patch_i32).
    ///
    /// Returns the offset of the reserved slot.
    pub fn reserve_i32(&mut self) -> Result<usize, CodecError> {
        let at = self.limit();
        self.put_i32(0)?;
        Ok(at)
    }

    /// Overwrite a slot previously returned by [`reserve_i32`](Self::reserve_i32).
    ///
    /// # Panics
    ///
    /// Panics if `at + 4` exceeds [`limit`](Self::limit).
    pub fn patch_i32(&mut self, at: usize, v: i32) {
        self.buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }

    /// Write an `array32` of `items`, encoding each with `f`.
    ///
    /// The byte length of the item region is patched in once the items
    /// are written.
    pub fn put_array32_with<T>(
        &mut self,
        items: &[T],
        mut f: impl FnMut(&mut Self, &T) -> Result<(), CodecError>,
    ) -> Result<(), CodecError> {
        let count = len32("array32 count", items.len())?;
        let length_at = self.reserve_i32()?;
        self.put_i32(count)?;
        let start = self.limit();
        for item in items {
            f(self, item)?;
        }
        let byte_len = len32("array32", self.limit() - start)?;
        self.patch_i32(length_at, byte_len);
        Ok(())
    }

    /// Write an `array32` of values with a [`WireEncode`] encoding.
    pub fn put_array32<T: WireEncode>(&mut self, items: &[T]) -> Result<(), CodecError> {
        self.put_array32_with(items, |w, item| item.encode(w))
    }
}

fn len16(field: &'static str, len: usize) -> Result<i16, CodecError> {
    i16::try_from(len).map_err(|_| CodecError::LengthOverflow { field, len })
}

fn len32(field: &'static str, len: usize) -> Result<i32, CodecError> {
    i32::try_from(len).map_err(|_| CodecError::LengthOverflow { field, len })
}

// ── Reader ──────────────────────────────────────────────────────

/// Bounds-checked cursor over an encoded frame.
///
/// Every read either returns a value and advances, or returns a
/// [`DecodeError`] carrying the absolute offset of the failure.
#[derive(Clone, Debug)]
pub struct FrameReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> FrameReader<'a> {
    /// Create a reader positioned at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    /// Current read position.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// End of the readable region.
    pub fn limit(&self) -> usize {
        self.buf.len()
    }

    /// Bytes left between the cursor and the limit.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Whether the cursor has reached the limit.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::Truncated {
                offset: self.offset,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.buf[self.offset..self.offset + n];
        self.offset += n;
        Ok(out)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read a single byte.
    pub fn get_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take_array::<1>()?[0])
    }

    /// Read a little-endian i16.
    pub fn get_i16(&mut self) -> Result<i16, DecodeError> {
        self.take_array().map(i16::from_le_bytes)
    }

    /// Read a little-endian i32.
    pub fn get_i32(&mut self) -> Result<i32, DecodeError> {
        self.take_array().map(i32::from_le_bytes)
    }

    /// Read a little-endian i64.
    pub fn get_i64(&mut self) -> Result<i64, DecodeError> {
        self.take_array().map(i64::from_le_bytes)
    }

    /// Read `n` raw bytes.
    pub fn get_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        self.take(n)
    }

    /// Read a zigzag varint.
    pub fn get_varint(&mut self) -> Result<i64, DecodeError> {
        let (v, len) =
            decode_varint(&self.buf[self.offset..]).map_err(|e| e.offset_by(self.offset))?;
        self.offset += len;
        Ok(v)
    }

    /// Read a `string16`; `None` when the length is `-1`.
    pub fn get_string16(&mut self, field: &'static str) -> Result<Option<String>, DecodeError> {
        let at = self.offset;
        let len = self.get_i16()?;
        if len == -1 {
            return Ok(None);
        }
        let len = non_negative(field, i64::from(len), at)?;
        let payload_at = self.offset;
        let raw = self.take(len)?;
        std::str::from_utf8(raw)
            .map(|s| Some(s.to_owned()))
            .map_err(|_| DecodeError::InvalidUtf8 {
                field,
                offset: payload_at,
            })
    }

    /// Read a `string16` that must not be null.
    pub fn get_string16_non_null(&mut self, field: &'static str) -> Result<String, DecodeError> {
        let at = self.offset;
        self.get_string16(field)?
            .ok_or(DecodeError::InvalidLength { field, len: -1, offset: at })
    }

    /// Read a `bytes16`. A `-1` length is rejected.
    pub fn get_bytes16(&mut self, field: &'static str) -> Result<Bytes, DecodeError> {
        let at = self.offset;
        let len = self.get_i16()?;
        let len = non_negative(field, i64::from(len), at)?;
        Ok(Bytes::copy_from_slice(self.take(len)?))
    }

    /// Read a `nullable_bytes32`; `None` when the length is `-1`.
    pub fn get_nullable_bytes32(
        &mut self,
        field: &'static str,
    ) -> Result<Option<Bytes>, DecodeError> {
        let at = self.offset;
        let len = self.get_i32()?;
        if len == -1 {
            return Ok(None);
        }
        let len = non_negative(field, i64::from(len), at)?;
        Ok(Some(Bytes::copy_from_slice(self.take(len)?)))
    }

    /// Read an `array32`, decoding each item with `f`.
    ///
    /// The declared byte length must equal the bytes the items consume.
    pub fn get_array32_with<T>(
        &mut self,
        field: &'static str,
        mut f: impl FnMut(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<Vec<T>, DecodeError> {
        let at = self.offset;
        let byte_len = self.get_i32()?;
        let declared = non_negative(field, i64::from(byte_len), at)?;
        let count_at = self.offset;
        let count = self.get_i32()?;
        let count = non_negative(field, i64::from(count), count_at)?;
        if declared > self.remaining() {
            return Err(DecodeError::Truncated {
                offset: self.offset,
                needed: declared,
                remaining: self.remaining(),
            });
        }
        let start = self.offset;
        let mut items = Vec::with_capacity(count.min(declared));
        for _ in 0..count {
            items.push(f(self)?);
        }
        let actual = self.offset - start;
        if actual != declared {
            return Err(DecodeError::ArrayLengthMismatch {
                field,
                declared,
                actual,
            });
        }
        Ok(items)
    }

    /// Read an `array32` of values with a [`WireDecode`] encoding.
    pub fn get_array32<T: WireDecode>(
        &mut self,
        field: &'static str,
    ) -> Result<Vec<T>, DecodeError> {
        self.get_array32_with(field, T::decode)
    }
}

fn non_negative(field: &'static str, len: i64, offset: usize) -> Result<usize, DecodeError> {
    usize::try_from(len).map_err(|_| DecodeError::InvalidLength { field, len, offset })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer() -> FrameWriter {
        FrameWriter::new(&CodecConfig::default()).unwrap()
    }

    #[test]
    fn primitives_are_little_endian() {
        let mut w = writer();
        w.put_i16(0x0102).unwrap();
        w.put_i32(0x0304_0506).unwrap();
        w.put_i64(-2).unwrap();
        let bytes = w.finish();
        assert_eq!(&bytes[..2], &[0x02, 0x01]);
        assert_eq!(&bytes[2..6], &[0x06, 0x05, 0x04, 0x03]);
        assert_eq!(&bytes[6..], &[0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);

        let mut r = FrameReader::new(&bytes);
        assert_eq!(r.get_i16().unwrap(), 0x0102);
        assert_eq!(r.get_i32().unwrap(), 0x0304_0506);
        assert_eq!(r.get_i64().unwrap(), -2);
        assert!(r.is_empty());
    }

    #[test]
    fn overflow_reports_required_bytes() {
        let mut w = FrameWriter::with_capacity(6);
        w.put_i32(1).unwrap();
        let err = w.put_i32(2).unwrap_err();
        assert_eq!(
            err,
            CodecError::ScratchOverflow {
                capacity: 6,
                required: 8
            }
        );
        // Failed write leaves the cursor untouched.
        assert_eq!(w.limit(), 4);
    }

    #[test]
    fn invalid_config_rejected() {
        let err = FrameWriter::new(&CodecConfig::with_scratch_capacity(1)).unwrap_err();
        assert!(matches!(err, CodecError::Config(_)));
    }

    #[test]
    fn string16_null_and_empty_are_distinct() {
        let mut w = writer();
        w.put_string16(None).unwrap();
        w.put_string16(Some("")).unwrap();
        w.put_string16(Some("topic")).unwrap();
        let bytes = w.finish();
        assert_eq!(&bytes[..4], &[0xFF, 0xFF, 0x00, 0x00]);

        let mut r = FrameReader::new(&bytes);
        assert_eq!(r.get_string16("s").unwrap(), None);
        assert_eq!(r.get_string16("s").unwrap(), Some(String::new()));
        assert_eq!(r.get_string16("s").unwrap(), Some("topic".to_owned()));
    }

    #[test]
    fn bytes16_rejects_null_length() {
        let mut r = FrameReader::new(&[0xFF, 0xFF]);
        assert_eq!(
            r.get_bytes16("name").unwrap_err(),
            DecodeError::InvalidLength {
                field: "name",
                len: -1,
                offset: 0
            }
        );
    }

    #[test]
    fn nullable32_rejects_lengths_below_minus_one() {
        let bytes = (-2i32).to_le_bytes();
        let mut r = FrameReader::new(&bytes);
        assert!(matches!(
            r.get_nullable_bytes32("key"),
            Err(DecodeError::InvalidLength { len: -2, .. })
        ));
    }

    #[test]
    fn nullable32_zero_length_is_present() {
        let mut w = writer();
        w.put_nullable_bytes32(Some(b"")).unwrap();
        w.put_nullable_bytes32(None).unwrap();
        let bytes = w.finish();
        let mut r = FrameReader::new(&bytes);
        assert_eq!(r.get_nullable_bytes32("v").unwrap(), Some(Bytes::new()));
        assert_eq!(r.get_nullable_bytes32("v").unwrap(), None);
    }

    #[test]
    fn invalid_utf8_reports_payload_offset() {
        let mut r = FrameReader::new(&[0x02, 0x00, 0xC3, 0x28]);
        assert_eq!(
            r.get_string16("topic").unwrap_err(),
            DecodeError::InvalidUtf8 {
                field: "topic",
                offset: 2
            }
        );
    }

    #[test]
    fn truncated_read_reports_offset() {
        let mut r = FrameReader::new(&[1, 2, 3]);
        r.get_u8().unwrap();
        assert_eq!(
            r.get_i32().unwrap_err(),
            DecodeError::Truncated {
                offset: 1,
                needed: 4,
                remaining: 2
            }
        );
    }

    #[test]
    fn array32_patches_byte_length() {
        let mut w = writer();
        w.put_array32_with(&[1i32, 2, 3], |w, v| w.put_i32(*v)).unwrap();
        let bytes = w.finish();
        assert_eq!(&bytes[..4], &12i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &3i32.to_le_bytes());

        let mut r = FrameReader::new(&bytes);
        let items = r.get_array32_with("ints", |r| r.get_i32()).unwrap();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn array32_empty() {
        let mut w = writer();
        w.put_array32_with::<i32>(&[], |w, v| w.put_i32(*v)).unwrap();
        assert_eq!(&w.finish()[..], &[0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn array32_length_mismatch_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2i32.to_le_bytes());
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&7i32.to_le_bytes());
        let mut r = FrameReader::new(&bytes);
        assert_eq!(
            r.get_array32_with("ints", |r| r.get_i32()).unwrap_err(),
            DecodeError::ArrayLengthMismatch {
                field: "ints",
                declared: 2,
                actual: 4
            }
        );
    }

    #[test]
    fn varint_offsets_are_absolute() {
        let mut r = FrameReader::new(&[0x00, 0x80, 0x80]);
        assert_eq!(r.get_varint().unwrap(), 0);
        assert_eq!(
            r.get_varint().unwrap_err(),
            DecodeError::Truncated {
                offset: 3,
                needed: 1,
                remaining: 0
            }
        );
    }

    #[test]
    fn patch_overwrites_reserved_slot() {
        let mut w = writer();
        let at = w.reserve_i32().unwrap();
        w.put_u8(9).unwrap();
        w.patch_i32(at, -1);
        assert_eq!(&w.finish()[..], &[0xFF, 0xFF, 0xFF, 0xFF, 9]);
    }
}
