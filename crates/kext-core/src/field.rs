//! Field types shared by every frame kind.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use crate::buffer::{FrameReader, FrameWriter, WireDecode, WireEncode};
use crate::error::{CodecError, DecodeError};

/// `latest_offset` used when the caller does not give one: track latest.
pub const LATEST_OFFSET_DEFAULT: i64 = i64::MAX;

/// `partition_offset` meaning "not set".
pub const OFFSET_UNSET: i64 = -1;

/// `partition_offset` meaning "start from the earliest retained record".
pub const OFFSET_HISTORICAL: i64 = -2;

// ── NullableBytes ───────────────────────────────────────────────

/// A byte value that may be absent.
///
/// Encoded as `nullable_bytes32`. A present zero-length value is distinct
/// from an absent one on the wire and after decoding.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NullableBytes(Option<Bytes>);

impl NullableBytes {
    /// The absent value.
    pub const fn null() -> Self {
        Self(None)
    }

    /// Copy an optional slice.
    pub fn from_slice(value: Option<&[u8]>) -> Self {
        Self(value.map(Bytes::copy_from_slice))
    }

    /// Whether the value is absent.
    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    /// Borrow the value, if present.
    pub fn as_deref(&self) -> Option<&[u8]> {
        self.0.as_deref()
    }

    /// Length prefix as written on the wire: `-1` when absent.
    pub fn wire_len(&self) -> i64 {
        self.0.as_ref().map_or(-1, |b| b.len() as i64)
    }

    /// Unwrap into the inner option.
    pub fn into_inner(self) -> Option<Bytes> {
        self.0
    }
}

impl From<Option<Bytes>> for NullableBytes {
    fn from(value: Option<Bytes>) -> Self {
        Self(value)
    }
}

impl From<Option<&[u8]>> for NullableBytes {
    fn from(value: Option<&[u8]>) -> Self {
        Self::from_slice(value)
    }
}

impl From<&[u8]> for NullableBytes {
    fn from(value: &[u8]) -> Self {
        Self::from_slice(Some(value))
    }
}

impl<const N: usize> From<&[u8; N]> for NullableBytes {
    fn from(value: &[u8; N]) -> Self {
        Self::from_slice(Some(value))
    }
}

impl From<&str> for NullableBytes {
    fn from(value: &str) -> Self {
        Self::from_slice(Some(value.as_bytes()))
    }
}

impl From<Option<&str>> for NullableBytes {
    fn from(value: Option<&str>) -> Self {
        Self::from_slice(value.map(str::as_bytes))
    }
}

impl From<Bytes> for NullableBytes {
    fn from(value: Bytes) -> Self {
        Self(Some(value))
    }
}

impl WireEncode for NullableBytes {
    fn encode(&self, w: &mut FrameWriter) -> Result<(), CodecError> {
        w.put_nullable_bytes32(self.as_deref())
    }
}

impl WireDecode for NullableBytes {
    fn decode(r: &mut FrameReader<'_>) -> Result<Self, DecodeError> {
        r.get_nullable_bytes32("nullable bytes").map(Self)
    }
}

// ── OffsetTriple ────────────────────────────────────────────────

/// Partition position: id, current offset and latest offset.
///
/// Encoded as 20 bytes: `i32` id, `i64` offset, `i64` latest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OffsetTriple {
    /// Partition id.
    pub partition_id: i32,
    /// Current offset within the partition.
    pub partition_offset: i64,
    /// Latest known offset; [`LATEST_OFFSET_DEFAULT`] tracks latest.
    pub latest_offset: i64,
}

impl OffsetTriple {
    /// Encoded size in bytes.
    pub const WIRE_SIZE: usize = 20;

    /// A position with the default latest offset.
    pub const fn new(partition_id: i32, partition_offset: i64) -> Self {
        Self::with_latest(partition_id, partition_offset, LATEST_OFFSET_DEFAULT)
    }

    /// A position with an explicit latest offset.
    pub const fn with_latest(partition_id: i32, partition_offset: i64, latest_offset: i64) -> Self {
        Self {
            partition_id,
            partition_offset,
            latest_offset,
        }
    }
}

impl Default for OffsetTriple {
    fn default() -> Self {
        Self::new(-1, OFFSET_UNSET)
    }
}

impl WireEncode for OffsetTriple {
    fn encode(&self, w: &mut FrameWriter) -> Result<(), CodecError> {
        w.put_i32(self.partition_id)?;
        w.put_i64(self.partition_offset)?;
        w.put_i64(self.latest_offset)
    }
}

impl WireDecode for OffsetTriple {
    fn decode(r: &mut FrameReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            partition_id: r.get_i32()?,
            partition_offset: r.get_i64()?,
            latest_offset: r.get_i64()?,
        })
    }
}

// ── Header ──────────────────────────────────────────────────────

/// A record header: non-null name, nullable value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Header {
    /// Header name (`bytes16`).
    pub name: Bytes,
    /// Header value (`nullable_bytes32`).
    pub value: NullableBytes,
}

impl Header {
    /// Build a header by copying `name`.
    pub fn new(name: impl AsRef<[u8]>, value: impl Into<NullableBytes>) -> Self {
        Self {
            name: Bytes::copy_from_slice(name.as_ref()),
            value: value.into(),
        }
    }
}

impl WireEncode for Header {
    fn encode(&self, w: &mut FrameWriter) -> Result<(), CodecError> {
        w.put_bytes16(&self.name)?;
        self.value.encode(w)
    }
}

impl WireDecode for Header {
    fn decode(r: &mut FrameReader<'_>) -> Result<Self, DecodeError> {
        let name = r.get_bytes16("header name")?;
        let value = r.get_nullable_bytes32("header value").map(NullableBytes)?;
        Ok(Self { name, value })
    }
}

// ── Enumerations ────────────────────────────────────────────────

/// Declare a `u8`-coded enumeration with uppercase wire names.
macro_rules! named_code_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $code:literal, $text:literal; )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $code, )+
        }

        impl $name {
            /// Wire discriminator.
            pub const fn code(self) -> u8 {
                self as u8
            }

            /// Look up a variant by wire discriminator.
            pub const fn from_code(code: u8) -> Option<Self> {
                match code {
                    $( $code => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// Uppercase name accepted by [`FromStr`].
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $text, )+
                }
            }
        }

        impl FromStr for $name {
            type Err = CodecError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok(Self::$variant), )+
                    _ => Err(CodecError::InvalidEnumName {
                        kind: $label,
                        name: s.to_owned(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl WireEncode for $name {
            fn encode(&self, w: &mut FrameWriter) -> Result<(), CodecError> {
                w.put_u8(self.code())
            }
        }

        impl WireDecode for $name {
            fn decode(r: &mut FrameReader<'_>) -> Result<Self, DecodeError> {
                let offset = r.offset();
                let tag = r.get_u8()?;
                Self::from_code(tag).ok_or(DecodeError::UnknownTag {
                    what: $label,
                    tag,
                    offset,
                })
            }
        }
    };
}

named_code_enum! {
    /// What a merged stream may do: produce, fetch, or both.
    Capabilities, "capabilities" {
        /// Produce only.
        ProduceOnly = 1, "PRODUCE_ONLY";
        /// Fetch only.
        FetchOnly = 2, "FETCH_ONLY";
        /// Produce and fetch.
        ProduceAndFetch = 3, "PRODUCE_AND_FETCH";
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::ProduceAndFetch
    }
}

named_code_enum! {
    /// Encoding of a record value relative to its ancestor.
    DeltaType, "delta type" {
        /// Full value, no delta.
        None = 0, "NONE";
        /// RFC 6902 JSON patch against the ancestor.
        JsonPatch = 1, "JSON_PATCH";
    }
}

impl Default for DeltaType {
    fn default() -> Self {
        Self::None
    }
}

// ── Delta ───────────────────────────────────────────────────────

/// Delta descriptor carried by data frames.
///
/// Encoded as 9 bytes: `u8` type then `i64` ancestor offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Delta {
    /// How the value relates to its ancestor.
    pub delta_type: DeltaType,
    /// Offset of the ancestor record; `-1` when there is none.
    pub ancestor_offset: i64,
}

impl Delta {
    /// Encoded size in bytes.
    pub const WIRE_SIZE: usize = 9;

    /// Create a delta descriptor.
    pub const fn new(delta_type: DeltaType, ancestor_offset: i64) -> Self {
        Self {
            delta_type,
            ancestor_offset,
        }
    }
}

impl Default for Delta {
    fn default() -> Self {
        Self::new(DeltaType::None, -1)
    }
}

impl WireEncode for Delta {
    fn encode(&self, w: &mut FrameWriter) -> Result<(), CodecError> {
        self.delta_type.encode(w)?;
        w.put_i64(self.ancestor_offset)
    }
}

impl WireDecode for Delta {
    fn decode(r: &mut FrameReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            delta_type: DeltaType::decode(r)?,
            ancestor_offset: r.get_i64()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::encode_to_bytes;

    #[test]
    fn capabilities_parse_by_name() {
        assert_eq!("FETCH_ONLY".parse(), Ok(Capabilities::FetchOnly));
        assert_eq!("PRODUCE_ONLY".parse(), Ok(Capabilities::ProduceOnly));
        assert_eq!(
            "PRODUCE_AND_FETCH".parse(),
            Ok(Capabilities::ProduceAndFetch)
        );
        assert_eq!(
            "fetch_only".parse::<Capabilities>(),
            Err(CodecError::InvalidEnumName {
                kind: "capabilities",
                name: "fetch_only".into()
            })
        );
    }

    #[test]
    fn delta_type_codes() {
        assert_eq!(DeltaType::from_code(1), Some(DeltaType::JsonPatch));
        assert_eq!(DeltaType::from_code(2), None);
        assert_eq!(DeltaType::JsonPatch.to_string(), "JSON_PATCH");
    }

    #[test]
    fn unknown_enum_code_is_decode_error() {
        let mut r = FrameReader::new(&[7]);
        assert_eq!(
            Capabilities::decode(&mut r).unwrap_err(),
            DecodeError::UnknownTag {
                what: "capabilities",
                tag: 7,
                offset: 0
            }
        );
    }

    #[test]
    fn offset_triple_is_twenty_bytes() {
        let t = OffsetTriple::new(0, 10);
        assert_eq!(t.latest_offset, LATEST_OFFSET_DEFAULT);
        let bytes = encode_to_bytes(&t).unwrap();
        assert_eq!(bytes.len(), OffsetTriple::WIRE_SIZE);
        let back = OffsetTriple::decode(&mut FrameReader::new(&bytes)).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn offset_triple_default() {
        let t = OffsetTriple::default();
        assert_eq!(t.partition_id, -1);
        assert_eq!(t.partition_offset, OFFSET_UNSET);
        assert_eq!(t.latest_offset, LATEST_OFFSET_DEFAULT);
    }

    #[test]
    fn delta_default_and_size() {
        let d = Delta::default();
        assert_eq!(d.delta_type, DeltaType::None);
        assert_eq!(d.ancestor_offset, -1);
        assert_eq!(encode_to_bytes(&d).unwrap().len(), Delta::WIRE_SIZE);
    }

    #[test]
    fn nullable_bytes_null_vs_empty() {
        let null = NullableBytes::null();
        let empty = NullableBytes::from(&b""[..]);
        assert_ne!(null, empty);
        assert_eq!(null.wire_len(), -1);
        assert_eq!(empty.wire_len(), 0);
        assert_eq!(&encode_to_bytes(&null).unwrap()[..], &[0xFF; 4]);
        assert_eq!(&encode_to_bytes(&empty).unwrap()[..], &[0; 4]);
    }

    #[test]
    fn header_with_null_value() {
        let h = Header::new(b"h", NullableBytes::null());
        let bytes = encode_to_bytes(&h).unwrap();
        assert_eq!(&bytes[..], &[1, 0, b'h', 0xFF, 0xFF, 0xFF, 0xFF]);
        let back = Header::decode(&mut FrameReader::new(&bytes)).unwrap();
        assert_eq!(back, h);
        assert!(back.value.is_null());
    }
}
