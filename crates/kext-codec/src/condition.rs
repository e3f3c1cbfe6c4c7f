//! Filter conditions and their wire encoding.
//!
//! A [`Filter`] is an ordered list of [`Condition`]s that must all hold.
//! Several filters on one frame are alternatives.
//!
//! # Wire format
//!
//! ```text
//! condition  := tag:u8 payload
//!   0 Key     := nullable_bytes32
//!   1 Header  := bytes16 name, nullable_bytes32 value
//!   2 Not     := tag:u8 (0 | 1) payload
//!   3 Headers := bytes16 name, array32<value_match>
//! value_match := tag:u8 payload
//!   0 Value   := nullable_bytes32
//!   1 Skip    := u8 (0 = one, 1 = many)
//! filter     := array32<condition>
//! ```

use bytes::Bytes;
use smallvec::SmallVec;

use kext_core::{
    CodecError, DecodeError, FrameReader, FrameWriter, Header, NullableBytes, WireDecode,
    WireEncode,
};

const CONDITION_KEY: u8 = 0;
const CONDITION_HEADER: u8 = 1;
const CONDITION_NOT: u8 = 2;
const CONDITION_HEADERS: u8 = 3;

const VALUE_MATCH_VALUE: u8 = 0;
const VALUE_MATCH_SKIP: u8 = 1;

/// Wildcard width inside a header value sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipKind {
    /// Exactly one value.
    Skip,
    /// Zero or more values.
    SkipMany,
}

impl SkipKind {
    /// Wire discriminator.
    pub const fn code(self) -> u8 {
        match self {
            Self::Skip => 0,
            Self::SkipMany => 1,
        }
    }

    /// Look up a skip kind by wire discriminator.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Skip),
            1 => Some(Self::SkipMany),
            _ => None,
        }
    }
}

/// One position in a header value sequence.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueMatch {
    /// Must equal this value.
    Value(NullableBytes),
    /// Wildcard.
    Skip(SkipKind),
}

/// Ordered pattern list of a [`Condition::Headers`].
pub type ValueMatches = SmallVec<[ValueMatch; 4]>;

/// Conditions that may appear under [`Condition::Not`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Negatable {
    /// Record key equals this value.
    Key(NullableBytes),
    /// Some header with this name has this value.
    Header(Header),
}

/// A single predicate over a record.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Condition {
    /// Record key equals this value.
    Key(NullableBytes),
    /// Some header with this name has this value.
    Header(Header),
    /// The values of every header with `name`, in order, match `values`.
    Headers {
        /// Header name.
        name: Bytes,
        /// Value patterns.
        values: ValueMatches,
    },
    /// The inner condition does not hold.
    Not(Negatable),
}

/// Conjunction of conditions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Filter {
    /// Conditions, all of which must hold.
    pub conditions: Vec<Condition>,
}

impl Filter {
    /// Create a filter from its conditions.
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }
}

// ── Encoding ────────────────────────────────────────────────────

/// Encode one value match.
pub fn encode_value_match(m: &ValueMatch, w: &mut FrameWriter) -> Result<(), CodecError> {
    match m {
        ValueMatch::Value(v) => {
            w.put_u8(VALUE_MATCH_VALUE)?;
            v.encode(w)
        }
        ValueMatch::Skip(kind) => {
            w.put_u8(VALUE_MATCH_SKIP)?;
            w.put_u8(kind.code())
        }
    }
}

fn encode_key(key: &NullableBytes, w: &mut FrameWriter) -> Result<(), CodecError> {
    w.put_u8(CONDITION_KEY)?;
    key.encode(w)
}

fn encode_header(header: &Header, w: &mut FrameWriter) -> Result<(), CodecError> {
    w.put_u8(CONDITION_HEADER)?;
    header.encode(w)
}

fn encode_negatable(n: &Negatable, w: &mut FrameWriter) -> Result<(), CodecError> {
    match n {
        Negatable::Key(key) => encode_key(key, w),
        Negatable::Header(header) => encode_header(header, w),
    }
}

/// Encode one condition, tag first.
pub fn encode_condition(c: &Condition, w: &mut FrameWriter) -> Result<(), CodecError> {
    match c {
        Condition::Key(key) => encode_key(key, w),
        Condition::Header(header) => encode_header(header, w),
        Condition::Not(inner) => {
            w.put_u8(CONDITION_NOT)?;
            encode_negatable(inner, w)
        }
        Condition::Headers { name, values } => {
            w.put_u8(CONDITION_HEADERS)?;
            w.put_bytes16(name)?;
            w.put_array32_with(values, |w, m| encode_value_match(m, w))
        }
    }
}

// ── Decoding ────────────────────────────────────────────────────

/// Decode one value match.
pub fn decode_value_match(r: &mut FrameReader<'_>) -> Result<ValueMatch, DecodeError> {
    let offset = r.offset();
    match r.get_u8()? {
        VALUE_MATCH_VALUE => NullableBytes::decode(r).map(ValueMatch::Value),
        VALUE_MATCH_SKIP => {
            let at = r.offset();
            let code = r.get_u8()?;
            SkipKind::from_code(code)
                .map(ValueMatch::Skip)
                .ok_or(DecodeError::UnknownTag {
                    what: "skip kind",
                    tag: code,
                    offset: at,
                })
        }
        tag => Err(DecodeError::UnknownTag {
            what: "value match",
            tag,
            offset,
        }),
    }
}

fn decode_negatable(r: &mut FrameReader<'_>) -> Result<Negatable, DecodeError> {
    let offset = r.offset();
    match r.get_u8()? {
        CONDITION_KEY => NullableBytes::decode(r).map(Negatable::Key),
        CONDITION_HEADER => Header::decode(r).map(Negatable::Header),
        tag => Err(DecodeError::UnknownTag {
            what: "negated condition",
            tag,
            offset,
        }),
    }
}

/// Decode one condition.
///
/// A `Not` whose nested tag is anything but `Key` or `Header` is rejected.
pub fn decode_condition(r: &mut FrameReader<'_>) -> Result<Condition, DecodeError> {
    let offset = r.offset();
    match r.get_u8()? {
        CONDITION_KEY => NullableBytes::decode(r).map(Condition::Key),
        CONDITION_HEADER => Header::decode(r).map(Condition::Header),
        CONDITION_NOT => decode_negatable(r).map(Condition::Not),
        CONDITION_HEADERS => {
            let name = r.get_bytes16("headers name")?;
            let values = r.get_array32_with("header values", decode_value_match)?;
            Ok(Condition::Headers {
                name,
                values: values.into_iter().collect(),
            })
        }
        tag => Err(DecodeError::UnknownTag {
            what: "condition",
            tag,
            offset,
        }),
    }
}

impl WireEncode for Condition {
    fn encode(&self, w: &mut FrameWriter) -> Result<(), CodecError> {
        encode_condition(self, w)
    }
}

impl WireDecode for Condition {
    fn decode(r: &mut FrameReader<'_>) -> Result<Self, DecodeError> {
        decode_condition(r)
    }
}

impl WireEncode for Filter {
    fn encode(&self, w: &mut FrameWriter) -> Result<(), CodecError> {
        w.put_array32(&self.conditions)
    }
}

impl WireDecode for Filter {
    fn decode(r: &mut FrameReader<'_>) -> Result<Self, DecodeError> {
        r.get_array32("conditions").map(Self::new)
    }
}
