//! Error types for frame construction, decoding and configuration.
//!
//! Construction errors abort a builder before any bytes are handed out.
//! Decode errors are fatal to the one decode attempt that raised them.
//! Neither is ever retried.

use thiserror::Error;

/// Errors raised while building or encoding a frame.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CodecError {
    /// An enumeration was given a name it does not define.
    #[error("invalid {kind} name '{name}'")]
    InvalidEnumName {
        /// Which enumeration was being parsed.
        kind: &'static str,
        /// The rejected name.
        name: String,
    },
    /// The encoded frame does not fit in the scratch buffer.
    #[error("scratch buffer overflow: {required} bytes required, capacity {capacity}")]
    ScratchOverflow {
        /// Configured scratch capacity in bytes.
        capacity: usize,
        /// Bytes the frame needed at the point of overflow.
        required: usize,
    },
    /// A field was set after a field that must follow it.
    #[error("field '{field}' set out of order")]
    FieldOutOfOrder {
        /// The field whose setter was called too late.
        field: &'static str,
    },
    /// A header value sequence carries more than one skip-many wildcard.
    #[error("header value sequence for '{name}' has more than one skip-many wildcard")]
    AmbiguousWildcard {
        /// Header name of the offending sequence (lossy UTF-8).
        name: String,
    },
    /// A variable-length field is longer than its length prefix can express.
    #[error("{field} length {len} exceeds its length prefix")]
    LengthOverflow {
        /// Field being encoded.
        field: &'static str,
        /// Length that did not fit.
        len: usize,
    },
    /// A name that must be unique within its list was given twice.
    #[error("duplicate {field} name '{name}'")]
    DuplicateName {
        /// List the name belongs to.
        field: &'static str,
        /// The repeated name.
        name: String,
    },
    /// No kind was selected before building the frame.
    #[error("frame has no kind selected")]
    MissingKind,
    /// The codec configuration is invalid.
    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while decoding a frame from raw bytes.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The input ends before a field is complete.
    #[error("truncated at offset {offset}: need {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Offset of the incomplete field.
        offset: usize,
        /// Bytes the field needs.
        needed: usize,
        /// Bytes left in the input.
        remaining: usize,
    },
    /// A length prefix is outside the range its field allows.
    #[error("invalid {field} length {len} at offset {offset}")]
    InvalidLength {
        /// Field being decoded.
        field: &'static str,
        /// The rejected length value.
        len: i64,
        /// Offset of the length prefix.
        offset: usize,
    },
    /// A discriminator byte names no known variant.
    #[error("unknown {what} tag {tag} at offset {offset}")]
    UnknownTag {
        /// What the tag discriminates.
        what: &'static str,
        /// The unrecognised tag value.
        tag: u8,
        /// Offset of the tag byte.
        offset: usize,
    },
    /// The kind is known but has no body for this stream event.
    #[error("kind {kind} has no {event} body")]
    UnsupportedKind {
        /// Stream event being decoded (`begin`, `data` or `flush`).
        event: &'static str,
        /// Kind discriminator found in the frame.
        kind: u8,
    },
    /// A string field is not valid UTF-8.
    #[error("{field} at offset {offset} is not valid UTF-8")]
    InvalidUtf8 {
        /// Field being decoded.
        field: &'static str,
        /// Offset of the string payload.
        offset: usize,
    },
    /// An array's declared byte length disagrees with its items.
    #[error("{field} declares {declared} bytes but its items span {actual}")]
    ArrayLengthMismatch {
        /// Field being decoded.
        field: &'static str,
        /// Byte length from the array header.
        declared: usize,
        /// Bytes actually consumed by the items.
        actual: usize,
    },
    /// A name that must be unique within its list appears twice.
    #[error("duplicate {field} name '{name}' at offset {offset}")]
    DuplicateName {
        /// List being decoded.
        field: &'static str,
        /// The repeated name.
        name: String,
        /// Offset of the repeated entry.
        offset: usize,
    },
    /// A varint runs past ten bytes or overflows 64 bits.
    #[error("varint overflow at offset {offset}")]
    VarintOverflow {
        /// Offset of the varint.
        offset: usize,
    },
}

impl DecodeError {
    /// Shift any offset carried by this error by `base`.
    ///
    /// Used when a nested decoder reports positions relative to a
    /// sub-slice.
    pub fn offset_by(self, base: usize) -> Self {
        match self {
            Self::Truncated {
                offset,
                needed,
                remaining,
            } => Self::Truncated {
                offset: offset + base,
                needed,
                remaining,
            },
            Self::InvalidLength { field, len, offset } => Self::InvalidLength {
                field,
                len,
                offset: offset + base,
            },
            Self::UnknownTag { what, tag, offset } => Self::UnknownTag {
                what,
                tag,
                offset: offset + base,
            },
            Self::InvalidUtf8 { field, offset } => Self::InvalidUtf8 {
                field,
                offset: offset + base,
            },
            Self::DuplicateName {
                field,
                name,
                offset,
            } => Self::DuplicateName {
                field,
                name,
                offset: offset + base,
            },
            Self::VarintOverflow { offset } => Self::VarintOverflow {
                offset: offset + base,
            },
            other => other,
        }
    }
}

/// Errors detected by [`CodecConfig::validate`](crate::CodecConfig::validate).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Scratch capacity is below the smallest frame header plus body.
    #[error("scratch_capacity {configured} is below minimum of {minimum}")]
    ScratchCapacityTooSmall {
        /// The configured capacity.
        configured: usize,
        /// The smallest accepted capacity.
        minimum: usize,
    },
    /// Scratch capacity exceeds what a length prefix can address.
    #[error("scratch_capacity {configured} exceeds maximum of {maximum}")]
    ScratchCapacityTooLarge {
        /// The configured capacity.
        configured: usize,
        /// The largest accepted capacity.
        maximum: usize,
    },
}
