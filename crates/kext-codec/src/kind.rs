//! Frame kinds, stream events and the common frame header.

use std::fmt;

use kext_core::{CodecError, DecodeError, FrameReader, FrameWriter};

/// Stream-layer event an extension frame is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Stream opened.
    Begin,
    /// Payload delivered.
    Data,
    /// Progress flushed without payload.
    Flush,
}

impl Event {
    /// Lowercase event name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Data => "data",
            Self::Flush => "flush",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol kind selecting the body layout of an extension frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Kind {
    /// Produce records to one partition.
    Produce = 0,
    /// Fetch records from one partition.
    Fetch = 1,
    /// Partition leadership metadata.
    Meta = 3,
    /// Topic configuration.
    Describe = 32,
    /// Bootstrap a topic cache.
    Bootstrap = 254,
    /// Merged fetch/produce over every partition of a topic.
    Merged = 255,
}

impl Kind {
    /// Every kind, in discriminator order.
    pub const ALL: [Kind; 6] = [
        Kind::Produce,
        Kind::Fetch,
        Kind::Meta,
        Kind::Describe,
        Kind::Bootstrap,
        Kind::Merged,
    ];

    /// Wire discriminator.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Look up a kind by wire discriminator.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Produce),
            1 => Some(Self::Fetch),
            3 => Some(Self::Meta),
            32 => Some(Self::Describe),
            254 => Some(Self::Bootstrap),
            255 => Some(Self::Merged),
            _ => None,
        }
    }

    /// Lowercase kind name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Produce => "produce",
            Self::Fetch => "fetch",
            Self::Meta => "meta",
            Self::Describe => "describe",
            Self::Bootstrap => "bootstrap",
            Self::Merged => "merged",
        }
    }

    /// Whether frames of this kind carry a body for `event`.
    pub const fn supports(self, event: Event) -> bool {
        match event {
            Event::Begin => true,
            Event::Data => !matches!(self, Self::Bootstrap),
            Event::Flush => matches!(self, Self::Merged | Self::Fetch),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `type_id` and raw kind byte that open every extension frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    /// Extension type identifier.
    pub type_id: i32,
    /// Raw kind discriminator, not yet validated.
    pub kind: u8,
}

impl FrameHeader {
    /// Encoded size in bytes; every body starts at this offset.
    pub const WIRE_SIZE: usize = 5;

    /// Read the header at the reader's cursor.
    pub fn read(r: &mut FrameReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            type_id: r.get_i32()?,
            kind: r.get_u8()?,
        })
    }

    /// Read the header from the start of `buf` without consuming it.
    pub fn peek(buf: &[u8]) -> Result<Self, DecodeError> {
        Self::read(&mut FrameReader::new(buf))
    }

    /// Write a header for `kind`.
    pub fn write(w: &mut FrameWriter, type_id: i32, kind: Kind) -> Result<(), CodecError> {
        w.put_i32(type_id)?;
        w.put_u8(kind.code())
    }

    /// Resolve the kind byte for `event`.
    ///
    /// An unrecognised byte is an unknown tag. A recognised kind without a
    /// body for `event` is unsupported.
    pub fn kind_for(&self, event: Event) -> Result<Kind, DecodeError> {
        let kind = Kind::from_code(self.kind).ok_or(DecodeError::UnknownTag {
            what: "kind",
            tag: self.kind,
            offset: 4,
        })?;
        if !kind.supports(event) {
            return Err(DecodeError::UnsupportedKind {
                event: event.as_str(),
                kind: self.kind,
            });
        }
        Ok(kind)
    }
}
