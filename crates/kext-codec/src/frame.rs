//! Generic extension frame: header plus a kind-specific body.
//!
//! [`Frame`] is instantiated once per stream event:
//! [`BeginEx`](crate::BeginEx), [`DataEx`](crate::DataEx) and
//! [`FlushEx`](crate::FlushEx). [`Extension`] erases the event for code
//! that handles any of the three.

use bytes::Bytes;
use tracing::{debug, trace};

use kext_core::{
    encode_to_bytes, CodecConfig, CodecError, DecodeError, FrameReader, FrameWriter, WireEncode,
};

use crate::begin::BeginEx;
use crate::data::DataEx;
use crate::flush::FlushEx;
use crate::kind::{Event, FrameHeader, Kind};

/// A kind-specific frame body for one stream event.
pub trait FrameBody: WireEncode + Sized {
    /// Stream event this body belongs to.
    const EVENT: Event;

    /// Kind discriminator written in the frame header.
    fn kind(&self) -> Kind;

    /// Read the body for `kind`, which has already been checked against
    /// [`EVENT`](Self::EVENT).
    fn decode_body(kind: Kind, r: &mut FrameReader<'_>) -> Result<Self, DecodeError>;
}

/// An extension frame: `[type_id i32][kind u8][body]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame<B> {
    /// Extension type identifier.
    pub type_id: i32,
    /// Kind-specific body.
    pub body: B,
}

impl<B: FrameBody> Frame<B> {
    /// Create a frame.
    pub fn new(type_id: i32, body: B) -> Self {
        Self { type_id, body }
    }

    /// Kind of the body.
    pub fn kind(&self) -> Kind {
        self.body.kind()
    }

    /// Decode a frame from the start of `buf`.
    ///
    /// Returns the frame and the number of bytes it occupies. Bytes after
    /// the frame are ignored.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), DecodeError> {
        let mut r = FrameReader::new(buf);
        let frame = Self::read(&mut r)?;
        Ok((frame, r.offset()))
    }

    /// Decode a frame at the reader's cursor.
    pub fn read(r: &mut FrameReader<'_>) -> Result<Self, DecodeError> {
        let result = FrameHeader::read(r).and_then(|header| {
            let kind = header.kind_for(B::EVENT)?;
            let body = B::decode_body(kind, r)?;
            Ok(Self::new(header.type_id, body))
        });
        if let Err(e) = &result {
            debug!(event = %B::EVENT, offset = r.offset(), error = %e, "extension decode failed");
        }
        result
    }

    /// Re-encode into a fresh buffer with no scratch limit.
    ///
    /// Decoding a frame and re-encoding it reproduces the original bytes.
    pub fn to_bytes(&self) -> Result<Bytes, CodecError> {
        encode_to_bytes(self)
    }

    /// Encode into a scratch buffer sized by `config`.
    pub fn to_bytes_with(&self, config: &CodecConfig) -> Result<Bytes, CodecError> {
        let mut w = FrameWriter::new(config)?;
        self.encode(&mut w)?;
        trace!(event = %B::EVENT, kind = %self.kind(), len = w.limit(), "extension encoded");
        Ok(w.finish())
    }
}

impl<B: FrameBody> WireEncode for Frame<B> {
    fn encode(&self, w: &mut FrameWriter) -> Result<(), CodecError> {
        FrameHeader::write(w, self.type_id, self.body.kind())?;
        self.body.encode(w)
    }
}

// ── Builder state ───────────────────────────────────────────────

/// State shared by the three frame builders.
///
/// Holds the first construction error raised by any nested builder; the
/// final build reports it instead of encoding.
#[derive(Debug)]
pub(crate) struct FrameBase {
    config: CodecConfig,
    pub(crate) type_id: i32,
    error: Option<CodecError>,
}

impl FrameBase {
    pub(crate) fn new(config: CodecConfig) -> Self {
        Self {
            config,
            type_id: 0,
            error: None,
        }
    }

    pub(crate) fn record(&mut self, error: CodecError) {
        self.error.get_or_insert(error);
    }

    pub(crate) fn finish<B: FrameBody>(self, body: Option<B>) -> Result<Bytes, CodecError> {
        if let Some(error) = self.error {
            debug!(event = %B::EVENT, %error, "extension build rejected");
            return Err(error);
        }
        let body = body.ok_or(CodecError::MissingKind)?;
        Frame::new(self.type_id, body).to_bytes_with(&self.config)
    }
}

// ── Extension ───────────────────────────────────────────────────

/// Any extension frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Extension {
    /// Begin frame.
    Begin(BeginEx),
    /// Data frame.
    Data(DataEx),
    /// Flush frame.
    Flush(FlushEx),
}

impl Extension {
    /// Read only the `(type_id, kind)` header at the start of `buf`.
    pub fn peek_header(buf: &[u8]) -> Result<FrameHeader, DecodeError> {
        FrameHeader::peek(buf)
    }

    /// Decode a frame for `event` from the start of `buf`.
    pub fn decode(event: Event, buf: &[u8]) -> Result<(Self, usize), DecodeError> {
        match event {
            Event::Begin => BeginEx::decode(buf).map(|(f, n)| (Self::Begin(f), n)),
            Event::Data => DataEx::decode(buf).map(|(f, n)| (Self::Data(f), n)),
            Event::Flush => FlushEx::decode(buf).map(|(f, n)| (Self::Flush(f), n)),
        }
    }

    /// Stream event of the frame.
    pub fn event(&self) -> Event {
        match self {
            Self::Begin(_) => Event::Begin,
            Self::Data(_) => Event::Data,
            Self::Flush(_) => Event::Flush,
        }
    }

    /// Extension type identifier.
    pub fn type_id(&self) -> i32 {
        match self {
            Self::Begin(f) => f.type_id,
            Self::Data(f) => f.type_id,
            Self::Flush(f) => f.type_id,
        }
    }

    /// Kind of the frame body.
    pub fn kind(&self) -> Kind {
        match self {
            Self::Begin(f) => f.kind(),
            Self::Data(f) => f.kind(),
            Self::Flush(f) => f.kind(),
        }
    }

    /// Re-encode into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Bytes, CodecError> {
        match self {
            Self::Begin(f) => f.to_bytes(),
            Self::Data(f) => f.to_bytes(),
            Self::Flush(f) => f.to_bytes(),
        }
    }
}

impl From<BeginEx> for Extension {
    fn from(frame: BeginEx) -> Self {
        Self::Begin(frame)
    }
}

impl From<DataEx> for Extension {
    fn from(frame: DataEx) -> Self {
        Self::Data(frame)
    }
}

impl From<FlushEx> for Extension {
    fn from(frame: FlushEx) -> Self {
        Self::Flush(frame)
    }
}
