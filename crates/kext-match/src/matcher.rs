//! Generic frame matcher shared by the three stream events.

use tracing::debug;

use kext_codec::{Extension, Frame, FrameBody, Kind};
use kext_core::{CodecError, WireEncode};

use crate::cursor::ByteCursor;
use crate::error::MatchError;
use crate::expect::{self, Frozen};

/// Expected values for the body of one kind.
pub trait BodyMatcher {
    /// Frame body this matcher inspects.
    type Body: FrameBody;

    /// Kind the matcher expects.
    fn kind(&self) -> Kind;

    /// Compare every specified field, returning the first that differs.
    ///
    /// Called only with bodies of [`kind`](Self::kind).
    fn check(&self, body: &Self::Body) -> Result<(), &'static str>;
}

/// Matches one extension frame against the fields it specifies.
///
/// Unspecified fields are ignored. A matcher with nothing specified
/// matches nothing.
#[derive(Clone, Debug)]
pub struct ExMatcher<S> {
    type_id: Option<i32>,
    kind: Option<Kind>,
    body: Option<S>,
}

impl<S> ExMatcher<S>
where
    S: BodyMatcher,
    Frame<S::Body>: Into<Extension>,
{
    /// Whether any field is specified.
    pub fn is_specified(&self) -> bool {
        self.type_id.is_some() || self.kind.is_some() || self.body.is_some()
    }

    /// Match the frame at the cursor.
    ///
    /// Returns `Ok(false)` without reading when nothing is specified or
    /// the cursor is empty. On a match the cursor moves past the frame
    /// and `Ok(true)` is returned; otherwise the cursor is left alone.
    pub fn matches(&self, cursor: &mut ByteCursor<'_>) -> Result<bool, MatchError> {
        if !self.is_specified() || cursor.is_empty() {
            return Ok(false);
        }
        let event = <S::Body as FrameBody>::EVENT;
        let buf = cursor.remaining();
        let (frame, len) =
            Frame::<S::Body>::decode(buf).map_err(|source| MatchError::decode(source, buf))?;
        if let Err(field) = self.check(&frame) {
            debug!(%event, kind = %frame.kind(), field, "extension mismatch");
            return Err(MatchError::Mismatch {
                field,
                actual: Box::new(frame.into()),
            });
        }
        cursor.advance(len);
        debug!(%event, kind = %frame.kind(), len, "extension matched");
        Ok(true)
    }

    /// Whether `buf` starts with a matching frame.
    pub fn is_match(&self, buf: &[u8]) -> bool {
        matches!(self.matches(&mut ByteCursor::new(buf)), Ok(true))
    }

    fn check(&self, frame: &Frame<S::Body>) -> Result<(), &'static str> {
        expect::eq("type_id", &self.type_id, &frame.type_id)?;
        expect::eq("kind", &self.kind, &frame.kind())?;
        match &self.body {
            Some(body) if body.kind() != frame.kind() => Err("kind"),
            Some(body) => body.check(&frame.body),
            None => Ok(()),
        }
    }
}

// ── Builder state ───────────────────────────────────────────────

/// State shared by the three matcher builders.
#[derive(Debug, Default)]
pub(crate) struct MatcherBase {
    pub(crate) type_id: Option<i32>,
    pub(crate) kind: Option<Kind>,
    error: Option<CodecError>,
}

impl MatcherBase {
    pub(crate) fn record(&mut self, error: CodecError) {
        self.error.get_or_insert(error);
    }

    /// Freeze an expected composite, recording any encode failure.
    pub(crate) fn freeze<T: WireEncode + ?Sized>(&mut self, value: Option<&T>) -> Option<Frozen> {
        match value.map(Frozen::freeze).transpose() {
            Ok(frozen) => frozen,
            Err(error) => {
                self.record(error);
                None
            }
        }
    }

    pub(crate) fn finish<S: BodyMatcher>(self, body: Option<S>) -> Result<ExMatcher<S>, CodecError> {
        if let Some(error) = self.error {
            debug!(event = %<S::Body as FrameBody>::EVENT, %error, "matcher build rejected");
            return Err(error);
        }
        Ok(ExMatcher {
            type_id: self.type_id,
            kind: self.kind,
            body,
        })
    }
}
