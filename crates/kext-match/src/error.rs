//! Match failure types.

use kext_codec::{Extension, FrameHeader};
use kext_core::DecodeError;
use thiserror::Error;

/// Why a specified matcher rejected its input.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MatchError {
    /// The input is not a well-formed frame.
    #[error("decode failed (type_id {type_id:?}, kind {kind:?}): {source}")]
    Decode {
        /// The decode error.
        #[source]
        source: DecodeError,
        /// Type id, if the input was long enough to hold one.
        type_id: Option<i32>,
        /// Raw kind byte, if the input was long enough to hold one.
        kind: Option<u8>,
    },
    /// The frame decoded but a specified field differs.
    #[error("mismatch on '{field}'")]
    Mismatch {
        /// First field that differed.
        field: &'static str,
        /// The decoded frame.
        actual: Box<Extension>,
    },
}

impl MatchError {
    /// Wrap a decode failure with whatever header bytes `buf` holds.
    pub(crate) fn decode(source: DecodeError, buf: &[u8]) -> Self {
        let type_id = buf
            .get(..4)
            .and_then(|b| <[u8; 4]>::try_from(b).ok())
            .map(i32::from_le_bytes);
        let kind = FrameHeader::peek(buf).ok().map(|header| header.kind);
        Self::Decode {
            source,
            type_id,
            kind,
        }
    }

    /// Field name of a mismatch, if this is one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Mismatch { field, .. } => Some(field),
            Self::Decode { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_header_recovered() {
        let source = DecodeError::Truncated {
            offset: 5,
            needed: 2,
            remaining: 0,
        };
        let mut buf = 9i32.to_le_bytes().to_vec();
        let err = MatchError::decode(source.clone(), &buf);
        assert_eq!(
            err,
            MatchError::Decode {
                source: source.clone(),
                type_id: Some(9),
                kind: None
            }
        );
        buf.push(1);
        let err = MatchError::decode(source.clone(), &buf);
        assert!(matches!(err, MatchError::Decode { kind: Some(1), .. }));
        let err = MatchError::decode(source, &buf[..2]);
        assert!(matches!(
            err,
            MatchError::Decode {
                type_id: None,
                kind: None,
                ..
            }
        ));
    }
}
