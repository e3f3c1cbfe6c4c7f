//! Expected-value comparisons.

use bytes::Bytes;

use kext_core::{encode_to_bytes, CodecError, WireEncode};

/// Encoded form of an expected composite field.
///
/// Composite fields are frozen when the matcher is built and compared
/// byte-for-byte with the re-encoded actual value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frozen(Bytes);

impl Frozen {
    /// Encode `value`.
    pub fn freeze<T: WireEncode + ?Sized>(value: &T) -> Result<Self, CodecError> {
        encode_to_bytes(value).map(Self)
    }

    /// Whether `actual` encodes to the frozen bytes.
    pub fn matches<T: WireEncode + ?Sized>(&self, actual: &T) -> bool {
        encode_to_bytes(actual).is_ok_and(|bytes| bytes == self.0)
    }

    /// The frozen bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Compare a scalar field if it was specified.
pub(crate) fn eq<T, U>(field: &'static str, expected: &Option<T>, actual: &U) -> Result<(), &'static str>
where
    T: PartialEq<U>,
    U: ?Sized,
{
    match expected {
        Some(expected) if expected != actual => Err(field),
        _ => Ok(()),
    }
}

/// Compare a composite field if it was specified.
pub(crate) fn frozen<T: WireEncode + ?Sized>(
    field: &'static str,
    expected: &Option<Frozen>,
    actual: &T,
) -> Result<(), &'static str> {
    match expected {
        Some(expected) if !expected.matches(actual) => Err(field),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kext_core::{NullableBytes, OffsetTriple};

    #[test]
    fn unspecified_fields_always_pass() {
        assert_eq!(eq::<i32, i32>("deferred", &None, &5), Ok(()));
        assert_eq!(frozen::<OffsetTriple>("partition", &None, &OffsetTriple::default()), Ok(()));
    }

    #[test]
    fn scalar_mismatch_names_field() {
        assert_eq!(eq("timestamp", &Some(1i64), &2i64), Err("timestamp"));
        assert_eq!(eq("timestamp", &Some(2i64), &2i64), Ok(()));
    }

    #[test]
    fn frozen_compares_encodings() {
        let expected = Some(Frozen::freeze(&NullableBytes::from("k1")).unwrap());
        assert_eq!(frozen("key", &expected, &NullableBytes::from("k1")), Ok(()));
        assert_eq!(frozen("key", &expected, &NullableBytes::from("k2")), Err("key"));
        assert_eq!(frozen("key", &expected, &NullableBytes::null()), Err("key"));
    }
}
