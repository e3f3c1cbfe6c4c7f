//! Filter evaluation against a record.

use kext_core::{Header, NullableBytes};

use crate::condition::{Condition, Filter, Negatable, SkipKind, ValueMatch};

/// The parts of a record that filters look at.
#[derive(Clone, Copy, Debug)]
pub struct Record<'a> {
    /// Record key; `None` for a null key.
    pub key: Option<&'a [u8]>,
    /// Record headers in wire order.
    pub headers: &'a [Header],
}

impl<'a> Record<'a> {
    /// Create a record view.
    pub fn new(key: Option<&'a [u8]>, headers: &'a [Header]) -> Self {
        Self { key, headers }
    }

    fn values_of<'r>(&'r self, name: &'r [u8]) -> impl Iterator<Item = &'a NullableBytes> + 'r {
        self.headers
            .iter()
            .filter(move |h| h.name.as_ref() == name)
            .map(|h| &h.value)
    }
}

impl Negatable {
    /// Whether the condition holds for `record`.
    pub fn holds(&self, record: &Record<'_>) -> bool {
        match self {
            Negatable::Key(key) => key.as_deref() == record.key,
            Negatable::Header(header) => record
                .values_of(&header.name)
                .any(|value| *value == header.value),
        }
    }
}

impl Condition {
    /// Whether the condition holds for `record`.
    pub fn holds(&self, record: &Record<'_>) -> bool {
        match self {
            Condition::Key(key) => key.as_deref() == record.key,
            Condition::Header(header) => record
                .values_of(&header.name)
                .any(|value| *value == header.value),
            Condition::Headers { name, values } => {
                let actual: Vec<&NullableBytes> = record.values_of(name).collect();
                match_sequence(values, &actual)
            }
            Condition::Not(inner) => !inner.holds(record),
        }
    }
}

impl Filter {
    /// Whether every condition holds for `record`.
    pub fn matches(&self, record: &Record<'_>) -> bool {
        self.conditions.iter().all(|c| c.holds(record))
    }
}

/// Whether any filter matches `record`. An empty list matches everything.
pub fn matches_any(filters: &[Filter], record: &Record<'_>) -> bool {
    filters.is_empty() || filters.iter().any(|f| f.matches(record))
}

/// Bit set of the indexes of the filters that match `record`.
///
/// Only the first 64 filters are representable.
pub fn matching_filters(filters: &[Filter], record: &Record<'_>) -> i64 {
    filters
        .iter()
        .take(64)
        .enumerate()
        .filter(|(_, f)| f.matches(record))
        .fold(0i64, |bits, (i, _)| bits | (1i64 << i))
}

/// Match header values against a pattern list.
///
/// Greedy scan that backtracks only to the most recent `SkipMany`, so the
/// cost stays within `patterns.len() * values.len()` steps however many
/// wildcards a decoded pattern carries.
fn match_sequence(patterns: &[ValueMatch], values: &[&NullableBytes]) -> bool {
    let (mut p, mut v) = (0, 0);
    // Pattern index after the last SkipMany, and the value index it resumed at.
    let mut resume: Option<(usize, usize)> = None;
    while v < values.len() {
        match patterns.get(p) {
            Some(ValueMatch::Skip(SkipKind::SkipMany)) => {
                p += 1;
                resume = Some((p, v));
            }
            Some(ValueMatch::Skip(SkipKind::Skip)) => {
                p += 1;
                v += 1;
            }
            Some(ValueMatch::Value(expected)) if values[v] == expected => {
                p += 1;
                v += 1;
            }
            _ => match resume {
                Some((after, at)) => {
                    resume = Some((after, at + 1));
                    p = after;
                    v = at + 1;
                }
                None => return false,
            },
        }
    }
    patterns[p..]
        .iter()
        .all(|m| *m == ValueMatch::Skip(SkipKind::SkipMany))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use kext_core::{encode_to_bytes, FrameReader, WireDecode};
    use proptest::prelude::*;
    use smallvec::smallvec;
    use std::time::{Duration, Instant};

    fn headers(pairs: &[(&str, &str)]) -> Vec<Header> {
        pairs.iter().map(|(n, v)| Header::new(n, *v)).collect()
    }

    fn seq(values: crate::condition::ValueMatches) -> Condition {
        Condition::Headers {
            name: Bytes::from_static(b"h"),
            values,
        }
    }

    fn v(s: &str) -> ValueMatch {
        ValueMatch::Value(s.into())
    }

    const SKIP: ValueMatch = ValueMatch::Skip(SkipKind::Skip);
    const MANY: ValueMatch = ValueMatch::Skip(SkipKind::SkipMany);

    #[test]
    fn key_equality_and_null() {
        let hs = headers(&[]);
        let rec = Record::new(Some(&b"k1"[..]), &hs);
        assert!(Condition::Key("k1".into()).holds(&rec));
        assert!(!Condition::Key("k2".into()).holds(&rec));
        assert!(!Condition::Key(NullableBytes::null()).holds(&rec));

        let null_key = Record::new(None, &hs);
        assert!(Condition::Key(NullableBytes::null()).holds(&null_key));
        assert!(!Condition::Key("".into()).holds(&null_key));
    }

    #[test]
    fn header_any_occurrence() {
        let hs = headers(&[("h", "a"), ("h", "b"), ("x", "c")]);
        let rec = Record::new(None, &hs);
        assert!(Condition::Header(Header::new("h", "b")).holds(&rec));
        assert!(!Condition::Header(Header::new("h", "c")).holds(&rec));
    }

    #[test]
    fn not_negates() {
        let hs = headers(&[]);
        let rec = Record::new(Some(&b"x"[..]), &hs);
        assert!(!Condition::Not(Negatable::Key("x".into())).holds(&rec));
        assert!(Condition::Not(Negatable::Key("y".into())).holds(&rec));
    }

    #[test]
    fn skip_consumes_exactly_one() {
        let hs = headers(&[("h", "a"), ("h", "b")]);
        let rec = Record::new(None, &hs);
        assert!(seq(smallvec![SKIP, v("b")]).holds(&rec));
        assert!(seq(smallvec![SKIP, SKIP]).holds(&rec));
        assert!(!seq(smallvec![SKIP]).holds(&rec));
        assert!(!seq(smallvec![SKIP, SKIP, SKIP]).holds(&rec));
    }

    #[test]
    fn skip_many_with_zero_one_and_more_trailing() {
        let pattern = seq(smallvec![v("a"), MANY]);
        for tail in [vec![], vec![("h", "b")], vec![("h", "b"), ("h", "c")]] {
            let mut hs = headers(&[("h", "a")]);
            hs.extend(headers(&tail));
            assert!(pattern.holds(&Record::new(None, &hs)), "tail {tail:?}");
        }
    }

    #[test]
    fn skip_many_then_value_anchors_at_end() {
        let pattern = seq(smallvec![MANY, v("z")]);
        let hs = headers(&[("h", "a"), ("h", "z"), ("h", "b")]);
        assert!(!pattern.holds(&Record::new(None, &hs)));
        let hs = headers(&[("h", "a"), ("h", "b"), ("h", "z")]);
        assert!(pattern.holds(&Record::new(None, &hs)));
    }

    #[test]
    fn exact_sequence_requires_all_values() {
        let hs = headers(&[("h", "a"), ("h", "b")]);
        let rec = Record::new(None, &hs);
        assert!(seq(smallvec![v("a"), v("b")]).holds(&rec));
        assert!(!seq(smallvec![v("a")]).holds(&rec));
    }

    #[test]
    fn filters_or_conditions_and() {
        let hs = headers(&[("h", "a")]);
        let rec = Record::new(Some(&b"k"[..]), &hs);
        let both = Filter::new(vec![
            Condition::Key("k".into()),
            Condition::Header(Header::new("h", "a")),
        ]);
        let wrong = Filter::new(vec![
            Condition::Key("k".into()),
            Condition::Header(Header::new("h", "nope")),
        ]);
        assert!(both.matches(&rec));
        assert!(!wrong.matches(&rec));
        assert!(matches_any(&[wrong.clone(), both.clone()], &rec));
        assert!(!matches_any(std::slice::from_ref(&wrong), &rec));
        assert!(matches_any(&[], &rec));
        assert_eq!(matching_filters(&[wrong, both], &rec), 0b10);
    }

    #[test]
    fn decoded_pattern_with_many_skip_many_stays_fast() {
        let mut values = crate::condition::ValueMatches::new();
        for _ in 0..64 {
            values.push(MANY);
            values.push(v("a"));
        }
        values.push(v("z"));
        let filter = Filter::new(vec![seq(values)]);
        let bytes = encode_to_bytes(&filter).unwrap();
        let decoded = Filter::decode(&mut FrameReader::new(&bytes)).unwrap();
        assert_eq!(decoded, filter);

        let hs = headers(&[("h", "a"); 256]);
        let rec = Record::new(None, &hs);
        let started = Instant::now();
        assert!(!decoded.matches(&rec));
        assert_eq!(matching_filters(std::slice::from_ref(&decoded), &rec), 0);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    /// Exhaustive split search, used as the reference on small inputs.
    fn reference(patterns: &[ValueMatch], values: &[&NullableBytes]) -> bool {
        let Some((head, rest)) = patterns.split_first() else {
            return values.is_empty();
        };
        match head {
            ValueMatch::Value(expected) => values
                .split_first()
                .is_some_and(|(actual, tail)| *actual == expected && reference(rest, tail)),
            ValueMatch::Skip(SkipKind::Skip) => {
                !values.is_empty() && reference(rest, &values[1..])
            }
            ValueMatch::Skip(SkipKind::SkipMany) => {
                (0..=values.len()).any(|i| reference(rest, &values[i..]))
            }
        }
    }

    fn arb_match() -> impl Strategy<Value = ValueMatch> {
        prop_oneof![
            prop_oneof![Just("a"), Just("b")].prop_map(v),
            Just(SKIP),
            Just(MANY),
        ]
    }

    proptest! {
        #[test]
        fn sequence_agrees_with_exhaustive_search(
            patterns in proptest::collection::vec(arb_match(), 0..7),
            raw in proptest::collection::vec(prop_oneof![Just("a"), Just("b")], 0..7),
        ) {
            let owned: Vec<NullableBytes> = raw.iter().map(|s| NullableBytes::from(*s)).collect();
            let values: Vec<&NullableBytes> = owned.iter().collect();
            prop_assert_eq!(
                match_sequence(&patterns, &values),
                reference(&patterns, &values)
            );
        }
    }
}
