//! End-to-end encode/decode scenarios across every frame kind.

use kext_codec::condition::{Condition, Negatable};
use kext_codec::{
    BeginBody, BeginEx, DataBody, DataEx, Event, Extension, Filter, FlushEx, Kind, Record,
};
use kext_core::{Capabilities, FrameReader, Header, OffsetTriple, LATEST_OFFSET_DEFAULT};
use kext_test_utils::fixtures::{self, TYPE_ID};
use kext_test_utils::init_tracing;

#[test]
fn every_sample_decodes_and_reencodes_identically() {
    init_tracing();
    for (event, kind, bytes) in fixtures::sample_frames() {
        let header = Extension::peek_header(&bytes).unwrap();
        assert_eq!(header.type_id, TYPE_ID);
        assert_eq!(header.kind, kind.code());

        let (frame, len) = Extension::decode(event, &bytes).unwrap();
        assert_eq!(len, bytes.len(), "{event} {kind}");
        assert_eq!(frame.event(), event);
        assert_eq!(frame.kind(), kind);
        assert_eq!(frame.to_bytes().unwrap(), bytes, "{event} {kind}");
    }
}

#[test]
fn every_supported_pair_has_a_sample() {
    let samples = fixtures::sample_frames();
    for event in [Event::Begin, Event::Data, Event::Flush] {
        for kind in Kind::ALL {
            let present = samples.iter().any(|(e, k, _)| *e == event && *k == kind);
            assert_eq!(present, kind.supports(event), "{event} {kind}");
        }
    }
}

#[test]
fn merged_fetch_only_scenario() {
    let bytes = fixtures::merged_fetch_only_begin();
    assert_eq!(bytes[4], Kind::Merged.code());
    // Capabilities byte is the first byte of the body.
    assert_eq!(bytes[5], Capabilities::FetchOnly.code());

    let (frame, _) = BeginEx::decode(&bytes).unwrap();
    let BeginBody::Merged(body) = frame.body else {
        panic!("expected merged body");
    };
    assert_eq!(body.topic, "t");
    assert_eq!(
        body.partitions,
        vec![OffsetTriple::with_latest(0, 10, LATEST_OFFSET_DEFAULT)]
    );
    assert_eq!(
        body.filters,
        vec![Filter::new(vec![Condition::Key("k1".into())])]
    );
}

#[test]
fn key_not_reencodes_identically() {
    let bytes = FlushEx::builder()
        .merged()
        .filter()
        .key_not("x")
        .build()
        .build()
        .build()
        .unwrap();
    let (frame, _) = FlushEx::decode(&bytes).unwrap();
    let kext_codec::FlushBody::Merged(body) = &frame.body else {
        panic!("expected merged flush");
    };
    assert_eq!(
        body.filters[0].conditions[0],
        Condition::Not(Negatable::Key("x".into()))
    );
    assert_eq!(frame.to_bytes().unwrap(), bytes);
}

#[test]
fn null_and_empty_values_survive_roundtrip() {
    let bytes = DataEx::builder()
        .fetch()
        .key(kext_core::NullableBytes::null())
        .header("empty", "")
        .header("null", kext_core::NullableBytes::null())
        .build()
        .build()
        .unwrap();
    let (frame, _) = DataEx::decode(&bytes).unwrap();
    let DataBody::Fetch(body) = frame.body else {
        panic!("expected fetch body");
    };
    assert!(body.key.is_null());
    assert_eq!(body.headers[0], Header::new("empty", ""));
    assert!(!body.headers[0].value.is_null());
    assert!(body.headers[1].value.is_null());
}

#[test]
fn begin_filters_select_fetched_records() {
    let (begin, _) = BeginEx::decode(&fixtures::merged_fetch_only_begin()).unwrap();
    let BeginBody::Merged(begin) = begin.body else {
        panic!("expected merged body");
    };
    for (key, expected) in [("k1", true), ("k2", false)] {
        let (data, _) = DataEx::decode(&fixtures::fetch_data_with_headers(key, &[])).unwrap();
        let DataBody::Fetch(data) = data.body else {
            panic!("expected fetch body");
        };
        let record = Record::new(data.key.as_deref(), &data.headers);
        assert_eq!(
            kext_codec::matches_any(&begin.filters, &record),
            expected,
            "key {key}"
        );
    }
}

#[test]
fn trailing_bytes_are_not_consumed() {
    let mut bytes = fixtures::merged_fetch_only_begin().to_vec();
    let frame_len = bytes.len();
    bytes.extend_from_slice(&[0xDE, 0xAD]);
    let (_, len) = BeginEx::decode(&bytes).unwrap();
    assert_eq!(len, frame_len);
}

#[test]
fn every_truncation_is_an_error() {
    for (event, _, bytes) in fixtures::sample_frames() {
        for cut in 0..bytes.len() {
            assert!(
                Extension::decode(event, &bytes[..cut]).is_err(),
                "{event} cut at {cut}"
            );
        }
    }
}

#[test]
fn reader_sees_body_at_offset_five() {
    let bytes = fixtures::merged_fetch_only_begin();
    let mut r = FrameReader::new(&bytes);
    r.get_i32().unwrap();
    r.get_u8().unwrap();
    assert_eq!(r.offset(), 5);
    assert_eq!(r.get_u8().unwrap(), Capabilities::FetchOnly.code());
}
