//! Sample frames.

use bytes::Bytes;

use kext_codec::{BeginEx, DataEx, Event, FlushEx, Kind};
use kext_core::LATEST_OFFSET_DEFAULT;

/// Type id stamped on every fixture frame.
pub const TYPE_ID: i32 = 0x4b45_5854;

/// Merged begin: `FETCH_ONLY`, topic `t`, partition `(0, 10, latest)`,
/// one filter on key `k1`.
pub fn merged_fetch_only_begin() -> Bytes {
    BeginEx::builder()
        .type_id(TYPE_ID)
        .merged()
        .capabilities("FETCH_ONLY")
        .unwrap()
        .topic("t")
        .partition_with_latest(0, 10, LATEST_OFFSET_DEFAULT)
        .filter()
        .key("k1")
        .build()
        .build()
        .build()
        .unwrap()
}

/// Fetch data with key `key` and one `h` header per entry of `values`.
pub fn fetch_data_with_headers(key: &str, values: &[&str]) -> Bytes {
    let mut fetch = DataEx::builder()
        .type_id(TYPE_ID)
        .fetch()
        .timestamp(1_700_000_000_000)
        .partition(0, 11)
        .key(key);
    for value in values {
        fetch = fetch.header("h", *value);
    }
    fetch.build().build().unwrap()
}

/// One populated frame for every supported (event, kind) pair.
pub fn sample_frames() -> Vec<(Event, Kind, Bytes)> {
    vec![
        (
            Event::Begin,
            Kind::Bootstrap,
            BeginEx::builder().type_id(TYPE_ID).bootstrap().topic("t").build().build().unwrap(),
        ),
        (Event::Begin, Kind::Merged, merged_fetch_only_begin()),
        (
            Event::Begin,
            Kind::Fetch,
            BeginEx::builder()
                .type_id(TYPE_ID)
                .fetch()
                .topic("t")
                .partition(1, 0)
                .filter()
                .headers("h")
                .value("a")
                .skip_many()
                .build()
                .build()
                .delta_type("JSON_PATCH")
                .unwrap()
                .build()
                .build()
                .unwrap(),
        ),
        (
            Event::Begin,
            Kind::Meta,
            BeginEx::builder().type_id(TYPE_ID).meta().topic("t").build().build().unwrap(),
        ),
        (
            Event::Begin,
            Kind::Describe,
            BeginEx::builder()
                .type_id(TYPE_ID)
                .describe()
                .topic("t")
                .config("cleanup.policy")
                .build()
                .build()
                .unwrap(),
        ),
        (
            Event::Begin,
            Kind::Produce,
            BeginEx::builder()
                .type_id(TYPE_ID)
                .produce()
                .transaction(Some("tx"))
                .producer_id(7)
                .topic("t")
                .partition(2, -1)
                .build()
                .build()
                .unwrap(),
        ),
        (
            Event::Data,
            Kind::Merged,
            DataEx::builder()
                .type_id(TYPE_ID)
                .merged()
                .partition(0, 11)
                .progress(0, 12)
                .key("k1")
                .header_int("n", 5)
                .build()
                .build()
                .unwrap(),
        ),
        (Event::Data, Kind::Fetch, fetch_data_with_headers("k1", &["a", "b"])),
        (
            Event::Data,
            Kind::Meta,
            DataEx::builder().type_id(TYPE_ID).meta().partition(0, 1).build().build().unwrap(),
        ),
        (
            Event::Data,
            Kind::Describe,
            DataEx::builder()
                .type_id(TYPE_ID)
                .describe()
                .config("cleanup.policy", "compact")
                .build()
                .build()
                .unwrap(),
        ),
        (
            Event::Data,
            Kind::Produce,
            DataEx::builder()
                .type_id(TYPE_ID)
                .produce()
                .sequence(3)
                .key("k1")
                .build()
                .build()
                .unwrap(),
        ),
        (
            Event::Flush,
            Kind::Merged,
            FlushEx::builder()
                .type_id(TYPE_ID)
                .merged()
                .progress(0, 12)
                .filter()
                .key_not("x")
                .build()
                .build()
                .build()
                .unwrap(),
        ),
        (
            Event::Flush,
            Kind::Fetch,
            FlushEx::builder().type_id(TYPE_ID).fetch().partition(0, 12).build().build().unwrap(),
        ),
    ]
}
