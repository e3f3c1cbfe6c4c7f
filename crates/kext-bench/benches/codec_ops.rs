//! Criterion micro-benchmarks for frame encoding, decoding, filter
//! evaluation and matching.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kext_bench::{fetch_data_profile, filter_profile, header_profile};
use kext_codec::{matching_filters, BeginEx, BeginExBuilder, DataEx, Filter, Record};
use kext_core::{decode_varint, encode_varint, CodecConfig, CodecError};
use kext_match::DataExMatcher;

/// Build a merged begin frame with 8 partitions and the given filters.
fn merged_begin(config: &CodecConfig, filters: &[Filter]) -> Result<Bytes, CodecError> {
    let mut merged = BeginExBuilder::with_config(config.clone())
        .type_id(1)
        .merged()
        .topic("orders");
    for p in 0..8 {
        merged = merged.partition(p, 1_000);
    }
    for filter in filters {
        let mut f = merged.filter();
        for condition in &filter.conditions {
            f = f.condition(condition.clone());
        }
        merged = f.build();
    }
    merged.build().build()
}

/// Benchmark: Build a merged begin frame carrying 32 filters.
fn bench_encode_merged_begin(c: &mut Criterion) {
    let filters = filter_profile(32).unwrap();
    let config = CodecConfig::with_scratch_capacity(1 << 16);

    c.bench_function("encode_merged_begin_32_filters", |b| {
        b.iter(|| black_box(merged_begin(&config, &filters).unwrap()));
    });
}

/// Benchmark: Decode and re-encode the same frame.
fn bench_reencode_merged_begin(c: &mut Criterion) {
    let config = CodecConfig::with_scratch_capacity(1 << 16);
    let bytes = merged_begin(&config, &filter_profile(32).unwrap()).unwrap();

    c.bench_function("reencode_merged_begin_32_filters", |b| {
        b.iter(|| {
            let (frame, _) = BeginEx::decode(&bytes).unwrap();
            black_box(frame.to_bytes_with(&config).unwrap());
        });
    });
}

/// Benchmark: Decode a fetch data frame with 64 headers.
fn bench_decode_fetch_data(c: &mut Criterion) {
    let bytes = fetch_data_profile(64).unwrap();

    c.bench_function("decode_fetch_data_64_headers", |b| {
        b.iter(|| black_box(DataEx::decode(&bytes).unwrap()));
    });
}

/// Benchmark: Evaluate 32 filters against one record.
fn bench_matching_filters(c: &mut Criterion) {
    let filters = filter_profile(32).unwrap();
    let headers = header_profile(64);
    let record = Record::new(Some(&b"key-31"[..]), &headers);

    c.bench_function("matching_filters_32x64", |b| {
        b.iter(|| black_box(matching_filters(&filters, &record)));
    });
}

/// Benchmark: Structural match of a fetch data frame.
fn bench_matcher(c: &mut Criterion) {
    let bytes = fetch_data_profile(64).unwrap();
    let mut fetch = DataExMatcher::builder().type_id(1).fetch().key("key-0");
    for header in header_profile(64) {
        fetch = fetch.header(&header.name, header.value);
    }
    let matcher = fetch.build().build().unwrap();

    c.bench_function("match_fetch_data_64_headers", |b| {
        b.iter(|| black_box(matcher.is_match(&bytes)));
    });
}

/// Benchmark: Varint encode and decode across magnitudes.
fn bench_varint(c: &mut Criterion) {
    let values: Vec<i64> = (0..64).map(|shift| (1i64 << shift) - 1).collect();

    c.bench_function("varint_roundtrip_64", |b| {
        b.iter(|| {
            for &v in &values {
                let bytes = encode_varint(v);
                black_box(decode_varint(&bytes).unwrap());
            }
        });
    });
}

criterion_group!(
    benches,
    bench_encode_merged_begin,
    bench_reencode_merged_begin,
    bench_decode_fetch_data,
    bench_matching_filters,
    bench_matcher,
    bench_varint
);
criterion_main!(benches);
