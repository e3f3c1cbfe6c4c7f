//! Benchmark profiles for the kext codec.
//!
//! - [`filter_profile`]: filters mixing key, header and wildcard conditions
//! - [`fetch_data_profile`]: a fetch data frame with many headers
//! - [`header_profile`]: the headers of [`fetch_data_profile`]

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use bytes::Bytes;

use kext_codec::{DataExBuilder, Filter};
use kext_core::{CodecConfig, CodecError, Header};

/// `n` filters, each with a key condition and a wildcard header sequence.
pub fn filter_profile(n: usize) -> Result<Vec<Filter>, CodecError> {
    (0..n)
        .map(|i| {
            Filter::builder()
                .key(format!("key-{i}").as_str())
                .headers("trace")
                .value(format!("span-{i}").as_str())
                .skip_many()
                .build()
                .header_not("tombstone", "1")
                .finish()
        })
        .collect()
}

/// Headers `h0..hN` with values `v0..vN`.
pub fn header_profile(n: usize) -> Vec<Header> {
    (0..n)
        .map(|i| Header::new(format!("h{i}"), format!("v{i}").as_str()))
        .collect()
}

/// Fetch data frame keyed `key-0` carrying [`header_profile`]`(n)`.
pub fn fetch_data_profile(n: usize) -> Result<Bytes, CodecError> {
    let mut fetch = DataExBuilder::with_config(CodecConfig::with_scratch_capacity(1 << 16))
        .type_id(1)
        .fetch()
        .timestamp(1_700_000_000_000)
        .partition(0, 1_000)
        .key("key-0");
    for header in header_profile(n) {
        fetch = fetch.header(&header.name, header.value);
    }
    fetch.build().build()
}
