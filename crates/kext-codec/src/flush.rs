//! Flush extension frames.
//!
//! ```text
//! fetch  := offset_triple partition
//! merged := array32<offset_triple> progress, array32<filter> filters
//! ```

use bytes::Bytes;

use kext_core::{
    CodecConfig, CodecError, DecodeError, FrameReader, FrameWriter, OffsetTriple, WireDecode,
    WireEncode, LATEST_OFFSET_DEFAULT,
};

use crate::condition::Filter;
use crate::filter::{FilterBuilder, FilterTarget};
use crate::frame::{Frame, FrameBase, FrameBody};
use crate::kind::{Event, Kind};

/// A flush extension frame.
pub type FlushEx = Frame<FlushBody>;

/// Fetch flush body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchFlushEx {
    /// Position reached.
    pub partition: OffsetTriple,
}

/// Merged flush body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergedFlushEx {
    /// Progress across every partition of the topic.
    pub progress: Vec<OffsetTriple>,
    /// Replacement record filters.
    pub filters: Vec<Filter>,
}

/// Flush body for each kind that has one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlushBody {
    /// Merged.
    Merged(MergedFlushEx),
    /// Fetch.
    Fetch(FetchFlushEx),
}

impl WireEncode for FlushBody {
    fn encode(&self, w: &mut FrameWriter) -> Result<(), CodecError> {
        match self {
            Self::Fetch(b) => b.partition.encode(w),
            Self::Merged(b) => {
                w.put_array32(&b.progress)?;
                w.put_array32(&b.filters)
            }
        }
    }
}

impl FrameBody for FlushBody {
    const EVENT: Event = Event::Flush;

    fn kind(&self) -> Kind {
        match self {
            Self::Merged(_) => Kind::Merged,
            Self::Fetch(_) => Kind::Fetch,
        }
    }

    fn decode_body(kind: Kind, r: &mut FrameReader<'_>) -> Result<Self, DecodeError> {
        match kind {
            Kind::Fetch => Ok(Self::Fetch(FetchFlushEx {
                partition: OffsetTriple::decode(r)?,
            })),
            Kind::Merged => Ok(Self::Merged(MergedFlushEx {
                progress: r.get_array32("progress")?,
                filters: r.get_array32("filters")?,
            })),
            other => Err(DecodeError::UnsupportedKind {
                event: Event::Flush.as_str(),
                kind: other.code(),
            }),
        }
    }
}

impl FlushEx {
    /// Start building a flush frame with the default [`CodecConfig`].
    pub fn builder() -> FlushExBuilder {
        FlushExBuilder::new()
    }
}

/// Builds one flush frame.
#[derive(Debug)]
#[must_use = "call build() to encode the frame"]
pub struct FlushExBuilder {
    base: FrameBase,
    body: Option<FlushBody>,
}

impl Default for FlushExBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FlushExBuilder {
    /// Create a builder with the default [`CodecConfig`].
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    /// Create a builder whose scratch buffer is sized by `config`.
    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            base: FrameBase::new(config),
            body: None,
        }
    }

    /// Set the extension type identifier.
    pub fn type_id(mut self, type_id: i32) -> Self {
        self.base.type_id = type_id;
        self
    }

    /// Select the merged kind.
    pub fn merged(self) -> MergedFlushBuilder {
        MergedFlushBuilder {
            parent: self,
            body: MergedFlushEx::default(),
        }
    }

    /// Select the fetch kind.
    pub fn fetch(self) -> FetchFlushBuilder {
        FetchFlushBuilder {
            parent: self,
            body: FetchFlushEx::default(),
        }
    }

    fn with_body(mut self, body: FlushBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Encode the frame.
    pub fn build(self) -> Result<Bytes, CodecError> {
        self.base.finish(self.body)
    }
}

/// Fetch flush fields.
#[derive(Debug)]
#[must_use = "call build() to return to the frame builder"]
pub struct FetchFlushBuilder {
    parent: FlushExBuilder,
    body: FetchFlushEx,
}

impl FetchFlushBuilder {
    /// Set the partition, tracking the latest offset.
    pub fn partition(self, partition_id: i32, partition_offset: i64) -> Self {
        self.partition_with_latest(partition_id, partition_offset, LATEST_OFFSET_DEFAULT)
    }

    /// Set the partition with an explicit latest offset.
    pub fn partition_with_latest(
        mut self,
        partition_id: i32,
        partition_offset: i64,
        latest_offset: i64,
    ) -> Self {
        self.body.partition =
            OffsetTriple::with_latest(partition_id, partition_offset, latest_offset);
        self
    }

    /// Return to the frame builder.
    pub fn build(self) -> FlushExBuilder {
        self.parent.with_body(FlushBody::Fetch(self.body))
    }
}

/// Merged flush fields.
#[derive(Debug)]
#[must_use = "call build() to return to the frame builder"]
pub struct MergedFlushBuilder {
    parent: FlushExBuilder,
    body: MergedFlushEx,
}

impl MergedFlushBuilder {
    /// Append a progress entry tracking the latest offset.
    pub fn progress(self, partition_id: i32, partition_offset: i64) -> Self {
        self.progress_with_latest(partition_id, partition_offset, LATEST_OFFSET_DEFAULT)
    }

    /// Append a progress entry with an explicit latest offset.
    pub fn progress_with_latest(
        mut self,
        partition_id: i32,
        partition_offset: i64,
        latest_offset: i64,
    ) -> Self {
        self.body.progress.push(OffsetTriple::with_latest(
            partition_id,
            partition_offset,
            latest_offset,
        ));
        self
    }

    /// Start a filter; its `build()` returns here.
    pub fn filter(self) -> FilterBuilder<Self> {
        FilterBuilder::new(self)
    }

    /// Return to the frame builder.
    pub fn build(self) -> FlushExBuilder {
        self.parent.with_body(FlushBody::Merged(self.body))
    }
}

impl FilterTarget for MergedFlushBuilder {
    fn push_filter(&mut self, filter: Filter) {
        self.body.filters.push(filter);
    }

    fn record_error(&mut self, error: CodecError) {
        self.parent.base.record(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_flush_is_header_plus_triple() {
        let bytes = FlushEx::builder()
            .type_id(2)
            .fetch()
            .partition(1, 100)
            .build()
            .build()
            .unwrap();
        assert_eq!(bytes.len(), 5 + OffsetTriple::WIRE_SIZE);
        let (frame, _) = FlushEx::decode(&bytes).unwrap();
        assert_eq!(
            frame.body,
            FlushBody::Fetch(FetchFlushEx {
                partition: OffsetTriple::new(1, 100)
            })
        );
    }

    #[test]
    fn merged_flush_with_filters() {
        let bytes = FlushEx::builder()
            .merged()
            .progress(0, 1)
            .progress(1, 2)
            .filter()
            .key("k")
            .build()
            .build()
            .build()
            .unwrap();
        let (frame, len) = FlushEx::decode(&bytes).unwrap();
        assert_eq!(len, bytes.len());
        let FlushBody::Merged(body) = &frame.body else {
            panic!("expected merged body");
        };
        assert_eq!(body.progress.len(), 2);
        assert_eq!(body.filters.len(), 1);
        assert_eq!(frame.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn ambiguous_filter_fails_flush_build() {
        let err = FlushEx::builder()
            .merged()
            .filter()
            .headers("h")
            .skip_many()
            .value("a")
            .skip_many()
            .build()
            .build()
            .build()
            .build()
            .unwrap_err();
        assert!(matches!(err, CodecError::AmbiguousWildcard { .. }));
    }

    #[test]
    fn produce_has_no_flush_body() {
        let mut bytes = 0i32.to_le_bytes().to_vec();
        bytes.push(Kind::Produce.code());
        assert_eq!(
            FlushEx::decode(&bytes).unwrap_err(),
            DecodeError::UnsupportedKind {
                event: "flush",
                kind: 0
            }
        );
    }
}
