//! Flush frame matchers.

use kext_codec::flush::{FetchFlushEx, MergedFlushEx};
use kext_codec::{Filter, FilterBuilder, FilterTarget, FlushBody, Kind};
use kext_core::{CodecError, OffsetTriple, LATEST_OFFSET_DEFAULT};

use crate::expect::{self, Frozen};
use crate::matcher::{BodyMatcher, ExMatcher, MatcherBase};

/// Matches flush frames.
pub type FlushExMatcher = ExMatcher<FlushBodyMatcher>;

impl FlushExMatcher {
    /// Start building a flush frame matcher.
    pub fn builder() -> FlushExMatcherBuilder {
        FlushExMatcherBuilder::new()
    }
}

/// Expected flush body for one kind.
#[derive(Clone, Debug)]
pub enum FlushBodyMatcher {
    /// Merged.
    Merged(MergedFlushMatcher),
    /// Fetch.
    Fetch(FetchFlushMatcher),
}

impl BodyMatcher for FlushBodyMatcher {
    type Body = FlushBody;

    fn kind(&self) -> Kind {
        match self {
            Self::Merged(_) => Kind::Merged,
            Self::Fetch(_) => Kind::Fetch,
        }
    }

    fn check(&self, body: &FlushBody) -> Result<(), &'static str> {
        match (self, body) {
            (Self::Merged(m), FlushBody::Merged(b)) => m.check(b),
            (Self::Fetch(m), FlushBody::Fetch(b)) => m.check(b),
            _ => Err("kind"),
        }
    }
}

/// Expected fetch flush fields.
#[derive(Clone, Debug, Default)]
pub struct FetchFlushMatcher {
    partition: Option<Frozen>,
}

impl FetchFlushMatcher {
    fn check(&self, b: &FetchFlushEx) -> Result<(), &'static str> {
        expect::frozen("partition", &self.partition, &b.partition)
    }
}

/// Expected merged flush fields.
#[derive(Clone, Debug, Default)]
pub struct MergedFlushMatcher {
    progress: Option<Frozen>,
    filters: Option<Frozen>,
}

impl MergedFlushMatcher {
    fn check(&self, b: &MergedFlushEx) -> Result<(), &'static str> {
        expect::frozen("progress", &self.progress, &b.progress)?;
        expect::frozen("filters", &self.filters, &b.filters)
    }
}

// ── Builders ────────────────────────────────────────────────────

/// Builds a [`FlushExMatcher`].
#[derive(Debug, Default)]
#[must_use = "call build() to create the matcher"]
pub struct FlushExMatcherBuilder {
    base: MatcherBase,
    body: Option<FlushBodyMatcher>,
}

impl FlushExMatcherBuilder {
    /// Create a builder with nothing specified.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect this extension type identifier.
    pub fn type_id(mut self, type_id: i32) -> Self {
        self.base.type_id = Some(type_id);
        self
    }

    /// Expect this kind without constraining the body.
    pub fn kind(mut self, kind: Kind) -> Self {
        self.base.kind = Some(kind);
        self
    }

    /// Expect a merged body.
    pub fn merged(self) -> MergedFlushMatcherBuilder {
        MergedFlushMatcherBuilder {
            parent: self,
            progress: None,
            filters: None,
        }
    }

    /// Expect a fetch body.
    pub fn fetch(self) -> FetchFlushMatcherBuilder {
        FetchFlushMatcherBuilder {
            parent: self,
            partition: None,
        }
    }

    fn with_body(mut self, body: FlushBodyMatcher) -> Self {
        self.body = Some(body);
        self
    }

    /// Freeze composite expectations and create the matcher.
    pub fn build(self) -> Result<FlushExMatcher, CodecError> {
        self.base.finish(self.body)
    }
}

/// Fetch flush expectations.
#[derive(Debug)]
#[must_use = "call build() to return to the matcher builder"]
pub struct FetchFlushMatcherBuilder {
    parent: FlushExMatcherBuilder,
    partition: Option<OffsetTriple>,
}

impl FetchFlushMatcherBuilder {
    /// Expect this partition with the default latest offset.
    pub fn partition(self, partition_id: i32, partition_offset: i64) -> Self {
        self.partition_with_latest(partition_id, partition_offset, LATEST_OFFSET_DEFAULT)
    }

    /// Expect this partition.
    pub fn partition_with_latest(
        mut self,
        partition_id: i32,
        partition_offset: i64,
        latest_offset: i64,
    ) -> Self {
        self.partition = Some(OffsetTriple::with_latest(
            partition_id,
            partition_offset,
            latest_offset,
        ));
        self
    }

    /// Return to the matcher builder.
    pub fn build(mut self) -> FlushExMatcherBuilder {
        let partition = self.parent.base.freeze(self.partition.as_ref());
        self.parent
            .with_body(FlushBodyMatcher::Fetch(FetchFlushMatcher { partition }))
    }
}

/// Merged flush expectations.
#[derive(Debug)]
#[must_use = "call build() to return to the matcher builder"]
pub struct MergedFlushMatcherBuilder {
    parent: FlushExMatcherBuilder,
    progress: Option<Vec<OffsetTriple>>,
    filters: Option<Vec<Filter>>,
}

impl MergedFlushMatcherBuilder {
    /// Expect this progress entry next.
    pub fn progress(self, partition_id: i32, partition_offset: i64) -> Self {
        self.progress_with_latest(partition_id, partition_offset, LATEST_OFFSET_DEFAULT)
    }

    /// Expect this progress entry next, with an explicit latest offset.
    pub fn progress_with_latest(
        mut self,
        partition_id: i32,
        partition_offset: i64,
        latest_offset: i64,
    ) -> Self {
        self.progress
            .get_or_insert_with(Vec::new)
            .push(OffsetTriple::with_latest(
                partition_id,
                partition_offset,
                latest_offset,
            ));
        self
    }

    /// Expect this filter next; its `build()` returns here.
    pub fn filter(self) -> FilterBuilder<Self> {
        FilterBuilder::new(self)
    }

    /// Return to the matcher builder.
    pub fn build(mut self) -> FlushExMatcherBuilder {
        let base = &mut self.parent.base;
        let matcher = MergedFlushMatcher {
            progress: base.freeze(self.progress.as_ref()),
            filters: base.freeze(self.filters.as_ref()),
        };
        self.parent.with_body(FlushBodyMatcher::Merged(matcher))
    }
}

impl FilterTarget for MergedFlushMatcherBuilder {
    fn push_filter(&mut self, filter: Filter) {
        self.filters.get_or_insert_with(Vec::new).push(filter);
    }

    fn record_error(&mut self, error: CodecError) {
        self.parent.base.record(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ByteCursor, MatchError};
    use kext_codec::FlushEx;

    #[test]
    fn fetch_partition_match() {
        let bytes = FlushEx::builder()
            .fetch()
            .partition(0, 12)
            .build()
            .build()
            .unwrap();
        let hit = FlushExMatcher::builder()
            .fetch()
            .partition(0, 12)
            .build()
            .build()
            .unwrap();
        let miss = FlushExMatcher::builder()
            .fetch()
            .partition(0, 13)
            .build()
            .build()
            .unwrap();
        assert!(hit.is_match(&bytes));
        assert_eq!(
            miss.matches(&mut ByteCursor::new(&bytes)).unwrap_err().field(),
            Some("partition")
        );
    }

    #[test]
    fn merged_progress_and_filters() {
        let bytes = FlushEx::builder()
            .merged()
            .progress(0, 1)
            .filter()
            .key_not("x")
            .build()
            .build()
            .build()
            .unwrap();
        let m = FlushExMatcher::builder()
            .merged()
            .progress(0, 1)
            .filter()
            .key_not("x")
            .build()
            .build()
            .build()
            .unwrap();
        assert!(m.is_match(&bytes));
    }

    #[test]
    fn unsupported_kind_is_a_decode_error() {
        let mut bytes = 5i32.to_le_bytes().to_vec();
        bytes.push(Kind::Meta.code());
        let m = FlushExMatcher::builder().type_id(5).build().unwrap();
        let err = m.matches(&mut ByteCursor::new(&bytes)).unwrap_err();
        assert!(matches!(
            err,
            MatchError::Decode {
                type_id: Some(5),
                kind: Some(3),
                ..
            }
        ));
    }
}
