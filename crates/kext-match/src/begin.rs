//! Begin frame matchers.

use kext_codec::begin::{
    BootstrapBeginEx, DescribeBeginEx, FetchBeginEx, MergedBeginEx, MetaBeginEx, ProduceBeginEx,
};
use kext_codec::{BeginBody, Filter, FilterBuilder, FilterTarget, Kind};
use kext_core::{Capabilities, CodecError, DeltaType, OffsetTriple, LATEST_OFFSET_DEFAULT};

use crate::expect::{self, Frozen};
use crate::matcher::{BodyMatcher, ExMatcher, MatcherBase};

/// Matches begin frames.
pub type BeginExMatcher = ExMatcher<BeginBodyMatcher>;

impl BeginExMatcher {
    /// Start building a begin frame matcher.
    pub fn builder() -> BeginExMatcherBuilder {
        BeginExMatcherBuilder::new()
    }
}

/// Expected begin body for one kind.
#[derive(Clone, Debug)]
pub enum BeginBodyMatcher {
    /// Bootstrap.
    Bootstrap(BootstrapBeginMatcher),
    /// Merged.
    Merged(MergedBeginMatcher),
    /// Fetch.
    Fetch(FetchBeginMatcher),
    /// Meta.
    Meta(MetaBeginMatcher),
    /// Describe.
    Describe(DescribeBeginMatcher),
    /// Produce.
    Produce(ProduceBeginMatcher),
}

impl BodyMatcher for BeginBodyMatcher {
    type Body = BeginBody;

    fn kind(&self) -> Kind {
        match self {
            Self::Bootstrap(_) => Kind::Bootstrap,
            Self::Merged(_) => Kind::Merged,
            Self::Fetch(_) => Kind::Fetch,
            Self::Meta(_) => Kind::Meta,
            Self::Describe(_) => Kind::Describe,
            Self::Produce(_) => Kind::Produce,
        }
    }

    fn check(&self, body: &BeginBody) -> Result<(), &'static str> {
        match (self, body) {
            (Self::Bootstrap(m), BeginBody::Bootstrap(b)) => m.check(b),
            (Self::Merged(m), BeginBody::Merged(b)) => m.check(b),
            (Self::Fetch(m), BeginBody::Fetch(b)) => m.check(b),
            (Self::Meta(m), BeginBody::Meta(b)) => m.check(b),
            (Self::Describe(m), BeginBody::Describe(b)) => m.check(b),
            (Self::Produce(m), BeginBody::Produce(b)) => m.check(b),
            _ => Err("kind"),
        }
    }
}

/// Expected bootstrap begin fields.
#[derive(Clone, Debug, Default)]
pub struct BootstrapBeginMatcher {
    topic: Option<String>,
}

impl BootstrapBeginMatcher {
    fn check(&self, b: &BootstrapBeginEx) -> Result<(), &'static str> {
        expect::eq("topic", &self.topic, &b.topic)
    }
}

/// Expected merged begin fields.
#[derive(Clone, Debug, Default)]
pub struct MergedBeginMatcher {
    capabilities: Option<Capabilities>,
    topic: Option<String>,
    partitions: Option<Frozen>,
    filters: Option<Frozen>,
    delta_type: Option<DeltaType>,
}

impl MergedBeginMatcher {
    fn check(&self, b: &MergedBeginEx) -> Result<(), &'static str> {
        expect::eq("capabilities", &self.capabilities, &b.capabilities)?;
        expect::eq("topic", &self.topic, &b.topic)?;
        expect::frozen("partitions", &self.partitions, &b.partitions)?;
        expect::frozen("filters", &self.filters, &b.filters)?;
        expect::eq("delta_type", &self.delta_type, &b.delta_type)
    }
}

/// Expected fetch begin fields.
#[derive(Clone, Debug, Default)]
pub struct FetchBeginMatcher {
    topic: Option<String>,
    partition: Option<Frozen>,
    filters: Option<Frozen>,
    delta_type: Option<DeltaType>,
}

impl FetchBeginMatcher {
    fn check(&self, b: &FetchBeginEx) -> Result<(), &'static str> {
        expect::eq("topic", &self.topic, &b.topic)?;
        expect::frozen("partition", &self.partition, &b.partition)?;
        expect::frozen("filters", &self.filters, &b.filters)?;
        expect::eq("delta_type", &self.delta_type, &b.delta_type)
    }
}

/// Expected meta begin fields.
#[derive(Clone, Debug, Default)]
pub struct MetaBeginMatcher {
    topic: Option<String>,
}

impl MetaBeginMatcher {
    fn check(&self, b: &MetaBeginEx) -> Result<(), &'static str> {
        expect::eq("topic", &self.topic, &b.topic)
    }
}

/// Expected describe begin fields.
#[derive(Clone, Debug, Default)]
pub struct DescribeBeginMatcher {
    topic: Option<String>,
    configs: Option<Vec<String>>,
}

impl DescribeBeginMatcher {
    fn check(&self, b: &DescribeBeginEx) -> Result<(), &'static str> {
        expect::eq("topic", &self.topic, &b.topic)?;
        expect::eq("configs", &self.configs, &b.configs)
    }
}

/// Expected produce begin fields.
#[derive(Clone, Debug, Default)]
pub struct ProduceBeginMatcher {
    transaction: Option<Option<String>>,
    producer_id: Option<i64>,
    topic: Option<String>,
    partition: Option<Frozen>,
}

impl ProduceBeginMatcher {
    fn check(&self, b: &ProduceBeginEx) -> Result<(), &'static str> {
        expect::eq("transaction", &self.transaction, &b.transaction)?;
        expect::eq("producer_id", &self.producer_id, &b.producer_id)?;
        expect::eq("topic", &self.topic, &b.topic)?;
        expect::frozen("partition", &self.partition, &b.partition)
    }
}

// ── Builders ────────────────────────────────────────────────────

/// Builds a [`BeginExMatcher`].
#[derive(Debug, Default)]
#[must_use = "call build() to create the matcher"]
pub struct BeginExMatcherBuilder {
    base: MatcherBase,
    body: Option<BeginBodyMatcher>,
}

impl BeginExMatcherBuilder {
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

    /// Expect a bootstrap body.
    pub fn bootstrap(self) -> BootstrapBeginMatcherBuilder {
        BootstrapBeginMatcherBuilder {
            parent: self,
            matcher: BootstrapBeginMatcher::default(),
        }
    }

    /// Expect a merged body.
    pub fn merged(self) -> MergedBeginMatcherBuilder {
        MergedBeginMatcherBuilder {
            parent: self,
            capabilities: None,
            topic: None,
            partitions: None,
            filters: None,
            delta_type: None,
        }
    }

    /// Expect a fetch body.
    pub fn fetch(self) -> FetchBeginMatcherBuilder {
        FetchBeginMatcherBuilder {
            parent: self,
            topic: None,
            partition: None,
            filters: None,
            delta_type: None,
        }
    }

    /// Expect a meta body.
    pub fn meta(self) -> MetaBeginMatcherBuilder {
        MetaBeginMatcherBuilder {
            parent: self,
            matcher: MetaBeginMatcher::default(),
        }
    }

    /// Expect a describe body.
    pub fn describe(self) -> DescribeBeginMatcherBuilder {
        DescribeBeginMatcherBuilder {
            parent: self,
            matcher: DescribeBeginMatcher::default(),
        }
    }

    /// Expect a produce body.
    pub fn produce(self) -> ProduceBeginMatcherBuilder {
        ProduceBeginMatcherBuilder {
            parent: self,
            transaction: None,
            producer_id: None,
            topic: None,
            partition: None,
        }
    }

    fn with_body(mut self, body: BeginBodyMatcher) -> Self {
        self.body = Some(body);
        self
    }

    /// Freeze composite expectations and create the matcher.
    pub fn build(self) -> Result<BeginExMatcher, CodecError> {
        self.base.finish(self.body)
    }
}

/// Bootstrap begin expectations.
#[derive(Debug)]
#[must_use = "call build() to return to the matcher builder"]
pub struct BootstrapBeginMatcherBuilder {
    parent: BeginExMatcherBuilder,
    matcher: BootstrapBeginMatcher,
}

impl BootstrapBeginMatcherBuilder {
    /// Expect this topic.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.matcher.topic = Some(topic.into());
        self
    }

    /// Return to the matcher builder.
    pub fn build(self) -> BeginExMatcherBuilder {
        self.parent
            .with_body(BeginBodyMatcher::Bootstrap(self.matcher))
    }
}

/// Merged begin expectations.
#[derive(Debug)]
#[must_use = "call build() to return to the matcher builder"]
pub struct MergedBeginMatcherBuilder {
    parent: BeginExMatcherBuilder,
    capabilities: Option<Capabilities>,
    topic: Option<String>,
    partitions: Option<Vec<OffsetTriple>>,
    filters: Option<Vec<Filter>>,
    delta_type: Option<DeltaType>,
}

impl MergedBeginMatcherBuilder {
    /// Expect capabilities, given by name.
    pub fn capabilities(mut self, name: &str) -> Result<Self, CodecError> {
        self.capabilities = Some(name.parse()?);
        Ok(self)
    }

    /// Expect this topic.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Expect this partition next, with the default latest offset.
    pub fn partition(self, partition_id: i32, partition_offset: i64) -> Self {
        self.partition_with_latest(partition_id, partition_offset, LATEST_OFFSET_DEFAULT)
    }

    /// Expect this partition next.
    pub fn partition_with_latest(
        mut self,
        partition_id: i32,
        partition_offset: i64,
        latest_offset: i64,
    ) -> Self {
        self.partitions
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

    /// Expect a delta type, given by name.
    pub fn delta_type(mut self, name: &str) -> Result<Self, CodecError> {
        self.delta_type = Some(name.parse()?);
        Ok(self)
    }

    /// Return to the matcher builder.
    pub fn build(mut self) -> BeginExMatcherBuilder {
        let base = &mut self.parent.base;
        let matcher = MergedBeginMatcher {
            capabilities: self.capabilities,
            topic: self.topic,
            partitions: base.freeze(self.partitions.as_ref()),
            filters: base.freeze(self.filters.as_ref()),
            delta_type: self.delta_type,
        };
        self.parent.with_body(BeginBodyMatcher::Merged(matcher))
    }
}

impl FilterTarget for MergedBeginMatcherBuilder {
    fn push_filter(&mut self, filter: Filter) {
        self.filters.get_or_insert_with(Vec::new).push(filter);
    }

    fn record_error(&mut self, error: CodecError) {
        self.parent.base.record(error);
    }
}

/// Fetch begin expectations.
#[derive(Debug)]
#[must_use = "call build() to return to the matcher builder"]
pub struct FetchBeginMatcherBuilder {
    parent: BeginExMatcherBuilder,
    topic: Option<String>,
    partition: Option<OffsetTriple>,
    filters: Option<Vec<Filter>>,
    delta_type: Option<DeltaType>,
}

impl FetchBeginMatcherBuilder {
    /// Expect this topic.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

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

    /// Expect this filter next; its `build()` returns here.
    pub fn filter(self) -> FilterBuilder<Self> {
        FilterBuilder::new(self)
    }

    /// Expect a delta type, given by name.
    pub fn delta_type(mut self, name: &str) -> Result<Self, CodecError> {
        self.delta_type = Some(name.parse()?);
        Ok(self)
    }

    /// Return to the matcher builder.
    pub fn build(mut self) -> BeginExMatcherBuilder {
        let base = &mut self.parent.base;
        let matcher = FetchBeginMatcher {
            topic: self.topic,
            partition: base.freeze(self.partition.as_ref()),
            filters: base.freeze(self.filters.as_ref()),
            delta_type: self.delta_type,
        };
        self.parent.with_body(BeginBodyMatcher::Fetch(matcher))
    }
}

impl FilterTarget for FetchBeginMatcherBuilder {
    fn push_filter(&mut self, filter: Filter) {
        self.filters.get_or_insert_with(Vec::new).push(filter);
    }

    fn record_error(&mut self, error: CodecError) {
        self.parent.base.record(error);
    }
}

/// Meta begin expectations.
#[derive(Debug)]
#[must_use = "call build() to return to the matcher builder"]
pub struct MetaBeginMatcherBuilder {
    parent: BeginExMatcherBuilder,
    matcher: MetaBeginMatcher,
}

impl MetaBeginMatcherBuilder {
    /// Expect this topic.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.matcher.topic = Some(topic.into());
        self
    }

    /// Return to the matcher builder.
    pub fn build(self) -> BeginExMatcherBuilder {
        self.parent.with_body(BeginBodyMatcher::Meta(self.matcher))
    }
}

/// Describe begin expectations.
#[derive(Debug)]
#[must_use = "call build() to return to the matcher builder"]
pub struct DescribeBeginMatcherBuilder {
    parent: BeginExMatcherBuilder,
    matcher: DescribeBeginMatcher,
}

impl DescribeBeginMatcherBuilder {
    /// Expect this topic.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.matcher.topic = Some(topic.into());
        self
    }

    /// Expect this configuration name next.
    pub fn config(mut self, name: impl Into<String>) -> Self {
        self.matcher
            .configs
            .get_or_insert_with(Vec::new)
            .push(name.into());
        self
    }

    /// Return to the matcher builder.
    pub fn build(self) -> BeginExMatcherBuilder {
        self.parent
            .with_body(BeginBodyMatcher::Describe(self.matcher))
    }
}

/// Produce begin expectations.
#[derive(Debug)]
#[must_use = "call build() to return to the matcher builder"]
pub struct ProduceBeginMatcherBuilder {
    parent: BeginExMatcherBuilder,
    transaction: Option<Option<String>>,
    producer_id: Option<i64>,
    topic: Option<String>,
    partition: Option<OffsetTriple>,
}

impl ProduceBeginMatcherBuilder {
    /// Expect this transaction id; `None` expects a null transaction.
    pub fn transaction(mut self, transaction: Option<&str>) -> Self {
        self.transaction = Some(transaction.map(str::to_owned));
        self
    }

    /// Expect this producer id.
    pub fn producer_id(mut self, producer_id: i64) -> Self {
        self.producer_id = Some(producer_id);
        self
    }

    /// Expect this topic.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

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
    pub fn build(mut self) -> BeginExMatcherBuilder {
        let partition = self.parent.base.freeze(self.partition.as_ref());
        let matcher = ProduceBeginMatcher {
            transaction: self.transaction,
            producer_id: self.producer_id,
            topic: self.topic,
            partition,
        };
        self.parent.with_body(BeginBodyMatcher::Produce(matcher))
    }
}
