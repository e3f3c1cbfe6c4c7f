//! Data frame matchers.

use bytes::Bytes;
use indexmap::IndexMap;

use kext_codec::data::{DescribeDataEx, FetchDataEx, MergedDataEx, MetaDataEx, ProduceDataEx};
use kext_codec::{DataBody, Kind, PartitionLeader};
use kext_core::{
    CodecError, Delta, DeltaType, Header, NullableBytes, OffsetTriple, LATEST_OFFSET_DEFAULT,
};

use crate::expect::{self, Frozen};
use crate::matcher::{BodyMatcher, ExMatcher, MatcherBase};

/// Matches data frames.
pub type DataExMatcher = ExMatcher<DataBodyMatcher>;

impl DataExMatcher {
    /// Start building a data frame matcher.
    pub fn builder() -> DataExMatcherBuilder {
        DataExMatcherBuilder::new()
    }
}

/// Expected data body for one kind.
#[derive(Clone, Debug)]
pub enum DataBodyMatcher {
    /// Merged.
    Merged(MergedDataMatcher),
    /// Fetch.
    Fetch(FetchDataMatcher),
    /// Meta.
    Meta(MetaDataMatcher),
    /// Describe.
    Describe(DescribeDataMatcher),
    /// Produce.
    Produce(ProduceDataMatcher),
}

impl BodyMatcher for DataBodyMatcher {
    type Body = DataBody;

    fn kind(&self) -> Kind {
        match self {
            Self::Merged(_) => Kind::Merged,
            Self::Fetch(_) => Kind::Fetch,
            Self::Meta(_) => Kind::Meta,
            Self::Describe(_) => Kind::Describe,
            Self::Produce(_) => Kind::Produce,
        }
    }

    fn check(&self, body: &DataBody) -> Result<(), &'static str> {
        match (self, body) {
            (Self::Merged(m), DataBody::Merged(b)) => m.check(b),
            (Self::Fetch(m), DataBody::Fetch(b)) => m.check(b),
            (Self::Meta(m), DataBody::Meta(b)) => m.check(b),
            (Self::Describe(m), DataBody::Describe(b)) => m.check(b),
            (Self::Produce(m), DataBody::Produce(b)) => m.check(b),
            _ => Err("kind"),
        }
    }
}

/// Expected fetch data fields.
#[derive(Clone, Debug, Default)]
pub struct FetchDataMatcher {
    deferred: Option<i32>,
    timestamp: Option<i64>,
    filters: Option<i64>,
    partition: Option<Frozen>,
    key: Option<Frozen>,
    delta: Option<Frozen>,
    headers: Option<Frozen>,
}

impl FetchDataMatcher {
    fn check(&self, b: &FetchDataEx) -> Result<(), &'static str> {
        expect::eq("deferred", &self.deferred, &b.deferred)?;
        expect::eq("timestamp", &self.timestamp, &b.timestamp)?;
        expect::eq("filters", &self.filters, &b.filters)?;
        expect::frozen("partition", &self.partition, &b.partition)?;
        expect::frozen("key", &self.key, &b.key)?;
        expect::frozen("delta", &self.delta, &b.delta)?;
        expect::frozen("headers", &self.headers, &b.headers)
    }
}

/// Expected merged data fields.
#[derive(Clone, Debug, Default)]
pub struct MergedDataMatcher {
    deferred: Option<i32>,
    timestamp: Option<i64>,
    filters: Option<i64>,
    partition: Option<Frozen>,
    progress: Option<Frozen>,
    key: Option<Frozen>,
    delta: Option<Frozen>,
    headers: Option<Frozen>,
}

impl MergedDataMatcher {
    fn check(&self, b: &MergedDataEx) -> Result<(), &'static str> {
        expect::eq("deferred", &self.deferred, &b.deferred)?;
        expect::eq("timestamp", &self.timestamp, &b.timestamp)?;
        expect::eq("filters", &self.filters, &b.filters)?;
        expect::frozen("partition", &self.partition, &b.partition)?;
        expect::frozen("progress", &self.progress, &b.progress)?;
        expect::frozen("key", &self.key, &b.key)?;
        expect::frozen("delta", &self.delta, &b.delta)?;
        expect::frozen("headers", &self.headers, &b.headers)
    }
}

/// Expected meta data fields.
#[derive(Clone, Debug, Default)]
pub struct MetaDataMatcher {
    partitions: Option<Frozen>,
}

impl MetaDataMatcher {
    fn check(&self, b: &MetaDataEx) -> Result<(), &'static str> {
        expect::frozen("partitions", &self.partitions, &b.partitions)
    }
}

/// Expected describe data fields.
#[derive(Clone, Debug, Default)]
pub struct DescribeDataMatcher {
    configs: Option<IndexMap<String, String>>,
}

impl DescribeDataMatcher {
    fn check(&self, b: &DescribeDataEx) -> Result<(), &'static str> {
        match &self.configs {
            // Order is part of the wire form, so compare entry by entry.
            Some(expected) if !expected.iter().eq(b.configs.iter()) => Err("configs"),
            _ => Ok(()),
        }
    }
}

/// Expected produce data fields.
#[derive(Clone, Debug, Default)]
pub struct ProduceDataMatcher {
    deferred: Option<i32>,
    timestamp: Option<i64>,
    sequence: Option<i32>,
    key: Option<Frozen>,
    headers: Option<Frozen>,
}

impl ProduceDataMatcher {
    fn check(&self, b: &ProduceDataEx) -> Result<(), &'static str> {
        expect::eq("deferred", &self.deferred, &b.deferred)?;
        expect::eq("timestamp", &self.timestamp, &b.timestamp)?;
        expect::eq("sequence", &self.sequence, &b.sequence)?;
        expect::frozen("key", &self.key, &b.key)?;
        expect::frozen("headers", &self.headers, &b.headers)
    }
}

// ── Builders ────────────────────────────────────────────────────

/// Builds a [`DataExMatcher`].
#[derive(Debug, Default)]
#[must_use = "call build() to create the matcher"]
pub struct DataExMatcherBuilder {
    base: MatcherBase,
    body: Option<DataBodyMatcher>,
}

impl DataExMatcherBuilder {
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
    pub fn merged(self) -> MergedDataMatcherBuilder {
        MergedDataMatcherBuilder {
            parent: self,
            fields: MergedDataFields::default(),
        }
    }

    /// Expect a fetch body.
    pub fn fetch(self) -> FetchDataMatcherBuilder {
        FetchDataMatcherBuilder {
            parent: self,
            fields: FetchDataFields::default(),
        }
    }

    /// Expect a meta body.
    pub fn meta(self) -> MetaDataMatcherBuilder {
        MetaDataMatcherBuilder {
            parent: self,
            partitions: None,
        }
    }

    /// Expect a describe body.
    pub fn describe(self) -> DescribeDataMatcherBuilder {
        DescribeDataMatcherBuilder {
            parent: self,
            configs: None,
        }
    }

    /// Expect a produce body.
    pub fn produce(self) -> ProduceDataMatcherBuilder {
        ProduceDataMatcherBuilder {
            parent: self,
            fields: ProduceDataFields::default(),
        }
    }

    fn with_body(mut self, body: DataBodyMatcher) -> Self {
        self.body = Some(body);
        self
    }

    /// Freeze composite expectations and create the matcher.
    pub fn build(self) -> Result<DataExMatcher, CodecError> {
        self.base.finish(self.body)
    }
}

#[derive(Debug, Default)]
struct FetchDataFields {
    deferred: Option<i32>,
    timestamp: Option<i64>,
    filters: Option<i64>,
    partition: Option<OffsetTriple>,
    key: Option<NullableBytes>,
    delta: Option<Delta>,
    headers: Option<Vec<Header>>,
}

/// Fetch data expectations.
#[derive(Debug)]
#[must_use = "call build() to return to the matcher builder"]
pub struct FetchDataMatcherBuilder {
    parent: DataExMatcherBuilder,
    fields: FetchDataFields,
}

impl FetchDataMatcherBuilder {
    /// Expect this deferred value length.
    pub fn deferred(mut self, deferred: i32) -> Self {
        self.fields.deferred = Some(deferred);
        self
    }

    /// Expect this timestamp.
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.fields.timestamp = Some(timestamp);
        self
    }

    /// Expect this matched-filter bit set.
    pub fn filters(mut self, filters: i64) -> Self {
        self.fields.filters = Some(filters);
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
        self.fields.partition = Some(OffsetTriple::with_latest(
            partition_id,
            partition_offset,
            latest_offset,
        ));
        self
    }

    /// Expect this key.
    pub fn key(mut self, key: impl Into<NullableBytes>) -> Self {
        self.fields.key = Some(key.into());
        self
    }

    /// Expect this delta, with the type given by name.
    pub fn delta(mut self, delta_type: &str, ancestor_offset: i64) -> Result<Self, CodecError> {
        self.fields.delta = Some(Delta::new(delta_type.parse::<DeltaType>()?, ancestor_offset));
        Ok(self)
    }

    /// Expect this header next. Once any header is given the full list
    /// must match.
    pub fn header(mut self, name: impl AsRef<[u8]>, value: impl Into<NullableBytes>) -> Self {
        self.fields
            .headers
            .get_or_insert_with(Vec::new)
            .push(Header::new(name, value));
        self
    }

    /// Return to the matcher builder.
    pub fn build(mut self) -> DataExMatcherBuilder {
        let f = self.fields;
        let base = &mut self.parent.base;
        let matcher = FetchDataMatcher {
            deferred: f.deferred,
            timestamp: f.timestamp,
            filters: f.filters,
            partition: base.freeze(f.partition.as_ref()),
            key: base.freeze(f.key.as_ref()),
            delta: base.freeze(f.delta.as_ref()),
            headers: base.freeze(f.headers.as_ref()),
        };
        self.parent.with_body(DataBodyMatcher::Fetch(matcher))
    }
}

#[derive(Debug, Default)]
struct MergedDataFields {
    deferred: Option<i32>,
    timestamp: Option<i64>,
    filters: Option<i64>,
    partition: Option<OffsetTriple>,
    progress: Option<Vec<OffsetTriple>>,
    key: Option<NullableBytes>,
    delta: Option<Delta>,
    headers: Option<Vec<Header>>,
}

/// Merged data expectations.
#[derive(Debug)]
#[must_use = "call build() to return to the matcher builder"]
pub struct MergedDataMatcherBuilder {
    parent: DataExMatcherBuilder,
    fields: MergedDataFields,
}

impl MergedDataMatcherBuilder {
    /// Expect this deferred value length.
    pub fn deferred(mut self, deferred: i32) -> Self {
        self.fields.deferred = Some(deferred);
        self
    }

    /// Expect this timestamp.
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.fields.timestamp = Some(timestamp);
        self
    }

    /// Expect this matched-filter bit set.
    pub fn filters(mut self, filters: i64) -> Self {
        self.fields.filters = Some(filters);
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
        self.fields.partition = Some(OffsetTriple::with_latest(
            partition_id,
            partition_offset,
            latest_offset,
        ));
        self
    }

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
        self.fields
            .progress
            .get_or_insert_with(Vec::new)
            .push(OffsetTriple::with_latest(
                partition_id,
                partition_offset,
                latest_offset,
            ));
        self
    }

    /// Expect this key.
    pub fn key(mut self, key: impl Into<NullableBytes>) -> Self {
        self.fields.key = Some(key.into());
        self
    }

    /// Expect this delta, with the type given by name.
    pub fn delta(mut self, delta_type: &str, ancestor_offset: i64) -> Result<Self, CodecError> {
        self.fields.delta = Some(Delta::new(delta_type.parse::<DeltaType>()?, ancestor_offset));
        Ok(self)
    }

    /// Expect this header next.
    pub fn header(mut self, name: impl AsRef<[u8]>, value: impl Into<NullableBytes>) -> Self {
        self.fields
            .headers
            .get_or_insert_with(Vec::new)
            .push(Header::new(name, value));
        self
    }

    /// Expect a header whose value is one byte.
    pub fn header_byte(self, name: impl AsRef<[u8]>, value: i8) -> Self {
        self.header(name, Bytes::copy_from_slice(&value.to_le_bytes()))
    }

    /// Expect a header whose value is a little-endian i16.
    pub fn header_short(self, name: impl AsRef<[u8]>, value: i16) -> Self {
        self.header(name, Bytes::copy_from_slice(&value.to_le_bytes()))
    }

    /// Expect a header whose value is a little-endian i32.
    pub fn header_int(self, name: impl AsRef<[u8]>, value: i32) -> Self {
        self.header(name, Bytes::copy_from_slice(&value.to_le_bytes()))
    }

    /// Expect a header whose value is a little-endian i64.
    pub fn header_long(self, name: impl AsRef<[u8]>, value: i64) -> Self {
        self.header(name, Bytes::copy_from_slice(&value.to_le_bytes()))
    }

    /// Expect a header with a null value.
    pub fn header_null(self, name: impl AsRef<[u8]>) -> Self {
        self.header(name, NullableBytes::null())
    }

    /// Return to the matcher builder.
    pub fn build(mut self) -> DataExMatcherBuilder {
        let f = self.fields;
        let base = &mut self.parent.base;
        let matcher = MergedDataMatcher {
            deferred: f.deferred,
            timestamp: f.timestamp,
            filters: f.filters,
            partition: base.freeze(f.partition.as_ref()),
            progress: base.freeze(f.progress.as_ref()),
            key: base.freeze(f.key.as_ref()),
            delta: base.freeze(f.delta.as_ref()),
            headers: base.freeze(f.headers.as_ref()),
        };
        self.parent.with_body(DataBodyMatcher::Merged(matcher))
    }
}

/// Meta data expectations.
#[derive(Debug)]
#[must_use = "call build() to return to the matcher builder"]
pub struct MetaDataMatcherBuilder {
    parent: DataExMatcherBuilder,
    partitions: Option<Vec<PartitionLeader>>,
}

impl MetaDataMatcherBuilder {
    /// Expect this partition and leader next.
    pub fn partition(mut self, partition_id: i32, leader_id: i32) -> Self {
        self.partitions
            .get_or_insert_with(Vec::new)
            .push(PartitionLeader {
                partition_id,
                leader_id,
            });
        self
    }

    /// Return to the matcher builder.
    pub fn build(mut self) -> DataExMatcherBuilder {
        let partitions = self.parent.base.freeze(self.partitions.as_ref());
        self.parent
            .with_body(DataBodyMatcher::Meta(MetaDataMatcher { partitions }))
    }
}

/// Describe data expectations.
#[derive(Debug)]
#[must_use = "call build() to return to the matcher builder"]
pub struct DescribeDataMatcherBuilder {
    parent: DataExMatcherBuilder,
    configs: Option<IndexMap<String, String>>,
}

impl DescribeDataMatcherBuilder {
    /// Expect this configuration entry next.
    ///
    /// Names are unique; repeating one fails the matcher build with
    /// [`CodecError::DuplicateName`].
    pub fn config(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let configs = self.configs.get_or_insert_with(IndexMap::new);
        if configs.contains_key(&name) {
            self.parent.base.record(CodecError::DuplicateName {
                field: "configs",
                name,
            });
        } else {
            configs.insert(name, value.into());
        }
        self
    }

    /// Return to the matcher builder.
    pub fn build(self) -> DataExMatcherBuilder {
        self.parent
            .with_body(DataBodyMatcher::Describe(DescribeDataMatcher {
                configs: self.configs,
            }))
    }
}

#[derive(Debug, Default)]
struct ProduceDataFields {
    deferred: Option<i32>,
    timestamp: Option<i64>,
    sequence: Option<i32>,
    key: Option<NullableBytes>,
    headers: Option<Vec<Header>>,
}

/// Produce data expectations.
#[derive(Debug)]
#[must_use = "call build() to return to the matcher builder"]
pub struct ProduceDataMatcherBuilder {
    parent: DataExMatcherBuilder,
    fields: ProduceDataFields,
}

impl ProduceDataMatcherBuilder {
    /// Expect this deferred value length.
    pub fn deferred(mut self, deferred: i32) -> Self {
        self.fields.deferred = Some(deferred);
        self
    }

    /// Expect this timestamp.
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.fields.timestamp = Some(timestamp);
        self
    }

    /// Expect this producer sequence number.
    pub fn sequence(mut self, sequence: i32) -> Self {
        self.fields.sequence = Some(sequence);
        self
    }

    /// Expect this key.
    pub fn key(mut self, key: impl Into<NullableBytes>) -> Self {
        self.fields.key = Some(key.into());
        self
    }

    /// Expect this header next.
    pub fn header(mut self, name: impl AsRef<[u8]>, value: impl Into<NullableBytes>) -> Self {
        self.fields
            .headers
            .get_or_insert_with(Vec::new)
            .push(Header::new(name, value));
        self
    }

    /// Return to the matcher builder.
    pub fn build(mut self) -> DataExMatcherBuilder {
        let f = self.fields;
        let base = &mut self.parent.base;
        let matcher = ProduceDataMatcher {
            deferred: f.deferred,
            timestamp: f.timestamp,
            sequence: f.sequence,
            key: base.freeze(f.key.as_ref()),
            headers: base.freeze(f.headers.as_ref()),
        };
        self.parent.with_body(DataBodyMatcher::Produce(matcher))
    }
}
