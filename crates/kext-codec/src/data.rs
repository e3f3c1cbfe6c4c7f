//! Data extension frames.
//!
//! # Body layouts
//!
//! ```text
//! fetch    := i32 deferred, i64 timestamp, i64 filters, offset_triple partition,
//!             nullable_bytes32 key, delta, array32<header> headers
//! merged   := i32 deferred, i64 timestamp, i64 filters, offset_triple partition,
//!             array32<offset_triple> progress, nullable_bytes32 key, delta,
//!             array32<header> headers
//! meta     := array32<partition_leader> partitions
//! describe := array32<string16 name, string16 value> configs
//! produce  := i32 deferred, i64 timestamp, i32 sequence, nullable_bytes32 key,
//!             array32<header> headers
//! ```

use bytes::Bytes;
use indexmap::IndexMap;

use kext_core::{
    CodecConfig, CodecError, DecodeError, Delta, DeltaType, FrameReader, FrameWriter, Header,
    NullableBytes, OffsetTriple, WireDecode, WireEncode, LATEST_OFFSET_DEFAULT,
};

use crate::frame::{Frame, FrameBase, FrameBody};
use crate::kind::{Event, Kind};

/// A data extension frame.
pub type DataEx = Frame<DataBody>;

// ── Bodies ──────────────────────────────────────────────────────

/// Leader of one partition, as reported by meta data frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PartitionLeader {
    /// Partition id.
    pub partition_id: i32,
    /// Broker id of the leader.
    pub leader_id: i32,
}

impl WireEncode for PartitionLeader {
    fn encode(&self, w: &mut FrameWriter) -> Result<(), CodecError> {
        w.put_i32(self.partition_id)?;
        w.put_i32(self.leader_id)
    }
}

impl WireDecode for PartitionLeader {
    fn decode(r: &mut FrameReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            partition_id: r.get_i32()?,
            leader_id: r.get_i32()?,
        })
    }
}

/// Fetch data body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchDataEx {
    /// Bytes of the record value still to come in later frames.
    pub deferred: i32,
    /// Record timestamp.
    pub timestamp: i64,
    /// Bit set of the begin filters the record matched.
    pub filters: i64,
    /// Position of the record.
    pub partition: OffsetTriple,
    /// Record key.
    pub key: NullableBytes,
    /// Value delta descriptor.
    pub delta: Delta,
    /// Record headers.
    pub headers: Vec<Header>,
}

/// Merged data body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergedDataEx {
    /// Bytes of the record value still to come in later frames.
    pub deferred: i32,
    /// Record timestamp.
    pub timestamp: i64,
    /// Bit set of the begin filters the record matched.
    pub filters: i64,
    /// Position of the record.
    pub partition: OffsetTriple,
    /// Progress across every partition of the topic.
    pub progress: Vec<OffsetTriple>,
    /// Record key.
    pub key: NullableBytes,
    /// Value delta descriptor.
    pub delta: Delta,
    /// Record headers.
    pub headers: Vec<Header>,
}

/// Meta data body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetaDataEx {
    /// Leader per partition.
    pub partitions: Vec<PartitionLeader>,
}

/// Describe data body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DescribeDataEx {
    /// Configuration entries in wire order.
    pub configs: IndexMap<String, String>,
}

/// Produce data body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProduceDataEx {
    /// Bytes of the record value still to come in later frames.
    pub deferred: i32,
    /// Record timestamp.
    pub timestamp: i64,
    /// Producer sequence number; `-1` when unassigned.
    pub sequence: i32,
    /// Record key.
    pub key: NullableBytes,
    /// Record headers.
    pub headers: Vec<Header>,
}

impl Default for ProduceDataEx {
    fn default() -> Self {
        Self {
            deferred: 0,
            timestamp: 0,
            sequence: -1,
            key: NullableBytes::null(),
            headers: Vec::new(),
        }
    }
}

/// Data body for each kind. Bootstrap frames carry no data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataBody {
    /// Merged.
    Merged(MergedDataEx),
    /// Fetch.
    Fetch(FetchDataEx),
    /// Meta.
    Meta(MetaDataEx),
    /// Describe.
    Describe(DescribeDataEx),
    /// Produce.
    Produce(ProduceDataEx),
}

impl WireEncode for DataBody {
    fn encode(&self, w: &mut FrameWriter) -> Result<(), CodecError> {
        match self {
            Self::Fetch(b) => {
                w.put_i32(b.deferred)?;
                w.put_i64(b.timestamp)?;
                w.put_i64(b.filters)?;
                b.partition.encode(w)?;
                b.key.encode(w)?;
                b.delta.encode(w)?;
                w.put_array32(&b.headers)
            }
            Self::Merged(b) => {
                w.put_i32(b.deferred)?;
                w.put_i64(b.timestamp)?;
                w.put_i64(b.filters)?;
                b.partition.encode(w)?;
                w.put_array32(&b.progress)?;
                b.key.encode(w)?;
                b.delta.encode(w)?;
                w.put_array32(&b.headers)
            }
            Self::Meta(b) => w.put_array32(&b.partitions),
            Self::Describe(b) => {
                let entries: Vec<(&String, &String)> = b.configs.iter().collect();
                w.put_array32_with(&entries, |w, (name, value)| {
                    w.put_string16(Some(name.as_str()))?;
                    w.put_string16(Some(value.as_str()))
                })
            }
            Self::Produce(b) => {
                w.put_i32(b.deferred)?;
                w.put_i64(b.timestamp)?;
                w.put_i32(b.sequence)?;
                b.key.encode(w)?;
                w.put_array32(&b.headers)
            }
        }
    }
}

impl FrameBody for DataBody {
    const EVENT: Event = Event::Data;

    fn kind(&self) -> Kind {
        match self {
            Self::Merged(_) => Kind::Merged,
            Self::Fetch(_) => Kind::Fetch,
            Self::Meta(_) => Kind::Meta,
            Self::Describe(_) => Kind::Describe,
            Self::Produce(_) => Kind::Produce,
        }
    }

    fn decode_body(kind: Kind, r: &mut FrameReader<'_>) -> Result<Self, DecodeError> {
        Ok(match kind {
            Kind::Fetch => Self::Fetch(FetchDataEx {
                deferred: r.get_i32()?,
                timestamp: r.get_i64()?,
                filters: r.get_i64()?,
                partition: OffsetTriple::decode(r)?,
                key: NullableBytes::decode(r)?,
                delta: Delta::decode(r)?,
                headers: r.get_array32("headers")?,
            }),
            Kind::Merged => Self::Merged(MergedDataEx {
                deferred: r.get_i32()?,
                timestamp: r.get_i64()?,
                filters: r.get_i64()?,
                partition: OffsetTriple::decode(r)?,
                progress: r.get_array32("progress")?,
                key: NullableBytes::decode(r)?,
                delta: Delta::decode(r)?,
                headers: r.get_array32("headers")?,
            }),
            Kind::Meta => Self::Meta(MetaDataEx {
                partitions: r.get_array32("partitions")?,
            }),
            Kind::Describe => {
                let entries = r.get_array32_with("configs", |r| {
                    Ok((
                        r.offset(),
                        r.get_string16_non_null("config name")?,
                        r.get_string16_non_null("config value")?,
                    ))
                })?;
                let mut configs = IndexMap::with_capacity(entries.len());
                for (offset, name, value) in entries {
                    if configs.contains_key(&name) {
                        return Err(DecodeError::DuplicateName {
                            field: "configs",
                            name,
                            offset,
                        });
                    }
                    configs.insert(name, value);
                }
                Self::Describe(DescribeDataEx { configs })
            }
            Kind::Produce => Self::Produce(ProduceDataEx {
                deferred: r.get_i32()?,
                timestamp: r.get_i64()?,
                sequence: r.get_i32()?,
                key: NullableBytes::decode(r)?,
                headers: r.get_array32("headers")?,
            }),
            Kind::Bootstrap => {
                return Err(DecodeError::UnsupportedKind {
                    event: Event::Data.as_str(),
                    kind: kind.code(),
                })
            }
        })
    }
}

// ── Builders ────────────────────────────────────────────────────

impl DataEx {
    /// Start building a data frame with the default [`CodecConfig`].
    pub fn builder() -> DataExBuilder {
        DataExBuilder::new()
    }
}

/// Builds one data frame.
#[derive(Debug)]
#[must_use = "call build() to encode the frame"]
pub struct DataExBuilder {
    base: FrameBase,
    body: Option<DataBody>,
}

impl Default for DataExBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DataExBuilder {
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
    pub fn merged(self) -> MergedDataBuilder {
        MergedDataBuilder {
            parent: self,
            body: MergedDataEx::default(),
        }
    }

    /// Select the fetch kind.
    pub fn fetch(self) -> FetchDataBuilder {
        FetchDataBuilder {
            parent: self,
            body: FetchDataEx::default(),
        }
    }

    /// Select the meta kind.
    pub fn meta(self) -> MetaDataBuilder {
        MetaDataBuilder {
            parent: self,
            body: MetaDataEx::default(),
        }
    }

    /// Select the describe kind.
    pub fn describe(self) -> DescribeDataBuilder {
        DescribeDataBuilder {
            parent: self,
            body: DescribeDataEx::default(),
        }
    }

    /// Select the produce kind.
    pub fn produce(self) -> ProduceDataBuilder {
        ProduceDataBuilder {
            parent: self,
            body: ProduceDataEx::default(),
        }
    }

    fn with_body(mut self, body: DataBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Encode the frame.
    pub fn build(self) -> Result<Bytes, CodecError> {
        self.base.finish(self.body)
    }
}

/// Fetch data fields.
#[derive(Debug)]
#[must_use = "call build() to return to the frame builder"]
pub struct FetchDataBuilder {
    parent: DataExBuilder,
    body: FetchDataEx,
}

impl FetchDataBuilder {
    /// Set the deferred value length.
    pub fn deferred(mut self, deferred: i32) -> Self {
        self.body.deferred = deferred;
        self
    }

    /// Set the record timestamp.
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.body.timestamp = timestamp;
        self
    }

    /// Set the matched-filter bit set.
    pub fn filters(mut self, filters: i64) -> Self {
        self.body.filters = filters;
        self
    }

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

    /// Set the record key.
    pub fn key(mut self, key: impl Into<NullableBytes>) -> Self {
        self.body.key = key.into();
        self
    }

    /// Set the delta by type name and ancestor offset.
    pub fn delta(mut self, delta_type: &str, ancestor_offset: i64) -> Result<Self, CodecError> {
        self.body.delta = Delta::new(delta_type.parse::<DeltaType>()?, ancestor_offset);
        Ok(self)
    }

    /// Append a header.
    pub fn header(mut self, name: impl AsRef<[u8]>, value: impl Into<NullableBytes>) -> Self {
        self.body.headers.push(Header::new(name, value));
        self
    }

    /// Return to the frame builder.
    pub fn build(self) -> DataExBuilder {
        self.parent.with_body(DataBody::Fetch(self.body))
    }
}

/// Merged data fields.
#[derive(Debug)]
#[must_use = "call build() to return to the frame builder"]
pub struct MergedDataBuilder {
    parent: DataExBuilder,
    body: MergedDataEx,
}

impl MergedDataBuilder {
    /// Set the deferred value length.
    pub fn deferred(mut self, deferred: i32) -> Self {
        self.body.deferred = deferred;
        self
    }

    /// Set the record timestamp.
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.body.timestamp = timestamp;
        self
    }

    /// Set the matched-filter bit set.
    pub fn filters(mut self, filters: i64) -> Self {
        self.body.filters = filters;
        self
    }

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

    /// Set the record key.
    pub fn key(mut self, key: impl Into<NullableBytes>) -> Self {
        self.body.key = key.into();
        self
    }

    /// Set the delta by type name and ancestor offset.
    pub fn delta(mut self, delta_type: &str, ancestor_offset: i64) -> Result<Self, CodecError> {
        self.body.delta = Delta::new(delta_type.parse::<DeltaType>()?, ancestor_offset);
        Ok(self)
    }

    /// Append a header.
    pub fn header(mut self, name: impl AsRef<[u8]>, value: impl Into<NullableBytes>) -> Self {
        self.body.headers.push(Header::new(name, value));
        self
    }

    /// Append a header whose value is one byte.
    pub fn header_byte(self, name: impl AsRef<[u8]>, value: i8) -> Self {
        self.header(name, Bytes::copy_from_slice(&value.to_le_bytes()))
    }

    /// Append a header whose value is a little-endian i16.
    pub fn header_short(self, name: impl AsRef<[u8]>, value: i16) -> Self {
        self.header(name, Bytes::copy_from_slice(&value.to_le_bytes()))
    }

    /// Append a header whose value is a little-endian i32.
    pub fn header_int(self, name: impl AsRef<[u8]>, value: i32) -> Self {
        self.header(name, Bytes::copy_from_slice(&value.to_le_bytes()))
    }

    /// Append a header whose value is a little-endian i64.
    pub fn header_long(self, name: impl AsRef<[u8]>, value: i64) -> Self {
        self.header(name, Bytes::copy_from_slice(&value.to_le_bytes()))
    }

    /// Append a header with raw bytes as its value.
    pub fn header_bytes(self, name: impl AsRef<[u8]>, value: &[u8]) -> Self {
        self.header(name, value)
    }

    /// Append a header with a null value.
    pub fn header_null(self, name: impl AsRef<[u8]>) -> Self {
        self.header(name, NullableBytes::null())
    }

    /// Return to the frame builder.
    pub fn build(self) -> DataExBuilder {
        self.parent.with_body(DataBody::Merged(self.body))
    }
}

/// Meta data fields.
#[derive(Debug)]
#[must_use = "call build() to return to the frame builder"]
pub struct MetaDataBuilder {
    parent: DataExBuilder,
    body: MetaDataEx,
}

impl MetaDataBuilder {
    /// Append a partition and its leader.
    pub fn partition(mut self, partition_id: i32, leader_id: i32) -> Self {
        self.body.partitions.push(PartitionLeader {
            partition_id,
            leader_id,
        });
        self
    }

    /// Return to the frame builder.
    pub fn build(self) -> DataExBuilder {
        self.parent.with_body(DataBody::Meta(self.body))
    }
}

/// Describe data fields.
#[derive(Debug)]
#[must_use = "call build() to return to the frame builder"]
pub struct DescribeDataBuilder {
    parent: DataExBuilder,
    body: DescribeDataEx,
}

impl DescribeDataBuilder {
    /// Append a configuration entry.
    ///
    /// Names are unique; repeating one fails the frame build with
    /// [`CodecError::DuplicateName`].
    pub fn config(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        if self.body.configs.contains_key(&name) {
            self.parent.base.record(CodecError::DuplicateName {
                field: "configs",
                name,
            });
        } else {
            self.body.configs.insert(name, value.into());
        }
        self
    }

    /// Return to the frame builder.
    pub fn build(self) -> DataExBuilder {
        self.parent.with_body(DataBody::Describe(self.body))
    }
}

/// Produce data fields.
#[derive(Debug)]
#[must_use = "call build() to return to the frame builder"]
pub struct ProduceDataBuilder {
    parent: DataExBuilder,
    body: ProduceDataEx,
}

impl ProduceDataBuilder {
    /// Set the deferred value length.
    pub fn deferred(mut self, deferred: i32) -> Self {
        self.body.deferred = deferred;
        self
    }

    /// Set the record timestamp.
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.body.timestamp = timestamp;
        self
    }

    /// Set the producer sequence number.
    pub fn sequence(mut self, sequence: i32) -> Self {
        self.body.sequence = sequence;
        self
    }

    /// Set the record key.
    pub fn key(mut self, key: impl Into<NullableBytes>) -> Self {
        self.body.key = key.into();
        self
    }

    /// Append a header.
    pub fn header(mut self, name: impl AsRef<[u8]>, value: impl Into<NullableBytes>) -> Self {
        self.body.headers.push(Header::new(name, value));
        self
    }

    /// Return to the frame builder.
    pub fn build(self) -> DataExBuilder {
        self.parent.with_body(DataBody::Produce(self.body))
    }
}
