//! Begin extension frames.
//!
//! # Body layouts
//!
//! ```text
//! bootstrap := string16 topic
//! merged    := u8 capabilities, string16 topic, array32<offset_triple> partitions,
//!              array32<filter> filters, u8 delta_type
//! fetch     := string16 topic, offset_triple partition, array32<filter> filters,
//!              u8 delta_type
//! meta      := string16 topic
//! describe  := string16 topic, array32<string16> configs
//! produce   := string16? transaction, i64 producer_id, string16 topic,
//!              offset_triple partition
//! ```

use bytes::Bytes;

use kext_core::{
    Capabilities, CodecConfig, CodecError, DecodeError, DeltaType, FrameReader, FrameWriter,
    OffsetTriple, WireDecode, WireEncode, LATEST_OFFSET_DEFAULT,
};

use crate::condition::Filter;
use crate::filter::{FilterBuilder, FilterTarget};
use crate::frame::{Frame, FrameBase, FrameBody};
use crate::kind::{Event, Kind};

/// A begin extension frame.
pub type BeginEx = Frame<BeginBody>;

// ── Bodies ──────────────────────────────────────────────────────

/// Bootstrap begin body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BootstrapBeginEx {
    /// Topic name.
    pub topic: String,
}

/// Merged begin body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergedBeginEx {
    /// Whether the stream produces, fetches, or both.
    pub capabilities: Capabilities,
    /// Topic name.
    pub topic: String,
    /// Starting position per partition.
    pub partitions: Vec<OffsetTriple>,
    /// Alternative record filters.
    pub filters: Vec<Filter>,
    /// Requested value delta encoding.
    pub delta_type: DeltaType,
}

/// Fetch begin body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchBeginEx {
    /// Topic name.
    pub topic: String,
    /// Starting position.
    pub partition: OffsetTriple,
    /// Alternative record filters.
    pub filters: Vec<Filter>,
    /// Requested value delta encoding.
    pub delta_type: DeltaType,
}

/// Meta begin body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetaBeginEx {
    /// Topic name.
    pub topic: String,
}

/// Describe begin body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DescribeBeginEx {
    /// Topic name.
    pub topic: String,
    /// Names of the configuration entries requested.
    pub configs: Vec<String>,
}

/// Produce begin body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProduceBeginEx {
    /// Transactional id, if any.
    pub transaction: Option<String>,
    /// Producer id; `-1` when unassigned.
    pub producer_id: i64,
    /// Topic name.
    pub topic: String,
    /// Target partition.
    pub partition: OffsetTriple,
}

impl Default for ProduceBeginEx {
    fn default() -> Self {
        Self {
            transaction: None,
            producer_id: -1,
            topic: String::new(),
            partition: OffsetTriple::default(),
        }
    }
}

/// Begin body for each kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BeginBody {
    /// Bootstrap.
    Bootstrap(BootstrapBeginEx),
    /// Merged.
    Merged(MergedBeginEx),
    /// Fetch.
    Fetch(FetchBeginEx),
    /// Meta.
    Meta(MetaBeginEx),
    /// Describe.
    Describe(DescribeBeginEx),
    /// Produce.
    Produce(ProduceBeginEx),
}

fn put_topic(w: &mut FrameWriter, topic: &str) -> Result<(), CodecError> {
    w.put_string16(Some(topic))
}

fn get_topic(r: &mut FrameReader<'_>) -> Result<String, DecodeError> {
    r.get_string16_non_null("topic")
}

impl WireEncode for BeginBody {
    fn encode(&self, w: &mut FrameWriter) -> Result<(), CodecError> {
        match self {
            Self::Bootstrap(b) => put_topic(w, &b.topic),
            Self::Merged(b) => {
                b.capabilities.encode(w)?;
                put_topic(w, &b.topic)?;
                w.put_array32(&b.partitions)?;
                w.put_array32(&b.filters)?;
                b.delta_type.encode(w)
            }
            Self::Fetch(b) => {
                put_topic(w, &b.topic)?;
                b.partition.encode(w)?;
                w.put_array32(&b.filters)?;
                b.delta_type.encode(w)
            }
            Self::Meta(b) => put_topic(w, &b.topic),
            Self::Describe(b) => {
                put_topic(w, &b.topic)?;
                w.put_array32_with(&b.configs, |w, name| w.put_string16(Some(name.as_str())))
            }
            Self::Produce(b) => {
                w.put_string16(b.transaction.as_deref())?;
                w.put_i64(b.producer_id)?;
                put_topic(w, &b.topic)?;
                b.partition.encode(w)
            }
        }
    }
}

impl FrameBody for BeginBody {
    const EVENT: Event = Event::Begin;

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

    fn decode_body(kind: Kind, r: &mut FrameReader<'_>) -> Result<Self, DecodeError> {
        Ok(match kind {
            Kind::Bootstrap => Self::Bootstrap(BootstrapBeginEx {
                topic: get_topic(r)?,
            }),
            Kind::Merged => Self::Merged(MergedBeginEx {
                capabilities: Capabilities::decode(r)?,
                topic: get_topic(r)?,
                partitions: r.get_array32("partitions")?,
                filters: r.get_array32("filters")?,
                delta_type: DeltaType::decode(r)?,
            }),
            Kind::Fetch => Self::Fetch(FetchBeginEx {
                topic: get_topic(r)?,
                partition: OffsetTriple::decode(r)?,
                filters: r.get_array32("filters")?,
                delta_type: DeltaType::decode(r)?,
            }),
            Kind::Meta => Self::Meta(MetaBeginEx {
                topic: get_topic(r)?,
            }),
            Kind::Describe => Self::Describe(DescribeBeginEx {
                topic: get_topic(r)?,
                configs: r.get_array32_with("configs", |r| r.get_string16_non_null("config"))?,
            }),
            Kind::Produce => Self::Produce(ProduceBeginEx {
                transaction: r.get_string16("transaction")?,
                producer_id: r.get_i64()?,
                topic: get_topic(r)?,
                partition: OffsetTriple::decode(r)?,
            }),
        })
    }
}

// ── Builders ────────────────────────────────────────────────────

impl BeginEx {
    /// Start building a begin frame with the default [`CodecConfig`].
    pub fn builder() -> BeginExBuilder {
        BeginExBuilder::new()
    }
}

/// Builds one begin frame.
///
/// # Examples
///
/// ```
/// use kext_codec::BeginEx;
///
/// let frame = BeginEx::builder()
///     .type_id(1)
///     .merged()
///     .capabilities("FETCH_ONLY")?
///     .topic("t")
///     .partition(0, 10)
///     .filter()
///     .key("k1")
///     .build()
///     .build()
///     .build()?;
/// assert_eq!(frame[4], 255);
/// # Ok::<(), kext_core::CodecError>(())
/// ```
#[derive(Debug)]
#[must_use = "call build() to encode the frame"]
pub struct BeginExBuilder {
    base: FrameBase,
    body: Option<BeginBody>,
}

impl Default for BeginExBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BeginExBuilder {
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

    /// Select the bootstrap kind.
    pub fn bootstrap(self) -> BootstrapBeginBuilder {
        BootstrapBeginBuilder {
            parent: self,
            body: BootstrapBeginEx::default(),
        }
    }

    /// Select the merged kind.
    pub fn merged(self) -> MergedBeginBuilder {
        MergedBeginBuilder {
            parent: self,
            body: MergedBeginEx::default(),
        }
    }

    /// Select the fetch kind.
    pub fn fetch(self) -> FetchBeginBuilder {
        FetchBeginBuilder {
            parent: self,
            body: FetchBeginEx::default(),
        }
    }

    /// Select the meta kind.
    pub fn meta(self) -> MetaBeginBuilder {
        MetaBeginBuilder {
            parent: self,
            body: MetaBeginEx::default(),
        }
    }

    /// Select the describe kind.
    pub fn describe(self) -> DescribeBeginBuilder {
        DescribeBeginBuilder {
            parent: self,
            body: DescribeBeginEx::default(),
        }
    }

    /// Select the produce kind.
    pub fn produce(self) -> ProduceBeginBuilder {
        ProduceBeginBuilder {
            parent: self,
            body: ProduceBeginEx::default(),
            past_transaction: false,
        }
    }

    fn with_body(mut self, body: BeginBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Encode the frame.
    ///
    /// Fails with the first error recorded by a nested builder, with
    /// [`CodecError::MissingKind`] if no kind was selected, or with
    /// [`CodecError::ScratchOverflow`] if the frame does not fit.
    pub fn build(self) -> Result<Bytes, CodecError> {
        self.base.finish(self.body)
    }
}

/// Bootstrap begin fields.
#[derive(Debug)]
#[must_use = "call build() to return to the frame builder"]
pub struct BootstrapBeginBuilder {
    parent: BeginExBuilder,
    body: BootstrapBeginEx,
}

impl BootstrapBeginBuilder {
    /// Set the topic.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.body.topic = topic.into();
        self
    }

    /// Return to the frame builder.
    pub fn build(self) -> BeginExBuilder {
        self.parent.with_body(BeginBody::Bootstrap(self.body))
    }
}

/// Merged begin fields.
#[derive(Debug)]
#[must_use = "call build() to return to the frame builder"]
pub struct MergedBeginBuilder {
    parent: BeginExBuilder,
    body: MergedBeginEx,
}

impl MergedBeginBuilder {
    /// Set capabilities by name: `PRODUCE_ONLY`, `FETCH_ONLY` or
    /// `PRODUCE_AND_FETCH`.
    pub fn capabilities(mut self, name: &str) -> Result<Self, CodecError> {
        self.body.capabilities = name.parse()?;
        Ok(self)
    }

    /// Set the topic.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.body.topic = topic.into();
        self
    }

    /// Append a partition tracking the latest offset.
    pub fn partition(self, partition_id: i32, partition_offset: i64) -> Self {
        self.partition_at(OffsetTriple::new(partition_id, partition_offset))
    }

    /// Append a partition with an explicit latest offset.
    pub fn partition_with_latest(
        self,
        partition_id: i32,
        partition_offset: i64,
        latest_offset: i64,
    ) -> Self {
        self.partition_at(OffsetTriple::with_latest(
            partition_id,
            partition_offset,
            latest_offset,
        ))
    }

    fn partition_at(mut self, partition: OffsetTriple) -> Self {
        self.body.partitions.push(partition);
        self
    }

    /// Start a filter; its `build()` returns here.
    pub fn filter(self) -> FilterBuilder<Self> {
        FilterBuilder::new(self)
    }

    /// Set the delta type by name: `NONE` or `JSON_PATCH`.
    pub fn delta_type(mut self, name: &str) -> Result<Self, CodecError> {
        self.body.delta_type = name.parse()?;
        Ok(self)
    }

    /// Return to the frame builder.
    pub fn build(self) -> BeginExBuilder {
        self.parent.with_body(BeginBody::Merged(self.body))
    }
}

impl FilterTarget for MergedBeginBuilder {
    fn push_filter(&mut self, filter: Filter) {
        self.body.filters.push(filter);
    }

    fn record_error(&mut self, error: CodecError) {
        self.parent.base.record(error);
    }
}

/// Fetch begin fields.
#[derive(Debug)]
#[must_use = "call build() to return to the frame builder"]
pub struct FetchBeginBuilder {
    parent: BeginExBuilder,
    body: FetchBeginEx,
}

impl FetchBeginBuilder {
    /// Set the topic.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.body.topic = topic.into();
        self
    }

    /// Set the partition, tracking the latest offset.
    pub fn partition(mut self, partition_id: i32, partition_offset: i64) -> Self {
        self.body.partition = OffsetTriple::new(partition_id, partition_offset);
        self
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

    /// Start a filter; its `build()` returns here.
    pub fn filter(self) -> FilterBuilder<Self> {
        FilterBuilder::new(self)
    }

    /// Set the delta type by name: `NONE` or `JSON_PATCH`.
    pub fn delta_type(mut self, name: &str) -> Result<Self, CodecError> {
        self.body.delta_type = name.parse()?;
        Ok(self)
    }

    /// Return to the frame builder.
    pub fn build(self) -> BeginExBuilder {
        self.parent.with_body(BeginBody::Fetch(self.body))
    }
}

impl FilterTarget for FetchBeginBuilder {
    fn push_filter(&mut self, filter: Filter) {
        self.body.filters.push(filter);
    }

    fn record_error(&mut self, error: CodecError) {
        self.parent.base.record(error);
    }
}

/// Meta begin fields.
#[derive(Debug)]
#[must_use = "call build() to return to the frame builder"]
pub struct MetaBeginBuilder {
    parent: BeginExBuilder,
    body: MetaBeginEx,
}

impl MetaBeginBuilder {
    /// Set the topic.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.body.topic = topic.into();
        self
    }

    /// Return to the frame builder.
    pub fn build(self) -> BeginExBuilder {
        self.parent.with_body(BeginBody::Meta(self.body))
    }
}

/// Describe begin fields.
#[derive(Debug)]
#[must_use = "call build() to return to the frame builder"]
pub struct DescribeBeginBuilder {
    parent: BeginExBuilder,
    body: DescribeBeginEx,
}

impl DescribeBeginBuilder {
    /// Set the topic.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.body.topic = topic.into();
        self
    }

    /// Request one configuration entry by name.
    pub fn config(mut self, name: impl Into<String>) -> Self {
        self.body.configs.push(name.into());
        self
    }

    /// Return to the frame builder.
    pub fn build(self) -> BeginExBuilder {
        self.parent.with_body(BeginBody::Describe(self.body))
    }
}

/// Produce begin fields.
///
/// `transaction` comes first on the wire. Setting any later field first
/// fixes the transaction to null; a `transaction` call after that point
/// fails the frame build with [`CodecError::FieldOutOfOrder`].
#[derive(Debug)]
#[must_use = "call build() to return to the frame builder"]
pub struct ProduceBeginBuilder {
    parent: BeginExBuilder,
    body: ProduceBeginEx,
    past_transaction: bool,
}

impl ProduceBeginBuilder {
    /// Set the transactional id; `None` for non-transactional.
    pub fn transaction(mut self, transaction: Option<&str>) -> Self {
        if self.past_transaction {
            self.parent.base.record(CodecError::FieldOutOfOrder {
                field: "transaction",
            });
        } else {
            self.body.transaction = transaction.map(str::to_owned);
        }
        self
    }

    /// Set the producer id.
    pub fn producer_id(mut self, producer_id: i64) -> Self {
        self.past_transaction = true;
        self.body.producer_id = producer_id;
        self
    }

    /// Set the topic.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.past_transaction = true;
        self.body.topic = topic.into();
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
        self.past_transaction = true;
        self.body.partition =
            OffsetTriple::with_latest(partition_id, partition_offset, latest_offset);
        self
    }

    /// Return to the frame builder.
    pub fn build(self) -> BeginExBuilder {
        self.parent.with_body(BeginBody::Produce(self.body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kext_core::OFFSET_UNSET;

    fn decode(bytes: &[u8]) -> BeginBody {
        let (frame, len) = BeginEx::decode(bytes).unwrap();
        assert_eq!(len, bytes.len());
        frame.body
    }

    #[test]
    fn header_precedes_body() {
        let bytes = BeginEx::builder()
            .type_id(0x0102_0304)
            .meta()
            .topic("t")
            .build()
            .build()
            .unwrap();
        assert_eq!(&bytes[..5], &[0x04, 0x03, 0x02, 0x01, 3]);
        assert_eq!(&bytes[5..], &[1, 0, b't']);
    }

    #[test]
    fn merged_defaults() {
        let bytes = BeginEx::builder().type_id(1).merged().build().build().unwrap();
        let BeginBody::Merged(body) = decode(&bytes) else {
            panic!("expected merged body");
        };
        assert_eq!(body, MergedBeginEx::default());
        assert_eq!(body.capabilities, Capabilities::ProduceAndFetch);
        assert_eq!(body.delta_type, DeltaType::None);
        assert_eq!(body.topic, "");
    }

    #[test]
    fn merged_fields_roundtrip() {
        let bytes = BeginEx::builder()
            .type_id(7)
            .merged()
            .capabilities("FETCH_ONLY")
            .unwrap()
            .topic("t")
            .partition(0, 10)
            .partition_with_latest(1, 5, 9)
            .filter()
            .key("k1")
            .build()
            .filter()
            .header("h", "v")
            .build()
            .delta_type("JSON_PATCH")
            .unwrap()
            .build()
            .build()
            .unwrap();
        let BeginBody::Merged(body) = decode(&bytes) else {
            panic!("expected merged body");
        };
        assert_eq!(body.capabilities, Capabilities::FetchOnly);
        assert_eq!(
            body.partitions,
            vec![OffsetTriple::new(0, 10), OffsetTriple::with_latest(1, 5, 9)]
        );
        assert_eq!(body.partitions[0].latest_offset, LATEST_OFFSET_DEFAULT);
        assert_eq!(body.filters.len(), 2);
        assert_eq!(body.delta_type, DeltaType::JsonPatch);
    }

    #[test]
    fn invalid_capabilities_name_fails_immediately() {
        let err = BeginEx::builder()
            .merged()
            .capabilities("FETCH_MOSTLY")
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidEnumName { kind: "capabilities", .. }));
    }

    #[test]
    fn fetch_partition_default() {
        let bytes = BeginEx::builder().fetch().topic("t").build().build().unwrap();
        let BeginBody::Fetch(body) = decode(&bytes) else {
            panic!("expected fetch body");
        };
        assert_eq!(body.partition.partition_id, -1);
        assert_eq!(body.partition.partition_offset, OFFSET_UNSET);
        assert!(body.filters.is_empty());
    }

    #[test]
    fn describe_configs_in_order() {
        let bytes = BeginEx::builder()
            .describe()
            .topic("t")
            .config("cleanup.policy")
            .config("segment.bytes")
            .build()
            .build()
            .unwrap();
        let BeginBody::Describe(body) = decode(&bytes) else {
            panic!("expected describe body");
        };
        assert_eq!(body.configs, vec!["cleanup.policy", "segment.bytes"]);
    }

    #[test]
    fn produce_transaction_first() {
        let bytes = BeginEx::builder()
            .produce()
            .transaction(Some("tx"))
            .producer_id(8)
            .topic("t")
            .partition(2, 0)
            .build()
            .build()
            .unwrap();
        let BeginBody::Produce(body) = decode(&bytes) else {
            panic!("expected produce body");
        };
        assert_eq!(body.transaction.as_deref(), Some("tx"));
        assert_eq!(body.producer_id, 8);
    }

    #[test]
    fn produce_implied_null_transaction() {
        let bytes = BeginEx::builder()
            .produce()
            .topic("t")
            .build()
            .build()
            .unwrap();
        let BeginBody::Produce(body) = decode(&bytes) else {
            panic!("expected produce body");
        };
        assert_eq!(body.transaction, None);
        assert_eq!(body.producer_id, -1);
        assert_eq!(&bytes[5..7], &[0xFF, 0xFF]);
    }

    #[test]
    fn produce_late_transaction_rejected() {
        let err = BeginEx::builder()
            .produce()
            .producer_id(1)
            .transaction(Some("tx"))
            .build()
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            CodecError::FieldOutOfOrder {
                field: "transaction"
            }
        );
    }

    #[test]
    fn no_kind_selected() {
        assert_eq!(
            BeginEx::builder().type_id(1).build().unwrap_err(),
            CodecError::MissingKind
        );
    }

    #[test]
    fn scratch_overflow_returns_no_bytes() {
        let err = BeginExBuilder::with_config(CodecConfig::with_scratch_capacity(64))
            .bootstrap()
            .topic("x".repeat(100))
            .build()
            .build()
            .unwrap_err();
        assert!(matches!(err, CodecError::ScratchOverflow { capacity: 64, .. }));
    }

    #[test]
    fn every_kind_reencodes_identically() {
        let frames = [
            BeginEx::builder().bootstrap().topic("b").build().build(),
            BeginEx::builder().meta().topic("m").build().build(),
            BeginEx::builder().fetch().topic("f").partition(1, 2).build().build(),
            BeginEx::builder().describe().topic("d").config("c").build().build(),
            BeginEx::builder().produce().topic("p").build().build(),
        ];
        for bytes in frames {
            let bytes = bytes.unwrap();
            let (frame, _) = BeginEx::decode(&bytes).unwrap();
            assert_eq!(frame.to_bytes().unwrap(), bytes);
        }
    }

    #[test]
    fn unknown_kind_byte_rejected() {
        let mut bytes = BeginEx::builder().meta().build().build().unwrap().to_vec();
        bytes[4] = 2;
        assert!(matches!(
            BeginEx::decode(&bytes),
            Err(DecodeError::UnknownTag { what: "kind", .. })
        ));
    }
}
