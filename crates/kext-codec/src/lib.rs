//! Kafka stream-extension frames.
//!
//! Every frame is `[type_id i32][kind u8][body]`, where the body layout
//! depends on the stream event ([`Event`]) and the protocol [`Kind`]:
//!
//! | Kind      | Begin | Data | Flush |
//! |-----------|:-----:|:----:|:-----:|
//! | Bootstrap | yes   |      |       |
//! | Merged    | yes   | yes  | yes   |
//! | Fetch     | yes   | yes  | yes   |
//! | Meta      | yes   | yes  |       |
//! | Describe  | yes   | yes  |       |
//! | Produce   | yes   | yes  |       |
//!
//! Frames are produced by fluent builders ([`BeginEx::builder`],
//! [`DataEx::builder`], [`FlushEx::builder`]) that encode into a
//! fixed-capacity scratch buffer, and read back with `decode`. Filters
//! carried by merged and fetch frames are built with [`FilterBuilder`] and
//! evaluated against records with [`Filter::matches`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod begin;
pub mod condition;
pub mod data;
pub mod eval;
pub mod filter;
pub mod flush;
pub mod frame;
pub mod kind;

pub use begin::{BeginBody, BeginEx, BeginExBuilder};
pub use condition::{
    decode_condition, encode_condition, Condition, Filter, Negatable, SkipKind, ValueMatch,
    ValueMatches,
};
pub use data::{DataBody, DataEx, DataExBuilder, PartitionLeader};
pub use eval::{matches_any, matching_filters, Record};
pub use filter::{Detached, FilterBuilder, FilterTarget, HeaderValuesBuilder};
pub use flush::{FlushBody, FlushEx, FlushExBuilder};
pub use frame::{Extension, Frame, FrameBody};
pub use kind::{Event, FrameHeader, Kind};

pub use kext_core::{CodecConfig, CodecError, DecodeError};
