//! Structural matchers for Kafka stream-extension frames.
//!
//! A matcher names the fields it cares about and ignores the rest. Scalar
//! expectations are compared directly; composite ones (offsets, keys,
//! headers, filters) are encoded once when the matcher is built and
//! compared with the re-encoded actual value.
//!
//! ```
//! use kext_codec::DataEx;
//! use kext_match::{ByteCursor, DataExMatcher};
//!
//! let frame = DataEx::builder().fetch().key("k1").build().build()?;
//! let matcher = DataExMatcher::builder().fetch().key("k1").build().build()?;
//!
//! let mut cursor = ByteCursor::new(&frame);
//! assert!(matcher.matches(&mut cursor)?);
//! assert!(cursor.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod begin;
pub mod cursor;
pub mod data;
pub mod error;
pub mod expect;
pub mod flush;
pub mod matcher;

pub use begin::{BeginBodyMatcher, BeginExMatcher, BeginExMatcherBuilder};
pub use cursor::ByteCursor;
pub use data::{DataBodyMatcher, DataExMatcher, DataExMatcherBuilder};
pub use error::MatchError;
pub use expect::Frozen;
pub use flush::{FlushBodyMatcher, FlushExMatcher, FlushExMatcherBuilder};
pub use matcher::{BodyMatcher, ExMatcher};
