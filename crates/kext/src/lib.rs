//! Kext: binary codec for Kafka stream-extension frames.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the kext sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use kext::prelude::*;
//!
//! // A merged begin frame that only wants records keyed `k1`.
//! let begin = BeginEx::builder()
//!     .type_id(1)
//!     .merged()
//!     .capabilities("FETCH_ONLY")?
//!     .topic("orders")
//!     .partition(0, 10)
//!     .filter()
//!     .key("k1")
//!     .build()
//!     .build()
//!     .build()?;
//!
//! let (frame, _) = BeginEx::decode(&begin)?;
//! let BeginBody::Merged(body) = frame.body else { unreachable!() };
//!
//! let headers = [Header::new("h", "v")];
//! assert!(matches_any(&body.filters, &Record::new(Some(&b"k1"[..]), &headers)));
//! assert!(!matches_any(&body.filters, &Record::new(Some(&b"k2"[..]), &headers)));
//!
//! // Match the frame structurally.
//! let matcher = BeginExMatcher::builder().merged().topic("orders").build().build()?;
//! assert!(matcher.is_match(&begin));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`wire`] | `kext-core` | Varints, flyweight buffers, field types, errors |
//! | [`codec`] | `kext-codec` | Frames, builders, filters and their evaluation |
//! | [`matching`] | `kext-match` | Structural frame matchers |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Wire primitives and field types (`kext-core`).
pub use kext_core as wire;

/// Extension frames, builders and filters (`kext-codec`).
///
/// Entry points are [`codec::BeginEx::builder`], [`codec::DataEx::builder`]
/// and [`codec::FlushEx::builder`].
pub use kext_codec as codec;

/// Structural frame matchers (`kext-match`).
pub use kext_match as matching;

/// Common imports for typical kext usage.
///
/// ```rust
/// use kext::prelude::*;
/// ```
pub mod prelude {
    // Wire primitives
    pub use kext_core::{CodecConfig, Header, NullableBytes, OffsetTriple};

    // Errors
    pub use kext_core::{CodecError, ConfigError, DecodeError};

    // Frames
    pub use kext_codec::{
        BeginBody, BeginEx, DataBody, DataEx, Event, Extension, FlushBody, FlushEx, Kind,
    };

    // Filters
    pub use kext_codec::{matches_any, matching_filters, Condition, Filter, Record};

    // Matchers
    pub use kext_match::{BeginExMatcher, ByteCursor, DataExMatcher, FlushExMatcher, MatchError};
}
