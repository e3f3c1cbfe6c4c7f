//! Core primitives for the Kafka stream-extension codec.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the building blocks every frame encoder and matcher sits on:
//!
//! - [`varint`]: zigzag variable-length integers
//! - [`buffer`]: the fixed-capacity [`FrameWriter`] scratch region and the
//!   bounds-checked [`FrameReader`] cursor
//! - [`field`]: shared field types ([`NullableBytes`], [`OffsetTriple`],
//!   [`Header`], [`Delta`]) and the enumerations carried in frames
//! - [`error`]: construction, decode and configuration errors
//! - [`config`]: [`CodecConfig`] scratch sizing
//!
//! # Byte order
//!
//! Every fixed-width integer is little-endian, consistent with the
//! little-endian group order of the varint encoding.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod error;
pub mod field;
pub mod varint;

pub use buffer::{encode_to_bytes, FrameReader, FrameWriter, WireDecode, WireEncode};
pub use config::CodecConfig;
pub use error::{CodecError, ConfigError, DecodeError};
pub use field::{
    Capabilities, Delta, DeltaType, Header, NullableBytes, OffsetTriple, LATEST_OFFSET_DEFAULT,
    OFFSET_HISTORICAL, OFFSET_UNSET,
};
pub use varint::{
    decode_varint, encode_varint, encode_varint_into, unzigzag, varint_len, zigzag, MAX_VARINT_LEN,
};
