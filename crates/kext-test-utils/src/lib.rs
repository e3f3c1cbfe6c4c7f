//! Test fixtures and tracing setup for kext development.
//!
//! [`fixtures`] builds one sample frame per supported (event, kind) pair
//! plus the frames used by end-to-end scenarios. [`init_tracing`] installs
//! a test-friendly subscriber once per process.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static TRACING: Once = Once::new();

/// Install a fmt subscriber filtered by `RUST_LOG` (default `warn`).
///
/// Output goes through the libtest capture writer. Safe to call from
/// every test; only the first call has an effect.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
