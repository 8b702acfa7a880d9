//! Shared test utilities for arco-metahook integration tests.
//!
//! This crate provides:
//! - [`TracingFileIo`]: In-memory file IO with operation recording
//! - [`InMemoryCatalog`]: Table catalog writing real metadata files
//! - [`ScriptedCommitter`]: Output committer with fixed outcomes
//! - [`TestContext`]: Pre-wired coordinator and collaborators
//! - Fixtures and custom assertion helpers
//!
//! # Example
//!
//! ```rust,ignore
//! use arco_test_utils::{LegacyTableBuilder, TestContext};
//!
//! let ctx = TestContext::standalone();
//! let mut table = LegacyTableBuilder::new("db", "t").column("id", "int").build();
//! let state = ctx.hook.pre_create(&mut table)?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
// Test utilities use expect/unwrap for cleaner test code - panics are acceptable in tests
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

pub mod assertions;
pub mod catalog;
pub mod committer;
pub mod file_io;
pub mod fixtures;

pub use assertions::*;
pub use catalog::*;
pub use committer::*;
pub use file_io::*;
pub use fixtures::*;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("arco_metahook=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}
