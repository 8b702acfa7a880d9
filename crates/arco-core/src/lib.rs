//! # arco-core
//!
//! Core abstractions shared by the Arco metastore hook crates.
//!
//! This crate provides the foundational types used across components:
//!
//! - **Error Types**: Shared error definitions and result types
//! - **File Formats**: The canonical data-file format contract
//! - **Observability**: Logging initialization and span constructors
//!
//! ## Crate Boundary
//!
//! `arco-core` is the **only** crate allowed to define shared primitives.
//! Domain crates (such as `arco-metahook`) build on top of it and never
//! depend on each other for these definitions.
//!
//! ## Example
//!
//! ```rust
//! use arco_core::prelude::*;
//!
//! let format = FileFormat::infer("org.apache.hadoop.hive.ql.io.orc.OrcInputFormat");
//! assert_eq!(format, Some(FileFormat::Orc));
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod observability;
pub mod table_format;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use arco_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::observability::{LogFormat, init_logging};
    pub use crate::table_format::FileFormat;
}

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use observability::{LogFormat, init_logging};
pub use table_format::FileFormat;
