//! # arco-metahook
//!
//! Metastore lifecycle hook keeping a legacy table registry consistent with
//! a snapshot-based table catalog.
//!
//! The hook intercepts create, drop, alter and insert statements and:
//!
//! - **Derives metadata**: catalog schemas and partition specs are computed
//!   from registry columns under a fixed precedence (explicit property, then
//!   partition keys, then columns)
//! - **Migrates in place**: external registry tables are converted to catalog
//!   tables by importing their existing data files without rewriting them
//! - **Commits write jobs**: commit-or-abort with distinct errors for a clean
//!   abort and a failed abort
//!
//! ## Architecture
//!
//! 1. **Translation**: [`PropertyTranslator`] turns registry parameters into
//!    per-operation [`CatalogProperties`]
//! 2. **Resolution**: [`SchemaResolver`] and [`PartitionSpecResolver`]
//! 3. **Coordination**: [`LifecycleCoordinator`] implements [`MetaHook`],
//!    threading phase state from `pre_*` into `commit_*`/`rollback_*`
//! 4. **Collaborators**: [`TableCatalog`], [`FileIo`] and [`OutputCommitter`]
//!    are supplied by the host
//!
//! ## Example
//!
//! ```rust,ignore
//! use arco_metahook::prelude::*;
//!
//! let hook = LifecycleCoordinator::new(catalog, file_io, committer, HookConfig::from_env()?);
//! let driver = StatementDriver::new(&hook);
//! driver.create_table(&mut table, |t| registry.persist(t))?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod catalog;
pub mod committer;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod hook;
pub mod legacy;
pub mod metrics;
pub mod migration;
pub mod partition_resolver;
pub mod properties;
pub mod schema_resolver;
pub mod statement;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::catalog::{CatalogTable, FileIo, FileStatus, TableCatalog};
    pub use crate::committer::{JobContext, JobId, JobState, JobTracking, OutputCommitter};
    pub use crate::config::HookConfig;
    pub use crate::coordinator::LifecycleCoordinator;
    pub use crate::error::{HookError, HookResult, StatusReport};
    pub use crate::hook::MetaHook;
    pub use crate::legacy::{
        EnvironmentContext, FieldSchema, LegacyPartition, LegacyTable, SerDeInfo,
        StorageDescriptor,
    };
    pub use crate::migration::{DataFile, ImportPlan};
    pub use crate::properties::CatalogProperties;
    pub use crate::statement::StatementDriver;
    pub use crate::types::*;
}

// Re-export key types at crate root
pub use catalog::{CatalogTable, FileIo, FileStatus, TableCatalog};
pub use committer::{JobCommitCoordinator, OutputCommitter};
pub use config::HookConfig;
pub use coordinator::LifecycleCoordinator;
pub use error::{HookError, HookResult, StatusReport};
pub use hook::MetaHook;
pub use migration::MigrationPlanner;
pub use partition_resolver::PartitionSpecResolver;
pub use properties::{CatalogProperties, PropertyTranslator};
pub use schema_resolver::SchemaResolver;
pub use statement::StatementDriver;
