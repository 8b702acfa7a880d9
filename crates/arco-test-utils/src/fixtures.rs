//! Pre-built test fixtures for common test scenarios.
//!
//! Provides factory functions to create registry tables and a wired-up
//! coordinator with sensible defaults.

use std::collections::HashMap;
use std::sync::Arc;

use arco_metahook::committer::{JobId, JobTracking};
use arco_metahook::legacy::{
    EXTERNAL_TABLE_TYPE, FieldSchema, LegacyTable, MANAGED_TABLE_TYPE, StorageDescriptor,
};
use arco_metahook::types::TableIdent;
use arco_metahook::{HookConfig, LifecycleCoordinator};

use crate::catalog::InMemoryCatalog;
use crate::committer::ScriptedCommitter;
use crate::file_io::TracingFileIo;

/// ORC reader implementation name.
pub const ORC_INPUT_FORMAT: &str = "org.apache.hadoop.hive.ql.io.orc.OrcInputFormat";
/// Parquet reader implementation name.
pub const PARQUET_INPUT_FORMAT: &str =
    "org.apache.hadoop.hive.ql.io.parquet.MapredParquetInputFormat";
/// Avro reader implementation name.
pub const AVRO_INPUT_FORMAT: &str = "org.apache.hadoop.hive.ql.io.avro.AvroContainerInputFormat";
/// Text reader implementation name.
pub const TEXT_INPUT_FORMAT: &str = "org.apache.hadoop.mapred.TextInputFormat";

/// Builder for registry table records.
#[derive(Debug, Clone)]
pub struct LegacyTableBuilder {
    table: LegacyTable,
}

impl LegacyTableBuilder {
    /// Starts a managed table at `mem://warehouse/<db>/<table>`.
    pub fn new(db: &str, table: &str) -> Self {
        Self {
            table: LegacyTable {
                db_name: db.to_string(),
                table_name: table.to_string(),
                table_type: MANAGED_TABLE_TYPE.to_string(),
                temporary: false,
                parameters: HashMap::new(),
                storage: StorageDescriptor {
                    location: Some(format!("mem://warehouse/{db}/{table}")),
                    ..StorageDescriptor::default()
                },
                partition_keys: Vec::new(),
            },
        }
    }

    /// Marks the table external.
    #[must_use]
    pub fn external(mut self) -> Self {
        self.table.table_type = EXTERNAL_TABLE_TYPE.to_string();
        self
    }

    /// Marks the table temporary.
    #[must_use]
    pub fn temporary(mut self) -> Self {
        self.table.temporary = true;
        self
    }

    /// Marks the table transactional.
    #[must_use]
    pub fn transactional(self) -> Self {
        self.parameter("transactional", "true")
    }

    /// Appends a data column.
    #[must_use]
    pub fn column(mut self, name: &str, type_name: &str) -> Self {
        self.table
            .storage
            .columns
            .push(FieldSchema::new(name, type_name));
        self
    }

    /// Appends a partition key.
    #[must_use]
    pub fn partition_key(mut self, name: &str, type_name: &str) -> Self {
        self.table
            .partition_keys
            .push(FieldSchema::new(name, type_name));
        self
    }

    /// Sets a table parameter.
    #[must_use]
    pub fn parameter(mut self, key: &str, value: &str) -> Self {
        self.table
            .parameters
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Sets or clears the storage location.
    #[must_use]
    pub fn location(mut self, location: Option<&str>) -> Self {
        self.table.storage.location = location.map(str::to_string);
        self
    }

    /// Sets the reader implementation name.
    #[must_use]
    pub fn input_format(mut self, input_format: &str) -> Self {
        self.table.storage.input_format = Some(input_format.to_string());
        self
    }

    /// Builds the record.
    pub fn build(self) -> LegacyTable {
        self.table
    }
}

/// Test context with in-memory collaborators wired to a coordinator.
pub struct TestContext {
    /// Shared file system.
    pub io: TracingFileIo,
    /// Catalog writing through `io`.
    pub catalog: Arc<InMemoryCatalog>,
    /// Committer used by insert commits.
    pub committer: Arc<ScriptedCommitter>,
    /// Coordinator under test.
    pub hook: LifecycleCoordinator,
}

impl TestContext {
    /// Context over a standalone (non-native) catalog.
    pub fn standalone() -> Self {
        Self::build(false, ScriptedCommitter::succeeding(), HookConfig::default())
    }

    /// Context over a native catalog.
    pub fn native() -> Self {
        Self::build(true, ScriptedCommitter::succeeding(), HookConfig::default())
    }

    /// Context with explicit mode, committer and configuration.
    pub fn build(native: bool, committer: ScriptedCommitter, config: HookConfig) -> Self {
        let io = TracingFileIo::new();
        let catalog = Arc::new(if native {
            InMemoryCatalog::native(io.clone())
        } else {
            InMemoryCatalog::standalone(io.clone())
        });
        let committer = Arc::new(committer);
        let hook = LifecycleCoordinator::new(
            catalog.clone(),
            Arc::new(io.clone()),
            committer.clone(),
            config,
        );
        Self {
            io,
            catalog,
            committer,
            hook,
        }
    }

    /// Job tracking recording `job_id` for `table` under the configured prefix.
    pub fn tracking(&self, table: &TableIdent, job_id: &str) -> JobTracking {
        let mut tracking = JobTracking::new();
        tracking.record(
            &self.hook.config().job_id_key_prefix,
            table,
            &JobId::parse(job_id).expect("valid job id"),
        );
        tracking
    }
}
