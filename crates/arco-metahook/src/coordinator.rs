//! Lifecycle coordinator keeping the registry and the table catalog in step.
//!
//! # Phases
//!
//! | operation | pre | commit | rollback |
//! |-----------|-----|--------|----------|
//! | create | resolve schema and spec, rewrite record | create or adopt | no-op |
//! | drop | capture purge target | purge (errors absorbed) | no-op |
//! | alter | stage migration, rewrite record | import files | no-op |
//! | insert | no-op | commit or abort job | no-op |
//!
//! Every `pre_*` phase validates everything it needs before it touches the
//! registry record, so a failed phase leaves the record unchanged.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use arco_core::observability::lifecycle_span;
use tracing::{debug, info, warn};

use crate::catalog::{FileIo, TableCatalog};
use crate::committer::{JobCommitCoordinator, JobTracking, OutputCommitter};
use crate::config::{DEFAULT_SERDE_NAME, HookConfig};
use crate::error::{HookError, HookResult};
use crate::hook::MetaHook;
use crate::legacy::{EnvironmentContext, LegacyPartition, LegacyTable, SerDeInfo};
use crate::metrics;
use crate::migration::{MigrationContext, MigrationPlanner};
use crate::partition_resolver::PartitionSpecResolver;
use crate::properties::{
    CREATION_ONLY_PARAMETERS, CatalogProperties, DEFAULT_FILE_FORMAT, ENGINE_HIVE_ENABLED,
    EXTERNAL_TABLE_PURGE, ICEBERG_TABLE_TYPE, METADATA_LOCATION, PARTITION_SPEC,
    PropertyTranslator, TABLE_SCHEMA, TABLE_TYPE, purge_requested,
};
use crate::schema_resolver::SchemaResolver;
use crate::types::{PartitionSpec, Schema, TableIdent, TableMetadata};

/// State carried from `pre_create`.
#[derive(Debug, Clone)]
pub struct CreateState {
    properties: CatalogProperties,
    native: bool,
    adopted: bool,
}

impl CreateState {
    /// Properties staged for the catalog.
    #[must_use]
    pub fn properties(&self) -> &CatalogProperties {
        &self.properties
    }

    /// True when an existing catalog table was adopted instead of created.
    #[must_use]
    pub fn is_adopted(&self) -> bool {
        self.adopted
    }
}

/// Files of a natively-backed table to delete after a purging drop.
pub struct PurgeTarget {
    metadata_location: String,
    io: Arc<dyn FileIo>,
    metadata: Option<TableMetadata>,
}

impl fmt::Debug for PurgeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PurgeTarget")
            .field("metadata_location", &self.metadata_location)
            .field("metadata_loaded", &self.metadata.is_some())
            .finish_non_exhaustive()
    }
}

/// State carried from `pre_drop`.
#[derive(Debug)]
pub struct DropState {
    properties: CatalogProperties,
    native: bool,
    purge: bool,
    target: Option<PurgeTarget>,
}

impl DropState {
    /// True when the table asked for its data to be purged.
    #[must_use]
    pub fn purge_requested(&self) -> bool {
        self.purge
    }
}

/// State carried from `pre_alter`.
#[derive(Debug, Clone)]
pub struct AlterState {
    migration: Option<MigrationContext>,
}

impl AlterState {
    /// The pending migration, if the alter converts the table.
    #[must_use]
    pub fn migration(&self) -> Option<&MigrationContext> {
        self.migration.as_ref()
    }
}

/// The [`MetaHook`] implementation.
///
/// Holds no per-statement state; one instance may serve concurrent
/// statements.
pub struct LifecycleCoordinator {
    catalog: Arc<dyn TableCatalog>,
    translator: PropertyTranslator,
    schemas: SchemaResolver,
    planner: MigrationPlanner,
    jobs: JobCommitCoordinator,
    config: HookConfig,
}

impl fmt::Debug for LifecycleCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleCoordinator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LifecycleCoordinator {
    /// Creates a coordinator.
    ///
    /// `file_io` reads registry-owned data locations during migration.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn TableCatalog>,
        file_io: Arc<dyn FileIo>,
        committer: Arc<dyn OutputCommitter>,
        config: HookConfig,
    ) -> Self {
        metrics::register_metrics();
        Self {
            catalog,
            translator: PropertyTranslator::new(config.property_aliases.clone()),
            schemas: SchemaResolver::new(config.schema_auto_conversion),
            planner: MigrationPlanner::new(file_io),
            jobs: JobCommitCoordinator::new(committer, config.job_id_key_prefix.clone()),
            config,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &HookConfig {
        &self.config
    }

    fn run_phase<T>(
        phase: &'static str,
        ident: &TableIdent,
        body: impl FnOnce() -> HookResult<T>,
    ) -> HookResult<T> {
        let span = lifecycle_span(phase, &ident.namespace, &ident.name);
        let _guard = span.enter();
        let started = Instant::now();
        let result = body();
        metrics::record_phase(phase, result.is_ok(), started.elapsed());
        if let Err(err) = &result {
            warn!(error = %err, retryable = err.is_retryable(), "phase failed");
        }
        result
    }

    fn resolve(
        &self,
        table: &LegacyTable,
        properties: &CatalogProperties,
    ) -> HookResult<(Schema, PartitionSpec)> {
        let schema =
            self.schemas
                .resolve(properties, &table.storage.columns, &table.partition_keys)?;
        let spec =
            PartitionSpecResolver::resolve(&schema, &table.parameters, &table.partition_keys)?;
        Ok((schema, spec))
    }

    fn point_at_table_format(&self, table: &mut LegacyTable) {
        table.storage.input_format = Some(self.config.input_format.clone());
        table.storage.output_format = Some(self.config.output_format.clone());
    }

    /// Stamps the registry parameters of a table now owned by the catalog.
    fn stamp_parameters(table: &mut LegacyTable) {
        table
            .parameters
            .insert(TABLE_TYPE.to_string(), ICEBERG_TABLE_TYPE.to_string());
        table
            .parameters
            .entry(EXTERNAL_TABLE_PURGE.to_string())
            .or_insert_with(|| "TRUE".to_string());
        for key in CREATION_ONLY_PARAMETERS {
            table.parameters.remove(key);
        }
    }

    fn create(&self, table: &mut LegacyTable) -> HookResult<CreateState> {
        let mut properties = self.translator.for_table(table);
        let native = self.catalog.is_native(&properties);

        if !native {
            if self.catalog.load_table(&properties)?.is_some() {
                if properties.contains(TABLE_SCHEMA) {
                    return Err(HookError::validation(
                        "Catalog table already created - can not use provided schema",
                    ));
                }
                if table.parameters.contains_key(PARTITION_SPEC) {
                    return Err(HookError::validation(
                        "Catalog table already created - can not use provided partition specification",
                    ));
                }
                table
                    .parameters
                    .insert(TABLE_TYPE.to_string(), ICEBERG_TABLE_TYPE.to_string());
                self.point_at_table_format(table);
                info!("catalog table already exists, adopting it");
                return Ok(CreateState {
                    properties,
                    native,
                    adopted: true,
                });
            }
            if table.location().is_none() {
                return Err(HookError::validation("Table location not set"));
            }
        }

        let (schema, spec) = self.resolve(table, &properties)?;
        let schema_json = schema.to_json()?;
        let spec_json = spec.to_json()?;

        if !native {
            self.point_at_table_format(table);
        }
        table.fold_partition_keys();
        Self::stamp_parameters(table);
        properties.insert(TABLE_SCHEMA, schema_json);
        properties.insert(PARTITION_SPEC, spec_json);

        debug!(
            columns = schema.fields.len(),
            partition_fields = spec.fields.len(),
            "staged catalog table"
        );
        Ok(CreateState {
            properties,
            native,
            adopted: false,
        })
    }

    fn drop_target(
        &self,
        table: &LegacyTable,
        properties: &CatalogProperties,
    ) -> HookResult<Option<PurgeTarget>> {
        let metadata_location = table.parameter(METADATA_LOCATION).ok_or_else(|| {
            HookError::validation(format!(
                "Metadata location not set for table {}",
                table.ident()
            ))
        })?;
        let Some(loaded) = self.catalog.load_table(properties)? else {
            warn!("table not found in catalog, nothing to purge");
            return Ok(None);
        };
        let metadata = if loaded.io.exists(metadata_location)? {
            Some(TableMetadata::from_slice(&loaded.io.read(metadata_location)?)?)
        } else {
            None
        };
        Ok(Some(PurgeTarget {
            metadata_location: metadata_location.to_string(),
            io: loaded.io,
            metadata,
        }))
    }

    /// Deletes every file of the table, the current metadata file last.
    ///
    /// A missing metadata file means an earlier purge already ran. The
    /// metadata file is kept when any other delete fails so a later purge
    /// can find the remaining files.
    fn purge(target: PurgeTarget) -> HookResult<()> {
        let PurgeTarget {
            metadata_location,
            io,
            metadata,
        } = target;
        if !io.exists(&metadata_location)? {
            info!(metadata = %metadata_location, "metadata already removed, nothing to purge");
            return Ok(());
        }
        let metadata = match metadata {
            Some(metadata) => metadata,
            None => TableMetadata::from_slice(&io.read(&metadata_location)?)?,
        };

        let mut files: BTreeSet<String> = metadata.referenced_files().into_iter().collect();
        let root = format!("{}/", metadata.location.trim_end_matches('/'));
        files.extend(io.list(&root)?.into_iter().map(|status| status.path));
        files.remove(&metadata_location);

        let mut first_error = None;
        for file in &files {
            if let Err(err) = io.delete(file) {
                warn!(path = %file, error = %err, "failed to delete table file");
                first_error.get_or_insert(err);
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }
        io.delete(&metadata_location)?;
        info!(files = files.len() + 1, "purged table files");
        Ok(())
    }

    fn alter(
        &self,
        table: &mut LegacyTable,
        context: &mut EnvironmentContext,
    ) -> HookResult<AlterState> {
        let properties = self.translator.for_table(table);
        if self.catalog.load_table(&properties)?.is_some() {
            debug!("table already in catalog, nothing to migrate");
            return Ok(AlterState { migration: None });
        }

        if let Err(err) = MigrationPlanner::check_eligibility(table) {
            metrics::record_migration("rejected");
            return Err(err);
        }
        if table.location().is_none() {
            return Err(HookError::validation("Table location not set"));
        }
        self.planner.check_importable(table)?;
        let (schema, spec) = self.resolve(table, &properties)?;
        let migration = MigrationPlanner::stage(table, schema, spec)?;

        context.allow_partition_key_change();
        table.fold_partition_keys();
        self.point_at_table_format(table);
        table.storage.serde_info = SerDeInfo {
            name: Some(DEFAULT_SERDE_NAME.to_string()),
            serialization_lib: Some(self.config.serde_lib.clone()),
            parameters: HashMap::new(),
        };
        Self::stamp_parameters(table);

        metrics::record_migration("staged");
        info!(
            location = %migration.location,
            input_format = migration.input_format.as_deref().unwrap_or("<unset>"),
            "staged in-place migration"
        );
        Ok(AlterState {
            migration: Some(migration),
        })
    }

    fn import(
        &self,
        table: &LegacyTable,
        partitions: &[LegacyPartition],
        migration: &MigrationContext,
    ) -> HookResult<()> {
        let mut properties = self.translator.for_table(table);
        properties.insert(TABLE_SCHEMA, migration.schema.to_json()?);
        properties.insert(PARTITION_SPEC, migration.spec.to_json()?);
        if let Some(format) = migration.file_format() {
            properties.insert(DEFAULT_FILE_FORMAT, format.as_str());
        }
        if self.catalog.is_native(&properties) {
            properties.insert(ENGINE_HIVE_ENABLED, "true");
        }

        let plan = self.planner.plan_import(migration, partitions)?;
        self.catalog.import_table(&properties, &plan)?;
        metrics::record_migration("imported");
        info!(
            files = plan.files.len(),
            bytes = plan.total_bytes(),
            "imported existing data files"
        );
        Ok(())
    }
}

impl MetaHook for LifecycleCoordinator {
    type CreateState = CreateState;
    type DropState = DropState;
    type AlterState = AlterState;

    fn pre_create(&self, table: &mut LegacyTable) -> HookResult<CreateState> {
        let ident = table.ident();
        Self::run_phase("pre_create", &ident, || self.create(table))
    }

    fn commit_create(&self, table: &LegacyTable, state: CreateState) -> HookResult<()> {
        Self::run_phase("commit_create", &table.ident(), || {
            if state.adopted {
                metrics::record_table_created("adopted", state.native);
                return Ok(());
            }
            let mut properties = state.properties;
            if state.native {
                properties.insert(ENGINE_HIVE_ENABLED, "true");
            }
            self.catalog.create_table(&properties)?;
            metrics::record_table_created("created", state.native);
            info!("created catalog table");
            Ok(())
        })
    }

    fn pre_drop(&self, table: &LegacyTable) -> HookResult<DropState> {
        Self::run_phase("pre_drop", &table.ident(), || {
            let properties = self.translator.for_table(table);
            let purge = purge_requested(&table.parameters);
            let native = self.catalog.is_native(&properties);
            let target = if purge && native {
                self.drop_target(table, &properties)?
            } else {
                None
            };
            Ok(DropState {
                properties,
                native,
                purge,
                target,
            })
        })
    }

    fn commit_drop(&self, table: &LegacyTable, state: DropState, delete_data: bool) {
        let ident = table.ident();
        let outcome = Self::run_phase("commit_drop", &ident, || {
            if !(delete_data && state.purge) {
                debug!(delete_data, purge = state.purge, "keeping table data");
                return Ok(());
            }
            if !state.native {
                info!("dropping catalog table and purging its data");
                if !self.catalog.drop_table(&state.properties, true)? {
                    info!("catalog table already gone");
                }
                return Ok(());
            }
            match state.target {
                Some(target) => Self::purge(target),
                None => Ok(()),
            }
        });
        if let Err(err) = outcome {
            // The registry record is gone; the drop must still succeed.
            warn!(table = %ident, error = %err, "ignoring error during commit_drop");
            metrics::record_drop_cleanup_failure(state.native);
        }
    }

    fn pre_alter(
        &self,
        table: &mut LegacyTable,
        context: &mut EnvironmentContext,
    ) -> HookResult<AlterState> {
        let ident = table.ident();
        Self::run_phase("pre_alter", &ident, || self.alter(table, context))
    }

    fn commit_alter(
        &self,
        table: &LegacyTable,
        partitions: &[LegacyPartition],
        state: AlterState,
    ) -> HookResult<()> {
        let Some(migration) = state.migration else {
            return Ok(());
        };
        Self::run_phase("commit_alter", &table.ident(), || {
            self.import(table, partitions, &migration)
        })
    }

    fn commit_insert(
        &self,
        table: &LegacyTable,
        _overwrite: bool,
        tracking: &JobTracking,
    ) -> HookResult<()> {
        let ident = table.ident();
        Self::run_phase("commit_insert", &ident, || {
            self.jobs.commit(&ident, table.location(), tracking)
        })
    }
}
