//! In-place migration of external registry tables.
//!
//! A table qualifies when it is external, not temporary and not
//! transactional. Everything needed to build the catalog table is captured
//! in a [`MigrationContext`] before the registry record is rewritten; at
//! commit time the existing data files are listed and handed to the catalog
//! without being rewritten. Files under the table location in a format the
//! catalog cannot track are rejected before the record changes.

use std::sync::Arc;

use arco_core::FileFormat;
use tracing::{debug, info};

use crate::catalog::{FileIo, FileStatus};
use crate::error::{HookError, HookResult};
use crate::legacy::{FieldSchema, LegacyPartition, LegacyTable};
use crate::types::{PartitionSpec, Schema};

/// State captured before an alter rewrites the registry record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationContext {
    /// Pre-alter data location.
    pub location: String,
    /// Pre-alter reader implementation name.
    pub input_format: Option<String>,
    /// Schema of the table to create.
    pub schema: Schema,
    /// Partition spec of the table to create.
    pub spec: PartitionSpec,
    /// Pre-alter partition keys, in partition order.
    pub partition_keys: Vec<FieldSchema>,
}

impl MigrationContext {
    /// File format inferred from the pre-alter reader name.
    #[must_use]
    pub fn file_format(&self) -> Option<FileFormat> {
        self.input_format.as_deref().and_then(FileFormat::infer)
    }
}

/// An existing data file to register with the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFile {
    /// Full file path.
    pub path: String,
    /// File size in bytes.
    pub size: u64,
    /// File format.
    pub format: FileFormat,
    /// `(key, value)` pairs of the partition holding the file.
    pub partition: Vec<(String, String)>,
}

/// Files to import as the first snapshot of a migrated table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPlan {
    /// Table location.
    pub location: String,
    /// Common format of the files, if known.
    pub format: Option<FileFormat>,
    /// Files, grouped by partition in registry order.
    pub files: Vec<DataFile>,
}

impl ImportPlan {
    /// Total size of the planned files.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

/// Checks eligibility, captures migration state and plans file imports.
#[derive(Clone)]
pub struct MigrationPlanner {
    file_io: Arc<dyn FileIo>,
}

impl std::fmt::Debug for MigrationPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationPlanner").finish_non_exhaustive()
    }
}

impl MigrationPlanner {
    /// Creates a planner listing files through `file_io`.
    #[must_use]
    pub fn new(file_io: Arc<dyn FileIo>) -> Self {
        Self { file_io }
    }

    /// Returns true if the table may be migrated in place.
    #[must_use]
    pub fn is_eligible(table: &LegacyTable) -> bool {
        table.is_external() && !table.temporary && !table.is_transactional()
    }

    /// Rejects tables that cannot be migrated in place.
    ///
    /// # Errors
    ///
    /// Returns `HookError::MigrationNotAllowed` naming every violated
    /// condition.
    pub fn check_eligibility(table: &LegacyTable) -> HookResult<()> {
        let mut violations = Vec::new();
        if !table.is_external() {
            violations.push("table is not external");
        }
        if table.temporary {
            violations.push("table is temporary");
        }
        if table.is_transactional() {
            violations.push("table is transactional");
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(HookError::MigrationNotAllowed {
                table: table.ident().to_string(),
                reason: violations.join(", "),
            })
        }
    }

    /// Rejects a table whose location holds visible files when its reader
    /// name maps to no known file format.
    ///
    /// Runs against the unmodified record, so a rejected table can still be
    /// migrated after its reader is fixed.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the file count and reader, and an
    /// IO error if listing fails.
    pub fn check_importable(&self, table: &LegacyTable) -> HookResult<()> {
        let input_format = table.storage.input_format.as_deref();
        if input_format.and_then(FileFormat::infer).is_some() {
            return Ok(());
        }
        let Some(location) = table.location() else {
            return Ok(());
        };
        let files = self.visible_files(location)?;
        if files.is_empty() {
            return Ok(());
        }
        Err(HookError::validation(format!(
            "Cannot migrate table {}: {} files in unknown file format {}",
            table.ident(),
            files.len(),
            input_format.unwrap_or("<unset>")
        )))
    }

    /// Captures migration state from the unmodified registry record.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the table has no location.
    pub fn stage(
        table: &LegacyTable,
        schema: Schema,
        spec: PartitionSpec,
    ) -> HookResult<MigrationContext> {
        let location = table
            .location()
            .ok_or_else(|| HookError::validation("Table location not set"))?;
        Ok(MigrationContext {
            location: location.to_string(),
            input_format: table.storage.input_format.clone(),
            schema,
            spec,
            partition_keys: table.partition_keys.clone(),
        })
    }

    /// Lists the files to import.
    ///
    /// Unpartitioned tables import every visible file under the table
    /// location; partitioned tables import every visible file under each
    /// partition location, tagged with that partition's values.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a partition's value count differs from
    /// the key count or files exist in an unknown format, and an IO error if
    /// listing fails.
    pub fn plan_import(
        &self,
        context: &MigrationContext,
        partitions: &[LegacyPartition],
    ) -> HookResult<ImportPlan> {
        let format = context.file_format();
        let mut listed: Vec<(FileStatus, Vec<(String, String)>)> = Vec::new();

        if context.partition_keys.is_empty() {
            for status in self.visible_files(&context.location)? {
                listed.push((status, Vec::new()));
            }
        } else {
            for partition in partitions {
                if partition.values.len() != context.partition_keys.len() {
                    return Err(HookError::validation(format!(
                        "Partition at {} has {} values for {} partition keys",
                        partition.location,
                        partition.values.len(),
                        context.partition_keys.len()
                    )));
                }
                let values: Vec<(String, String)> = context
                    .partition_keys
                    .iter()
                    .map(|k| k.name.clone())
                    .zip(partition.values.iter().cloned())
                    .collect();
                for status in self.visible_files(&partition.location)? {
                    listed.push((status, values.clone()));
                }
            }
        }

        let files = match (format, listed.is_empty()) {
            (_, true) => Vec::new(),
            (Some(format), false) => listed
                .into_iter()
                .map(|(status, partition)| DataFile {
                    path: status.path,
                    size: status.size,
                    format,
                    partition,
                })
                .collect(),
            (None, false) => {
                return Err(HookError::validation(format!(
                    "Cannot import {} files: unknown file format {}",
                    listed.len(),
                    context.input_format.as_deref().unwrap_or("<unset>")
                )));
            }
        };

        info!(
            location = %context.location,
            files = files.len(),
            format = format.map_or("unknown", FileFormat::as_str),
            "planned data file import"
        );
        Ok(ImportPlan {
            location: context.location.clone(),
            format,
            files,
        })
    }

    fn visible_files(&self, prefix: &str) -> HookResult<Vec<FileStatus>> {
        let base = prefix.trim_end_matches('/');
        let mut files: Vec<FileStatus> = self
            .file_io
            .list(&format!("{base}/"))?
            .into_iter()
            .filter(|status| {
                let relative = status.path.strip_prefix(base).unwrap_or(&status.path);
                let hidden = relative
                    .split('/')
                    .any(|part| part.starts_with('_') || part.starts_with('.'));
                if hidden {
                    debug!(path = %status.path, "skipping hidden file");
                }
                !hidden
            })
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}
