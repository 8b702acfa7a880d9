//! Collaborator seams: the table catalog and its file IO.
//!
//! Both traits are blocking. Implementations must be thread-safe so a single
//! coordinator can serve concurrent statements.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::HookResult;
use crate::migration::ImportPlan;
use crate::properties::CatalogProperties;
use crate::types::TableIdent;

/// Listing entry returned by [`FileIo::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    /// Full file path.
    pub path: String,
    /// File size in bytes.
    pub size: u64,
}

impl FileStatus {
    /// Final path component.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// File access for table data and metadata.
pub trait FileIo: Send + Sync + 'static {
    /// Returns true if the file exists.
    ///
    /// # Errors
    ///
    /// Returns `HookError::Io` if existence cannot be determined.
    fn exists(&self, path: &str) -> HookResult<bool>;

    /// Reads an entire file.
    ///
    /// # Errors
    ///
    /// Returns `HookError::Io` if the file is missing or unreadable.
    fn read(&self, path: &str) -> HookResult<Vec<u8>>;

    /// Lists files under a prefix, recursively, in arbitrary order.
    ///
    /// # Errors
    ///
    /// Returns `HookError::Io` if the listing fails.
    fn list(&self, prefix: &str) -> HookResult<Vec<FileStatus>>;

    /// Deletes a file. Succeeds if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `HookError::Io` if the delete fails.
    fn delete(&self, path: &str) -> HookResult<()>;
}

/// A table loaded from the catalog.
#[derive(Clone)]
pub struct CatalogTable {
    /// Table identifier.
    pub ident: TableIdent,
    /// Table root location.
    pub location: String,
    /// Current metadata file, if the catalog tracks one.
    pub metadata_location: Option<String>,
    /// Table properties.
    pub properties: HashMap<String, String>,
    /// File IO bound to the table's storage.
    pub io: Arc<dyn FileIo>,
}

impl fmt::Debug for CatalogTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogTable")
            .field("ident", &self.ident)
            .field("location", &self.location)
            .field("metadata_location", &self.metadata_location)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

/// The snapshot-based table catalog.
///
/// Tables are addressed by the `name` (and, for path-based catalogs,
/// `location`) entries of the [`CatalogProperties`] passed in.
pub trait TableCatalog: Send + Sync + 'static {
    /// Whether these properties address a catalog backed by the registry
    /// itself, which then also holds the metadata pointer.
    fn is_native(&self, properties: &CatalogProperties) -> bool;

    /// Loads a table. A missing table is `Ok(None)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns `HookError::Catalog` if the lookup fails.
    fn load_table(&self, properties: &CatalogProperties) -> HookResult<Option<CatalogTable>>;

    /// Creates a table from the staged schema, spec and properties.
    ///
    /// # Errors
    ///
    /// Returns `HookError::Catalog` if the table exists or creation fails.
    fn create_table(&self, properties: &CatalogProperties) -> HookResult<()>;

    /// Drops a table, removing its files when `purge` is set. Returns false
    /// if the table did not exist.
    ///
    /// # Errors
    ///
    /// Returns `HookError::Catalog` or `HookError::Io` on failure.
    fn drop_table(&self, properties: &CatalogProperties, purge: bool) -> HookResult<bool>;

    /// Creates a table whose first snapshot references the planned files.
    ///
    /// # Errors
    ///
    /// Returns `HookError::Catalog` if the table exists or the import fails.
    fn import_table(&self, properties: &CatalogProperties, plan: &ImportPlan) -> HookResult<()>;
}
