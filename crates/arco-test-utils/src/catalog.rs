//! In-memory table catalog with operation tracing.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use arco_metahook::error::{HookError, HookResult};
use arco_metahook::migration::ImportPlan;
use arco_metahook::properties::{LOCATION, NAME, PARTITION_SPEC, TABLE_SCHEMA};
use arco_metahook::types::{PartitionSpec, Schema, TableIdent, TableMetadata};
use arco_metahook::{CatalogProperties, CatalogTable, FileIo, TableCatalog};

use crate::file_io::TracingFileIo;

/// Record of a catalog call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogOp {
    /// `load_table`.
    Load {
        /// Table name looked up.
        name: String,
    },
    /// `create_table`.
    Create {
        /// Table created.
        name: String,
    },
    /// `drop_table`.
    Drop {
        /// Table dropped.
        name: String,
        /// Whether files were purged.
        purge: bool,
    },
    /// `import_table`.
    Import {
        /// Table created by import.
        name: String,
        /// Number of imported files.
        files: usize,
    },
}

/// Catalog call kinds that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOpKind {
    /// `load_table`.
    Load,
    /// `create_table`.
    Create,
    /// `drop_table`.
    Drop,
    /// `import_table`.
    Import,
}

/// A table held by [`InMemoryCatalog`].
#[derive(Debug, Clone)]
pub struct StoredTable {
    /// Table identifier.
    pub ident: TableIdent,
    /// Current metadata file.
    pub metadata_location: String,
    /// Parsed current metadata.
    pub metadata: TableMetadata,
    /// Properties passed on creation (schema, spec, name and location
    /// removed).
    pub properties: HashMap<String, String>,
    /// Import plan, for imported tables.
    pub import: Option<ImportPlan>,
}

/// In-memory [`TableCatalog`] writing metadata files through a
/// [`TracingFileIo`].
#[derive(Debug, Clone)]
pub struct InMemoryCatalog {
    native: bool,
    io: TracingFileIo,
    tables: Arc<Mutex<BTreeMap<String, StoredTable>>>,
    operations: Arc<Mutex<Vec<CatalogOp>>>,
    failures: Arc<Mutex<Vec<CatalogOpKind>>>,
}

impl InMemoryCatalog {
    /// Creates a catalog backed by its own registry (native).
    pub fn native(io: TracingFileIo) -> Self {
        Self::with_mode(true, io)
    }

    /// Creates a standalone (non-native) catalog.
    pub fn standalone(io: TracingFileIo) -> Self {
        Self::with_mode(false, io)
    }

    fn with_mode(native: bool, io: TracingFileIo) -> Self {
        Self {
            native,
            io,
            tables: Arc::default(),
            operations: Arc::default(),
            failures: Arc::default(),
        }
    }

    /// Returns a table by `namespace.name`.
    pub fn table(&self, name: &str) -> Option<StoredTable> {
        self.tables.lock().expect("lock").get(name).cloned()
    }

    /// Returns true if the table exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tables.lock().expect("lock").contains_key(name)
    }

    /// Returns all recorded operations.
    pub fn operations(&self) -> Vec<CatalogOp> {
        self.operations.lock().expect("lock").clone()
    }

    /// Makes every subsequent call of `kind` fail with a catalog error.
    pub fn inject_failure(&self, kind: CatalogOpKind) {
        self.failures.lock().expect("lock").push(kind);
    }

    /// Registers an existing table directly, bypassing `create_table`.
    /// Returns its metadata location.
    pub fn seed_table(&self, ident: &TableIdent, location: &str, schema: Schema) -> String {
        let metadata = TableMetadata::new(
            location,
            schema,
            PartitionSpec::unpartitioned(),
            HashMap::new(),
        );
        self.store(ident.clone(), metadata, HashMap::new(), None)
    }

    fn record(&self, op: CatalogOp) {
        self.operations.lock().expect("lock").push(op);
    }

    fn check_failure(&self, kind: CatalogOpKind) -> HookResult<()> {
        if self.failures.lock().expect("lock").contains(&kind) {
            return Err(HookError::catalog(format!("injected {kind:?} failure")));
        }
        Ok(())
    }

    fn name(properties: &CatalogProperties) -> HookResult<String> {
        properties
            .name()
            .map(str::to_string)
            .ok_or_else(|| HookError::catalog("table name property missing"))
    }

    fn metadata_path(location: &str, version: usize) -> String {
        format!(
            "{}/metadata/{version:05}-{}.metadata.json",
            location.trim_end_matches('/'),
            uuid::Uuid::new_v4()
        )
    }

    fn store(
        &self,
        ident: TableIdent,
        metadata: TableMetadata,
        properties: HashMap<String, String>,
        import: Option<ImportPlan>,
    ) -> String {
        let version = metadata.metadata_log.len();
        let metadata_location = Self::metadata_path(&metadata.location, version);
        self.io.put(
            metadata_location.clone(),
            metadata.to_vec().expect("serialize metadata"),
        );
        self.tables.lock().expect("lock").insert(
            ident.to_string(),
            StoredTable {
                ident,
                metadata_location: metadata_location.clone(),
                metadata,
                properties,
                import,
            },
        );
        metadata_location
    }

    fn build_metadata(
        properties: &CatalogProperties,
    ) -> HookResult<(TableIdent, TableMetadata, HashMap<String, String>)> {
        let ident = TableIdent::parse(&Self::name(properties)?)?;
        let schema_json = properties
            .get(TABLE_SCHEMA)
            .ok_or_else(|| HookError::catalog("schema property missing"))?;
        let schema = Schema::from_json(schema_json)?;
        let spec = match properties.get(PARTITION_SPEC) {
            Some(json) => PartitionSpec::from_json(&schema, json)?,
            None => PartitionSpec::unpartitioned(),
        };
        let location = properties.location().map_or_else(
            || format!("mem://warehouse/{}/{}", ident.namespace, ident.name),
            str::to_string,
        );
        let mut table_properties = properties.as_map().clone();
        for key in [TABLE_SCHEMA, PARTITION_SPEC, LOCATION, NAME] {
            table_properties.remove(key);
        }
        let metadata = TableMetadata::new(location, schema, spec, table_properties.clone());
        Ok((ident, metadata, table_properties))
    }
}

impl TableCatalog for InMemoryCatalog {
    fn is_native(&self, _properties: &CatalogProperties) -> bool {
        self.native
    }

    fn load_table(&self, properties: &CatalogProperties) -> HookResult<Option<CatalogTable>> {
        let name = Self::name(properties)?;
        self.record(CatalogOp::Load { name: name.clone() });
        self.check_failure(CatalogOpKind::Load)?;
        Ok(self.table(&name).map(|stored| CatalogTable {
            ident: stored.ident,
            location: stored.metadata.location,
            metadata_location: Some(stored.metadata_location),
            properties: stored.properties,
            io: Arc::new(self.io.clone()),
        }))
    }

    fn create_table(&self, properties: &CatalogProperties) -> HookResult<()> {
        let name = Self::name(properties)?;
        self.record(CatalogOp::Create { name: name.clone() });
        self.check_failure(CatalogOpKind::Create)?;
        if self.contains(&name) {
            return Err(HookError::catalog(format!("Table already exists: {name}")));
        }
        let (ident, metadata, table_properties) = Self::build_metadata(properties)?;
        self.store(ident, metadata, table_properties, None);
        Ok(())
    }

    fn drop_table(&self, properties: &CatalogProperties, purge: bool) -> HookResult<bool> {
        let name = Self::name(properties)?;
        self.record(CatalogOp::Drop {
            name: name.clone(),
            purge,
        });
        self.check_failure(CatalogOpKind::Drop)?;
        let Some(stored) = self.tables.lock().expect("lock").remove(&name) else {
            return Ok(false);
        };
        if purge {
            let root = format!("{}/", stored.metadata.location.trim_end_matches('/'));
            for status in self.io.list(&root)? {
                self.io.delete(&status.path)?;
            }
        }
        Ok(true)
    }

    fn import_table(&self, properties: &CatalogProperties, plan: &ImportPlan) -> HookResult<()> {
        let name = Self::name(properties)?;
        self.record(CatalogOp::Import {
            name: name.clone(),
            files: plan.files.len(),
        });
        self.check_failure(CatalogOpKind::Import)?;
        if self.contains(&name) {
            return Err(HookError::catalog(format!("Table already exists: {name}")));
        }
        let (ident, mut metadata, table_properties) = Self::build_metadata(properties)?;

        let manifest_list = format!(
            "{}/metadata/snap-1-{}.avro",
            metadata.location.trim_end_matches('/'),
            uuid::Uuid::new_v4()
        );
        let listing: Vec<&str> = plan.files.iter().map(|f| f.path.as_str()).collect();
        self.io.put(manifest_list.clone(), listing.join("\n"));

        let summary = HashMap::from([
            ("operation".to_string(), "append".to_string()),
            ("added-data-files".to_string(), plan.files.len().to_string()),
            ("added-files-size".to_string(), plan.total_bytes().to_string()),
        ]);
        let initial = Self::metadata_path(&metadata.location, 0);
        self.io.put(initial.clone(), metadata.to_vec()?);
        metadata.push_snapshot(manifest_list, summary, Some(initial));
        self.store(ident, metadata, table_properties, Some(plan.clone()));
        Ok(())
    }
}
