//! Registry-to-catalog property translation.
//!
//! Property keys are a wire contract shared with other engines reading the
//! same tables; the constants below must not change.

use std::collections::HashMap;

use crate::legacy::LegacyTable;
use crate::types::TableIdent;

/// Serialized schema supplied by the user or staged for creation.
pub const TABLE_SCHEMA: &str = "iceberg.mr.table.schema";
/// Serialized partition spec supplied by the user or staged for creation.
pub const PARTITION_SPEC: &str = "iceberg.mr.table.partition.spec";
/// Table location.
pub const LOCATION: &str = "location";
/// Table identifier (`namespace.name`).
pub const NAME: &str = "name";
/// Registry flag requesting data removal on drop.
pub const EXTERNAL_TABLE_PURGE: &str = "external.table.purge";
/// Catalog flag controlling garbage collection of table files.
pub const GC_ENABLED: &str = "gc.enabled";
/// Default data file format of the catalog table.
pub const DEFAULT_FILE_FORMAT: &str = "write.format.default";
/// Current metadata pointer kept in the registry.
pub const METADATA_LOCATION: &str = "metadata_location";
/// Previous metadata pointer kept in the registry.
pub const PREVIOUS_METADATA_LOCATION: &str = "previous_metadata_location";
/// Table-type marker parameter.
pub const TABLE_TYPE: &str = "table_type";
/// Table-type marker value.
pub const ICEBERG_TABLE_TYPE: &str = "ICEBERG";
/// Enables registry integration on natively-backed catalog tables.
pub const ENGINE_HIVE_ENABLED: &str = "engine.hive.enabled";

/// Registry parameters that only matter while creating a table.
pub const CREATION_ONLY_PARAMETERS: [&str; 3] = [TABLE_SCHEMA, LOCATION, NAME];

/// Registry parameters never echoed to the catalog.
pub const CATALOG_EXCLUDED_PROPERTIES: [&str; 3] =
    [METADATA_LOCATION, PREVIOUS_METADATA_LOCATION, PARTITION_SPEC];

/// Properties handed to the catalog for a single operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogProperties(HashMap<String, String>);

impl CatalogProperties {
    /// Creates an empty property set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a property value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns true if the property is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Sets a property, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Removes a property.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// The `location` property.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.get(LOCATION)
    }

    /// The `name` property.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.get(NAME)
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no properties are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all properties.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Borrows the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &HashMap<String, String> {
        &self.0
    }
}

impl From<HashMap<String, String>> for CatalogProperties {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

/// Returns true when the parameters request data removal on drop.
#[must_use]
pub fn purge_requested(parameters: &HashMap<String, String>) -> bool {
    parameters
        .get(EXTERNAL_TABLE_PURGE)
        .is_some_and(|v| v.eq_ignore_ascii_case("TRUE"))
}

/// Builds [`CatalogProperties`] from registry parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyTranslator {
    aliases: HashMap<String, String>,
}

impl PropertyTranslator {
    /// Creates a translator renaming keys through `aliases` (registry key to
    /// catalog key).
    #[must_use]
    pub fn new(aliases: HashMap<String, String>) -> Self {
        Self { aliases }
    }

    /// Translates registry parameters into catalog properties.
    ///
    /// Aliased keys are renamed; an explicit value under the catalog key
    /// wins over the aliased one. `location` and `name` are filled in when
    /// absent, and pointer and cached-spec keys are dropped.
    #[must_use]
    pub fn translate(
        &self,
        parameters: &HashMap<String, String>,
        location: Option<&str>,
        ident: &TableIdent,
    ) -> CatalogProperties {
        let mut properties = HashMap::with_capacity(parameters.len() + 2);
        for (key, value) in parameters {
            if !self.aliases.contains_key(key) {
                properties.insert(key.clone(), value.clone());
            }
        }
        for (key, value) in parameters {
            if let Some(alias) = self.aliases.get(key) {
                properties
                    .entry(alias.clone())
                    .or_insert_with(|| value.clone());
            }
        }

        if let Some(location) = location {
            properties
                .entry(LOCATION.to_string())
                .or_insert_with(|| location.to_string());
        }
        properties
            .entry(NAME.to_string())
            .or_insert_with(|| ident.to_string());

        for key in CATALOG_EXCLUDED_PROPERTIES {
            properties.remove(key);
        }

        CatalogProperties(properties)
    }

    /// Translates the current state of a registry table.
    #[must_use]
    pub fn for_table(&self, table: &LegacyTable) -> CatalogProperties {
        self.translate(&table.parameters, table.location(), &table.ident())
    }
}
