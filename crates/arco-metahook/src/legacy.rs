//! Legacy registry records as seen by the hook.
//!
//! These mirror the registry's own table, storage descriptor and partition
//! records. The hook mutates them in place during `pre_*` phases; the registry
//! persists whatever the hook leaves behind.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::TableIdent;

/// Table type of registry tables whose data the registry does not own.
pub const EXTERNAL_TABLE_TYPE: &str = "EXTERNAL_TABLE";
/// Table type of registry-owned tables.
pub const MANAGED_TABLE_TYPE: &str = "MANAGED_TABLE";
/// Environment-context flag letting an alter drop the partition keys.
pub const ALLOW_PARTITION_KEY_CHANGE: &str = "allow_partition_key_change";

/// A registry column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    /// Column name.
    pub name: String,
    /// Registry type string, e.g. `array<int>`.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Column comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl FieldSchema {
    /// Creates a column without a comment.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            comment: None,
        }
    }

    /// Attaches a comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Serializer settings of a storage descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerDeInfo {
    /// Serde name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Serializer implementation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialization_lib: Option<String>,
    /// Serializer parameters.
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

/// Physical layout of a registry table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageDescriptor {
    /// Data location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Reader implementation name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_format: Option<String>,
    /// Writer implementation name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
    /// Serializer settings.
    #[serde(default)]
    pub serde_info: SerDeInfo,
    /// Data columns, in order.
    #[serde(default)]
    pub columns: Vec<FieldSchema>,
}

/// A registry table record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTable {
    /// Database (catalog namespace).
    pub db_name: String,
    /// Table name.
    pub table_name: String,
    /// Registry table type, e.g. [`EXTERNAL_TABLE_TYPE`].
    pub table_type: String,
    /// Session-scoped table.
    #[serde(default)]
    pub temporary: bool,
    /// Table parameters.
    #[serde(default)]
    pub parameters: HashMap<String, String>,
    /// Storage descriptor.
    #[serde(default)]
    pub storage: StorageDescriptor,
    /// Partition key columns, in partition order.
    #[serde(default)]
    pub partition_keys: Vec<FieldSchema>,
}

impl LegacyTable {
    /// Catalog identifier of this table.
    #[must_use]
    pub fn ident(&self) -> TableIdent {
        TableIdent::new(&self.db_name, &self.table_name)
    }

    /// Returns a parameter value.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Storage location, if set and non-empty.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.storage.location.as_deref().filter(|l| !l.is_empty())
    }

    /// External tables have type `EXTERNAL_TABLE` or parameter `EXTERNAL=TRUE`.
    #[must_use]
    pub fn is_external(&self) -> bool {
        self.table_type.eq_ignore_ascii_case(EXTERNAL_TABLE_TYPE)
            || self
                .parameter("EXTERNAL")
                .is_some_and(|v| v.eq_ignore_ascii_case("TRUE"))
    }

    /// Transactional tables carry `transactional=true`.
    #[must_use]
    pub fn is_transactional(&self) -> bool {
        self.parameter("transactional")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    /// Moves the partition keys to the end of the column list.
    pub fn fold_partition_keys(&mut self) {
        let keys = std::mem::take(&mut self.partition_keys);
        self.storage.columns.extend(keys);
    }
}

/// A registry partition: its key values and data location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyPartition {
    /// Partition values, in partition-key order.
    pub values: Vec<String>,
    /// Partition data location.
    pub location: String,
}

impl LegacyPartition {
    /// Creates a partition record.
    #[must_use]
    pub fn new(values: Vec<String>, location: impl Into<String>) -> Self {
        Self {
            values,
            location: location.into(),
        }
    }
}

/// Free-form properties the registry passes alongside an alter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnvironmentContext {
    /// Context properties.
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl EnvironmentContext {
    /// Lets the registry accept the partition keys disappearing in this alter.
    pub fn allow_partition_key_change(&mut self) {
        self.properties
            .insert(ALLOW_PARTITION_KEY_CHANGE.to_string(), "true".to_string());
    }

    /// Whether a partition key change has been allowed.
    #[must_use]
    pub fn partition_key_change_allowed(&self) -> bool {
        self.properties
            .get(ALLOW_PARTITION_KEY_CHANGE)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }
}
