//! Catalog table metadata files.
//!
//! Only the parts needed to locate a table's files are modelled; unknown
//! keys are ignored on read.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::partition::{PARTITION_DATA_ID_START, PartitionSpec};
use super::schema::Schema;
use crate::error::{HookError, HookResult};

/// Parsed catalog metadata file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Format version (1 or 2).
    #[serde(rename = "format-version")]
    pub format_version: i32,

    /// Unique table identifier.
    #[serde(rename = "table-uuid")]
    pub table_uuid: Uuid,

    /// Table location (root path for data and metadata).
    pub location: String,

    /// Last sequence number assigned.
    #[serde(rename = "last-sequence-number", default)]
    pub last_sequence_number: i64,

    /// Last updated timestamp in milliseconds.
    #[serde(rename = "last-updated-ms")]
    pub last_updated_ms: i64,

    /// Last assigned column ID.
    #[serde(rename = "last-column-id", default)]
    pub last_column_id: i32,

    /// Current schema ID.
    #[serde(rename = "current-schema-id", default)]
    pub current_schema_id: i32,

    /// All schemas.
    #[serde(default)]
    pub schemas: Vec<Schema>,

    /// Default partition spec ID.
    #[serde(rename = "default-spec-id", default)]
    pub default_spec_id: i32,

    /// Partition specs.
    #[serde(rename = "partition-specs", default)]
    pub partition_specs: Vec<PartitionSpec>,

    /// Highest assigned partition field ID.
    #[serde(rename = "last-partition-id", default)]
    pub last_partition_id: i32,

    /// Table properties.
    #[serde(default)]
    pub properties: HashMap<String, String>,

    /// Current snapshot ID.
    #[serde(rename = "current-snapshot-id", default)]
    pub current_snapshot_id: Option<i64>,

    /// All snapshots.
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,

    /// Metadata log (history of metadata files).
    #[serde(rename = "metadata-log", default)]
    pub metadata_log: Vec<MetadataLogEntry>,
}

/// Table snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Unique snapshot ID.
    #[serde(rename = "snapshot-id")]
    pub snapshot_id: i64,

    /// Parent snapshot ID.
    #[serde(rename = "parent-snapshot-id", skip_serializing_if = "Option::is_none", default)]
    pub parent_snapshot_id: Option<i64>,

    /// Timestamp in milliseconds.
    #[serde(rename = "timestamp-ms")]
    pub timestamp_ms: i64,

    /// Manifest list location.
    #[serde(rename = "manifest-list")]
    pub manifest_list: String,

    /// Snapshot summary.
    #[serde(default)]
    pub summary: HashMap<String, String>,
}

/// Entry in the metadata log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataLogEntry {
    /// Metadata file location.
    #[serde(rename = "metadata-file")]
    pub metadata_file: String,

    /// Timestamp in milliseconds.
    #[serde(rename = "timestamp-ms")]
    pub timestamp_ms: i64,
}

impl TableMetadata {
    /// Creates version-2 metadata for a new table with no snapshots.
    #[must_use]
    pub fn new(
        location: impl Into<String>,
        schema: Schema,
        spec: PartitionSpec,
        properties: HashMap<String, String>,
    ) -> Self {
        let last_partition_id = spec
            .fields
            .iter()
            .map(|f| f.field_id)
            .max()
            .unwrap_or(PARTITION_DATA_ID_START - 1);
        Self {
            format_version: 2,
            table_uuid: Uuid::new_v4(),
            location: location.into(),
            last_sequence_number: 0,
            last_updated_ms: Utc::now().timestamp_millis(),
            last_column_id: schema.highest_field_id(),
            current_schema_id: schema.schema_id,
            default_spec_id: spec.spec_id,
            schemas: vec![schema],
            partition_specs: vec![spec],
            last_partition_id,
            properties,
            current_snapshot_id: None,
            snapshots: Vec::new(),
            metadata_log: Vec::new(),
        }
    }

    /// Parses a metadata file.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the bytes are not valid metadata JSON.
    pub fn from_slice(bytes: &[u8]) -> HookResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| HookError::serialization(format!("Invalid table metadata: {e}")))
    }

    /// Serializes the metadata file.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    pub fn to_vec(&self) -> HookResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Returns the current schema, if present.
    #[must_use]
    pub fn current_schema(&self) -> Option<&Schema> {
        self.schemas
            .iter()
            .find(|s| s.schema_id == self.current_schema_id)
    }

    /// Returns the default partition spec, if present.
    #[must_use]
    pub fn default_spec(&self) -> Option<&PartitionSpec> {
        self.partition_specs
            .iter()
            .find(|s| s.spec_id == self.default_spec_id)
    }

    /// Appends a snapshot, makes it current, and records the metadata file
    /// it replaces in the metadata log.
    pub fn push_snapshot(
        &mut self,
        manifest_list: impl Into<String>,
        summary: HashMap<String, String>,
        previous_metadata_file: Option<String>,
    ) -> i64 {
        let timestamp_ms = Utc::now().timestamp_millis();
        let snapshot_id = self.snapshots.iter().map(|s| s.snapshot_id).max().unwrap_or(0) + 1;
        self.snapshots.push(Snapshot {
            snapshot_id,
            parent_snapshot_id: self.current_snapshot_id,
            timestamp_ms,
            manifest_list: manifest_list.into(),
            summary,
        });
        if let Some(metadata_file) = previous_metadata_file {
            self.metadata_log.push(MetadataLogEntry {
                metadata_file,
                timestamp_ms: self.last_updated_ms,
            });
        }
        self.current_snapshot_id = Some(snapshot_id);
        self.last_sequence_number += 1;
        self.last_updated_ms = timestamp_ms;
        snapshot_id
    }

    /// Files referenced by this metadata, excluding the metadata file itself:
    /// manifest lists and earlier metadata files, sorted and de-duplicated.
    #[must_use]
    pub fn referenced_files(&self) -> Vec<String> {
        let files: BTreeSet<String> = self
            .snapshots
            .iter()
            .map(|s| s.manifest_list.clone())
            .chain(self.metadata_log.iter().map(|m| m.metadata_file.clone()))
            .collect();
        files.into_iter().collect()
    }
}
