//! Partition spec resolution.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{HookError, HookResult};
use crate::legacy::FieldSchema;
use crate::properties::PARTITION_SPEC;
use crate::types::{PartitionSpec, Schema};

/// Derives the catalog partition spec of a registry table.
///
/// The serialized spec is read from the registry parameters rather than the
/// translated catalog properties, since translation drops it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartitionSpecResolver;

impl PartitionSpecResolver {
    /// Resolves the spec by precedence: explicit spec parameter, then one
    /// identity field per partition key, then unpartitioned.
    ///
    /// # Errors
    ///
    /// Returns a validation error when both an explicit spec and partition
    /// keys are given, or when a key or source column is missing from the
    /// schema.
    pub fn resolve(
        schema: &Schema,
        parameters: &HashMap<String, String>,
        partition_keys: &[FieldSchema],
    ) -> HookResult<PartitionSpec> {
        if let Some(json) = parameters.get(PARTITION_SPEC) {
            if !partition_keys.is_empty() {
                return Err(HookError::validation(format!(
                    "Provide only one of the following: registry partition keys, or the {PARTITION_SPEC} property"
                )));
            }
            debug!("using explicit partition spec property");
            return PartitionSpec::from_json(schema, json);
        }
        if partition_keys.is_empty() {
            return Ok(PartitionSpec::unpartitioned());
        }
        let names: Vec<&str> = partition_keys.iter().map(|k| k.name.as_str()).collect();
        PartitionSpec::identity(schema, &names)
    }
}
