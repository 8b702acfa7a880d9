//! Partition specifications.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::schema::{Schema, Type};
use crate::error::{HookError, HookResult};

/// First ID assigned to partition fields.
pub const PARTITION_DATA_ID_START: i32 = 1000;

/// Partition transform applied to a source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Transform {
    /// Source value, unmodified.
    Identity,
    /// Hash of the source value modulo N.
    Bucket(u32),
    /// Source value truncated to width W.
    Truncate(u32),
    /// Years since epoch.
    Year,
    /// Months since epoch.
    Month,
    /// Days since epoch.
    Day,
    /// Hours since epoch.
    Hour,
    /// Always null.
    Void,
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("identity"),
            Self::Bucket(n) => write!(f, "bucket[{n}]"),
            Self::Truncate(w) => write!(f, "truncate[{w}]"),
            Self::Year => f.write_str("year"),
            Self::Month => f.write_str("month"),
            Self::Day => f.write_str("day"),
            Self::Hour => f.write_str("hour"),
            Self::Void => f.write_str("void"),
        }
    }
}

impl FromStr for Transform {
    type Err = HookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let width = |prefix: &str| -> Option<HookResult<u32>> {
            let inner = lowered.strip_prefix(prefix)?.strip_suffix(']')?;
            Some(
                inner
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| {
                        HookError::serialization(format!("Invalid transform parameter: {s}"))
                    }),
            )
        };

        match lowered.as_str() {
            "identity" => Ok(Self::Identity),
            "year" => Ok(Self::Year),
            "month" => Ok(Self::Month),
            "day" => Ok(Self::Day),
            "hour" => Ok(Self::Hour),
            "void" => Ok(Self::Void),
            _ => {
                if let Some(n) = width("bucket[") {
                    return n.map(Self::Bucket);
                }
                if let Some(w) = width("truncate[") {
                    return w.map(Self::Truncate);
                }
                Err(HookError::serialization(format!("Unknown transform: {s}")))
            }
        }
    }
}

impl TryFrom<String> for Transform {
    type Error = HookError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Transform> for String {
    fn from(value: Transform) -> Self {
        value.to_string()
    }
}

/// A field in a partition specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionField {
    /// Partition field name.
    pub name: String,
    /// Transform applied to the source column.
    pub transform: Transform,
    /// Source column ID.
    #[serde(rename = "source-id")]
    pub source_id: i32,
    /// Partition field ID.
    #[serde(rename = "field-id")]
    pub field_id: i32,
}

/// Partition specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSpec {
    /// Spec ID.
    #[serde(rename = "spec-id")]
    pub spec_id: i32,
    /// Partition fields, in partition order.
    #[serde(default)]
    pub fields: Vec<PartitionField>,
}

#[derive(Deserialize)]
struct UnboundSpec {
    #[serde(rename = "spec-id", default)]
    spec_id: i32,
    #[serde(default)]
    fields: Vec<UnboundField>,
}

#[derive(Deserialize)]
struct UnboundField {
    name: String,
    transform: Transform,
    #[serde(rename = "source-id")]
    source_id: i32,
    #[serde(rename = "field-id", default)]
    field_id: Option<i32>,
}

impl PartitionSpec {
    /// The unpartitioned spec.
    #[must_use]
    pub fn unpartitioned() -> Self {
        Self {
            spec_id: 0,
            fields: Vec::new(),
        }
    }

    /// Returns true when the spec has no partition fields.
    #[must_use]
    pub fn is_unpartitioned(&self) -> bool {
        self.fields.is_empty()
    }

    /// Builds an identity spec with one field per column name, in order.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a name does not resolve to a schema column.
    pub fn identity(schema: &Schema, names: &[&str]) -> HookResult<Self> {
        let mut fields = Vec::with_capacity(names.len());
        for (field_id, name) in (PARTITION_DATA_ID_START..).zip(names) {
            let source = schema.field_by_name(name).ok_or_else(|| {
                HookError::validation(format!("Partition column {name} not found in schema"))
            })?;
            fields.push(PartitionField {
                name: source.name.clone(),
                transform: Transform::Identity,
                source_id: source.id,
                field_id,
            });
        }
        let spec = Self { spec_id: 0, fields };
        spec.validate(schema)?;
        Ok(spec)
    }

    /// Parses a serialized spec and binds it to `schema`.
    ///
    /// Fields without a `field-id` get IDs assigned from
    /// [`PARTITION_DATA_ID_START`], skipping IDs already taken.
    ///
    /// # Errors
    ///
    /// Returns a serialization error for malformed JSON and a validation
    /// error if the spec does not fit the schema.
    pub fn from_json(schema: &Schema, json: &str) -> HookResult<Self> {
        let unbound: UnboundSpec = serde_json::from_str(json)
            .map_err(|e| HookError::serialization(format!("Invalid partition spec JSON: {e}")))?;

        let taken: HashSet<i32> = unbound.fields.iter().filter_map(|f| f.field_id).collect();
        let mut next_id = PARTITION_DATA_ID_START;
        let mut fields = Vec::with_capacity(unbound.fields.len());
        for field in unbound.fields {
            let field_id = if let Some(id) = field.field_id {
                id
            } else {
                while taken.contains(&next_id) {
                    next_id += 1;
                }
                next_id += 1;
                next_id - 1
            };
            fields.push(PartitionField {
                name: field.name,
                transform: field.transform,
                source_id: field.source_id,
                field_id,
            });
        }

        let spec = Self {
            spec_id: unbound.spec_id,
            fields,
        };
        spec.validate(schema)?;
        Ok(spec)
    }

    /// Serializes the spec to its canonical JSON form.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    pub fn to_json(&self) -> HookResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Checks that every source column exists and is primitive, and that
    /// partition names and IDs are unique.
    ///
    /// # Errors
    ///
    /// Returns a validation error describing the first violation.
    pub fn validate(&self, schema: &Schema) -> HookResult<()> {
        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for field in &self.fields {
            let Some(source) = schema.field_by_id(field.source_id) else {
                return Err(HookError::validation(format!(
                    "Cannot find source column {} for partition field {}",
                    field.source_id, field.name
                )));
            };
            if field.transform != Transform::Void
                && !matches!(source.field_type, Type::Primitive(_))
            {
                return Err(HookError::validation(format!(
                    "Cannot partition by non-primitive column {}",
                    source.name
                )));
            }
            if !names.insert(field.name.as_str()) {
                return Err(HookError::validation(format!(
                    "Duplicate partition field name {}",
                    field.name
                )));
            }
            if !ids.insert(field.field_id) {
                return Err(HookError::validation(format!(
                    "Duplicate partition field ID {}",
                    field.field_id
                )));
            }
        }
        Ok(())
    }
}
