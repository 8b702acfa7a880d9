//! Table-format schema types.
//!
//! Primitive types serialize as strings (`"long"`, `"decimal(10, 2)"`,
//! `"fixed[16]"`); nested types serialize as objects tagged by `type`.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HookError, HookResult};

/// Primitive table-format types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PrimitiveType {
    /// Boolean type.
    Boolean,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 32-bit IEEE 754 floating point.
    Float,
    /// 64-bit IEEE 754 floating point.
    Double,
    /// Fixed-point decimal.
    Decimal {
        /// Total number of digits.
        precision: u32,
        /// Number of fractional digits.
        scale: u32,
    },
    /// Calendar date without time.
    Date,
    /// Time of day without date.
    Time,
    /// Timestamp without timezone.
    Timestamp,
    /// Timestamp with timezone.
    Timestamptz,
    /// Arbitrary-length character sequences.
    String,
    /// Universally unique identifier.
    Uuid,
    /// Fixed-length byte array.
    Fixed(u64),
    /// Arbitrary-length byte array.
    Binary,
}

/// Largest decimal precision the table format accepts.
pub const MAX_DECIMAL_PRECISION: u32 = 38;

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => f.write_str("boolean"),
            Self::Int => f.write_str("int"),
            Self::Long => f.write_str("long"),
            Self::Float => f.write_str("float"),
            Self::Double => f.write_str("double"),
            Self::Decimal { precision, scale } => write!(f, "decimal({precision}, {scale})"),
            Self::Date => f.write_str("date"),
            Self::Time => f.write_str("time"),
            Self::Timestamp => f.write_str("timestamp"),
            Self::Timestamptz => f.write_str("timestamptz"),
            Self::String => f.write_str("string"),
            Self::Uuid => f.write_str("uuid"),
            Self::Fixed(length) => write!(f, "fixed[{length}]"),
            Self::Binary => f.write_str("binary"),
        }
    }
}

impl FromStr for PrimitiveType {
    type Err = HookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let parsed = match lowered.as_str() {
            "boolean" => Self::Boolean,
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "date" => Self::Date,
            "time" => Self::Time,
            "timestamp" => Self::Timestamp,
            "timestamptz" => Self::Timestamptz,
            "string" => Self::String,
            "uuid" => Self::Uuid,
            "binary" => Self::Binary,
            other => {
                if let Some(args) = bracketed(other, "decimal(", ')') {
                    let (precision, scale) = args.split_once(',').ok_or_else(|| {
                        HookError::serialization(format!("Invalid decimal type: {s}"))
                    })?;
                    let precision = parse_number::<u32>(precision, s)?;
                    let scale = parse_number::<u32>(scale, s)?;
                    if precision == 0 || precision > MAX_DECIMAL_PRECISION || scale > precision {
                        return Err(HookError::serialization(format!(
                            "Invalid decimal type: {s}"
                        )));
                    }
                    Self::Decimal { precision, scale }
                } else if let Some(length) = bracketed(other, "fixed[", ']') {
                    Self::Fixed(parse_number::<u64>(length, s)?)
                } else {
                    return Err(HookError::serialization(format!(
                        "Unknown primitive type: {s}"
                    )));
                }
            }
        };
        Ok(parsed)
    }
}

fn bracketed<'a>(value: &'a str, open: &str, close: char) -> Option<&'a str> {
    value.strip_prefix(open)?.strip_suffix(close)
}

fn parse_number<T: FromStr>(raw: &str, original: &str) -> HookResult<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| HookError::serialization(format!("Invalid type parameter in {original}")))
}

impl TryFrom<String> for PrimitiveType {
    type Error = HookError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PrimitiveType> for String {
    fn from(value: PrimitiveType) -> Self {
        value.to_string()
    }
}

/// A table-format type (primitive or nested).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Type {
    /// A primitive type.
    Primitive(PrimitiveType),
    /// A nested type.
    Nested(NestedType),
}

/// Nested table-format types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NestedType {
    /// Structure with named fields.
    Struct {
        /// The nested fields.
        fields: Vec<NestedField>,
    },
    /// Ordered collection of elements.
    List {
        /// Field ID for element.
        #[serde(rename = "element-id")]
        element_id: i32,
        /// Element type.
        element: Box<Type>,
        /// Whether elements are required.
        #[serde(rename = "element-required")]
        element_required: bool,
    },
    /// Key-value collection.
    Map {
        /// Field ID for key.
        #[serde(rename = "key-id")]
        key_id: i32,
        /// Key type.
        key: Box<Type>,
        /// Field ID for value.
        #[serde(rename = "value-id")]
        value_id: i32,
        /// Value type.
        value: Box<Type>,
        /// Whether values are required.
        #[serde(rename = "value-required")]
        value_required: bool,
    },
}

/// A schema field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedField {
    /// Unique field ID within the schema.
    pub id: i32,
    /// Field name.
    pub name: String,
    /// Whether the field is required.
    pub required: bool,
    /// Field type.
    #[serde(rename = "type")]
    pub field_type: Type,
    /// Optional documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl NestedField {
    /// Creates an optional (nullable) field.
    #[must_use]
    pub fn optional(id: i32, name: impl Into<String>, field_type: Type) -> Self {
        Self {
            id,
            name: name.into(),
            required: false,
            field_type,
            doc: None,
        }
    }

    /// Attaches documentation.
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

/// A table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema type (always "struct" for table schemas).
    #[serde(rename = "type", default = "default_struct_type")]
    pub schema_type: String,
    /// Schema ID for evolution tracking.
    #[serde(rename = "schema-id", default)]
    pub schema_id: i32,
    /// Identifier fields (primary key).
    #[serde(
        rename = "identifier-field-ids",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub identifier_field_ids: Vec<i32>,
    /// Top-level fields, in column order.
    pub fields: Vec<NestedField>,
}

fn default_struct_type() -> String {
    "struct".to_string()
}

impl Schema {
    /// Creates a schema with ID 0 from the given top-level fields.
    #[must_use]
    pub fn new(fields: Vec<NestedField>) -> Self {
        Self {
            schema_type: default_struct_type(),
            schema_id: 0,
            identifier_field_ids: Vec::new(),
            fields,
        }
    }

    /// Parses and validates a serialized schema.
    ///
    /// # Errors
    ///
    /// Returns a serialization error for malformed JSON and a validation
    /// error when field IDs repeat or identifier fields are unknown.
    pub fn from_json(json: &str) -> HookResult<Self> {
        let schema: Self = serde_json::from_str(json)
            .map_err(|e| HookError::serialization(format!("Invalid schema JSON: {e}")))?;
        schema.validate()?;
        Ok(schema)
    }

    /// Serializes the schema to its canonical JSON form.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    pub fn to_json(&self) -> HookResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Checks structural invariants.
    ///
    /// # Errors
    ///
    /// Returns a validation error describing the first violation.
    pub fn validate(&self) -> HookResult<()> {
        if self.schema_type != "struct" {
            return Err(HookError::validation(format!(
                "Schema type must be struct, found {}",
                self.schema_type
            )));
        }

        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        collect_field_ids(&self.fields, &mut ids);
        for id in ids {
            if !seen.insert(id) {
                return Err(HookError::validation(format!(
                    "Duplicate field ID {id} in schema"
                )));
            }
        }

        for id in &self.identifier_field_ids {
            if !self.fields.iter().any(|f| f.id == *id) {
                return Err(HookError::validation(format!(
                    "Identifier field ID {id} is not a top-level field"
                )));
            }
        }
        Ok(())
    }

    /// Finds a top-level field by name, preferring an exact match.
    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<&NestedField> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name)))
    }

    /// Finds a field by ID at any struct nesting depth.
    #[must_use]
    pub fn field_by_id(&self, id: i32) -> Option<&NestedField> {
        find_field(&self.fields, id)
    }

    /// Returns the highest field ID in use (0 for an empty schema).
    #[must_use]
    pub fn highest_field_id(&self) -> i32 {
        let mut ids = Vec::new();
        collect_field_ids(&self.fields, &mut ids);
        ids.into_iter().max().unwrap_or(0)
    }
}

fn collect_field_ids(fields: &[NestedField], ids: &mut Vec<i32>) {
    for field in fields {
        ids.push(field.id);
        collect_type_ids(&field.field_type, ids);
    }
}

fn collect_type_ids(field_type: &Type, ids: &mut Vec<i32>) {
    match field_type {
        Type::Primitive(_) => {}
        Type::Nested(NestedType::Struct { fields }) => collect_field_ids(fields, ids),
        Type::Nested(NestedType::List {
            element_id,
            element,
            ..
        }) => {
            ids.push(*element_id);
            collect_type_ids(element, ids);
        }
        Type::Nested(NestedType::Map {
            key_id,
            key,
            value_id,
            value,
            ..
        }) => {
            ids.push(*key_id);
            ids.push(*value_id);
            collect_type_ids(key, ids);
            collect_type_ids(value, ids);
        }
    }
}

fn find_field(fields: &[NestedField], id: i32) -> Option<&NestedField> {
    for field in fields {
        if field.id == id {
            return Some(field);
        }
        if let Type::Nested(NestedType::Struct { fields: nested }) = &field.field_type {
            if let Some(found) = find_field(nested, id) {
                return Some(found);
            }
        }
    }
    None
}
