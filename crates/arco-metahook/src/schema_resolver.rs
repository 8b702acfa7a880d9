//! Registry column lists to catalog schemas.
//!
//! Registry types are parsed with a small recursive-descent parser over the
//! registry's type grammar (`array<map<string,int>>`,
//! `struct<a:int comment 'x',b:string>`, ...). Field IDs are assigned from 1,
//! a struct's own fields first and then their children, so the same column
//! list always yields the same schema.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{HookError, HookResult};
use crate::legacy::FieldSchema;
use crate::properties::{CatalogProperties, TABLE_SCHEMA};
use crate::types::{MAX_DECIMAL_PRECISION, NestedField, NestedType, PrimitiveType, Schema, Type};

const DEFAULT_DECIMAL_PRECISION: u32 = 10;

/// Derives the catalog schema of a registry table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchemaResolver {
    auto_conversion: bool,
}

impl SchemaResolver {
    /// Creates a resolver. With `auto_conversion`, narrow integer and
    /// bounded character types are widened instead of rejected.
    #[must_use]
    pub const fn new(auto_conversion: bool) -> Self {
        Self { auto_conversion }
    }

    /// Resolves the schema by precedence: explicit schema property, then
    /// columns followed by partition keys, then columns alone.
    ///
    /// # Errors
    ///
    /// Returns a serialization error for an invalid explicit schema and a
    /// schema error for registry types without a catalog equivalent.
    pub fn resolve(
        &self,
        properties: &CatalogProperties,
        columns: &[FieldSchema],
        partition_keys: &[FieldSchema],
    ) -> HookResult<Schema> {
        if let Some(json) = properties.get(TABLE_SCHEMA) {
            debug!("using explicit schema property");
            return Schema::from_json(json);
        }
        if partition_keys.is_empty() {
            self.convert(columns)
        } else {
            let all: Vec<FieldSchema> = columns.iter().chain(partition_keys).cloned().collect();
            self.convert(&all)
        }
    }

    /// Converts registry columns to a schema with fresh field IDs.
    ///
    /// # Errors
    ///
    /// Returns a schema error for unsupported or malformed types and a
    /// validation error for duplicate column names.
    pub fn convert(&self, columns: &[FieldSchema]) -> HookResult<Schema> {
        let mut seen = HashSet::new();
        let mut parsed = Vec::with_capacity(columns.len());
        for column in columns {
            if !seen.insert(column.name.to_ascii_lowercase()) {
                return Err(HookError::validation(format!(
                    "Duplicate column name {}",
                    column.name
                )));
            }
            let registry_type = TypeParser::new(&column.type_name, self.auto_conversion).parse()?;
            parsed.push(ParsedField {
                name: column.name.clone(),
                registry_type,
                comment: column.comment.clone(),
            });
        }

        let mut ids = IdAllocator { next: 1 };
        Ok(Schema::new(ids.struct_fields(parsed)))
    }
}

#[derive(Debug)]
enum RegistryType {
    Primitive(PrimitiveType),
    List(Box<RegistryType>),
    Map(Box<RegistryType>, Box<RegistryType>),
    Struct(Vec<ParsedField>),
}

#[derive(Debug)]
struct ParsedField {
    name: String,
    registry_type: RegistryType,
    comment: Option<String>,
}

struct IdAllocator {
    next: i32,
}

impl IdAllocator {
    fn take(&mut self) -> i32 {
        self.next += 1;
        self.next - 1
    }

    fn struct_fields(&mut self, fields: Vec<ParsedField>) -> Vec<NestedField> {
        let base = self.next;
        self.next += i32::try_from(fields.len()).unwrap_or(i32::MAX - base);
        (base..)
            .zip(fields)
            .map(|(id, field)| NestedField {
                id,
                name: field.name,
                required: false,
                field_type: self.convert(field.registry_type),
                doc: field.comment,
            })
            .collect()
    }

    fn convert(&mut self, registry_type: RegistryType) -> Type {
        match registry_type {
            RegistryType::Primitive(p) => Type::Primitive(p),
            RegistryType::List(element) => {
                let element_id = self.take();
                Type::Nested(NestedType::List {
                    element_id,
                    element: Box::new(self.convert(*element)),
                    element_required: false,
                })
            }
            RegistryType::Map(key, value) => {
                let key_id = self.take();
                let value_id = self.take();
                Type::Nested(NestedType::Map {
                    key_id,
                    key: Box::new(self.convert(*key)),
                    value_id,
                    value: Box::new(self.convert(*value)),
                    value_required: false,
                })
            }
            RegistryType::Struct(fields) => Type::Nested(NestedType::Struct {
                fields: self.struct_fields(fields),
            }),
        }
    }
}

struct TypeParser<'a> {
    input: &'a str,
    pos: usize,
    auto_conversion: bool,
}

impl<'a> TypeParser<'a> {
    fn new(input: &'a str, auto_conversion: bool) -> Self {
        Self {
            input,
            pos: 0,
            auto_conversion,
        }
    }

    fn parse(mut self) -> HookResult<RegistryType> {
        let parsed = self.parse_type()?;
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(self.malformed());
        }
        Ok(parsed)
    }

    fn malformed(&self) -> HookError {
        HookError::schema(format!(
            "Malformed type '{}' at position {}",
            self.input, self.pos
        ))
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.rest().chars().next()
    }

    fn expect(&mut self, expected: char) -> HookResult<()> {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            Ok(())
        } else {
            Err(self.malformed())
        }
    }

    fn word(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    /// Consumes `words` if they come next, case-insensitively.
    fn accept_words(&mut self, words: &[&str]) -> bool {
        let start = self.pos;
        for expected in words {
            match self.word() {
                Some(w) if w.eq_ignore_ascii_case(expected) => {}
                _ => {
                    self.pos = start;
                    return false;
                }
            }
        }
        true
    }

    fn number(&mut self) -> HookResult<u32> {
        let digits = self.word().ok_or_else(|| self.malformed())?;
        digits.parse::<u32>().map_err(|_| self.malformed())
    }

    fn field_name(&mut self) -> HookResult<String> {
        if self.peek() == Some('`') {
            self.pos += 1;
            let rest = self.rest();
            let end = rest.find('`').ok_or_else(|| self.malformed())?;
            self.pos += end + 1;
            return Ok(rest[..end].to_string());
        }
        self.word().map(str::to_string).ok_or_else(|| self.malformed())
    }

    fn quoted(&mut self) -> HookResult<String> {
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.malformed()),
        };
        self.pos += 1;
        let rest = self.rest();
        let end = rest.find(quote).ok_or_else(|| self.malformed())?;
        self.pos += end + 1;
        Ok(rest[..end].to_string())
    }

    fn narrow(&self, name: &str, widened: PrimitiveType) -> HookResult<RegistryType> {
        if self.auto_conversion {
            Ok(RegistryType::Primitive(widened))
        } else {
            Err(HookError::schema(format!(
                "Unsupported type {name}, use {widened} instead or enable automatic type conversion"
            )))
        }
    }

    fn parse_type(&mut self) -> HookResult<RegistryType> {
        let name = self.word().ok_or_else(|| self.malformed())?.to_ascii_lowercase();
        let primitive = |p| Ok(RegistryType::Primitive(p));
        match name.as_str() {
            "boolean" => primitive(PrimitiveType::Boolean),
            "tinyint" | "smallint" => self.narrow(&name, PrimitiveType::Int),
            "int" | "integer" => primitive(PrimitiveType::Int),
            "bigint" => primitive(PrimitiveType::Long),
            "float" => primitive(PrimitiveType::Float),
            "double" => {
                self.accept_words(&["precision"]);
                primitive(PrimitiveType::Double)
            }
            "decimal" => self.decimal(),
            "string" => primitive(PrimitiveType::String),
            "varchar" | "char" => {
                self.expect('(')?;
                self.number()?;
                self.expect(')')?;
                self.narrow(&name, PrimitiveType::String)
            }
            "date" => primitive(PrimitiveType::Date),
            "timestamp" => {
                if self.accept_words(&["with", "local", "time", "zone"]) {
                    primitive(PrimitiveType::Timestamptz)
                } else {
                    primitive(PrimitiveType::Timestamp)
                }
            }
            "binary" => primitive(PrimitiveType::Binary),
            "array" => {
                self.expect('<')?;
                let element = self.parse_type()?;
                self.expect('>')?;
                Ok(RegistryType::List(Box::new(element)))
            }
            "map" => {
                self.expect('<')?;
                let key = self.parse_type()?;
                self.expect(',')?;
                let value = self.parse_type()?;
                self.expect('>')?;
                Ok(RegistryType::Map(Box::new(key), Box::new(value)))
            }
            "struct" => self.struct_fields(),
            _ => Err(HookError::schema(format!("Unsupported type {name}"))),
        }
    }

    fn decimal(&mut self) -> HookResult<RegistryType> {
        let (mut precision, mut scale) = (DEFAULT_DECIMAL_PRECISION, 0);
        if self.peek() == Some('(') {
            self.expect('(')?;
            precision = self.number()?;
            if self.peek() == Some(',') {
                self.expect(',')?;
                scale = self.number()?;
            }
            self.expect(')')?;
        }
        if precision == 0 || precision > MAX_DECIMAL_PRECISION || scale > precision {
            return Err(HookError::schema(format!(
                "Invalid decimal({precision},{scale}) in '{}'",
                self.input
            )));
        }
        Ok(RegistryType::Primitive(PrimitiveType::Decimal { precision, scale }))
    }

    fn struct_fields(&mut self) -> HookResult<RegistryType> {
        self.expect('<')?;
        let mut fields = Vec::new();
        if self.peek() == Some('>') {
            self.expect('>')?;
            return Ok(RegistryType::Struct(fields));
        }
        loop {
            let name = self.field_name()?;
            self.expect(':')?;
            let registry_type = self.parse_type()?;
            let comment = if self.accept_words(&["comment"]) {
                Some(self.quoted()?)
            } else {
                None
            };
            fields.push(ParsedField {
                name,
                registry_type,
                comment,
            });
            match self.peek() {
                Some(',') => self.expect(',')?,
                Some('>') => {
                    self.expect('>')?;
                    return Ok(RegistryType::Struct(fields));
                }
                _ => return Err(self.malformed()),
            }
        }
    }
}
