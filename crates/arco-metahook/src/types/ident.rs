//! Table identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{HookError, HookResult};

/// Catalog table identifier: a namespace and a table name.
///
/// Derived from the registry's database and table name; renders as
/// `namespace.name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableIdent {
    /// Namespace (registry database) containing the table.
    pub namespace: String,
    /// Table name.
    pub name: String,
}

impl TableIdent {
    /// Creates a new table identifier.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parses `namespace.name`, splitting on the last dot.
    ///
    /// # Errors
    ///
    /// Returns a validation error if either side is empty or no dot is present.
    pub fn parse(value: &str) -> HookResult<Self> {
        match value.rsplit_once('.') {
            Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
                Ok(Self::new(namespace, name))
            }
            _ => Err(HookError::validation(format!(
                "Invalid table identifier '{value}', expected namespace.name"
            ))),
        }
    }
}

impl fmt::Display for TableIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}
