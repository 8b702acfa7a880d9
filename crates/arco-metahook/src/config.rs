//! Hook configuration.

use std::collections::HashMap;

use arco_core::{Error, Result};

/// Default reader implementation stamped on migrated and created tables.
pub const DEFAULT_INPUT_FORMAT: &str = "org.apache.iceberg.mr.hive.HiveIcebergInputFormat";
/// Default writer implementation stamped on migrated and created tables.
pub const DEFAULT_OUTPUT_FORMAT: &str = "org.apache.iceberg.mr.hive.HiveIcebergOutputFormat";
/// Default serializer implementation stamped on migrated tables.
pub const DEFAULT_SERDE: &str = "org.apache.iceberg.mr.hive.HiveIcebergSerDe";
/// Default serde name stamped on migrated tables.
pub const DEFAULT_SERDE_NAME: &str = "icebergSerde";
/// Default prefix of the job-tracking keys written by the execution engine.
pub const DEFAULT_JOB_ID_KEY_PREFIX: &str = "hive.tez.commit.job.id";

/// Configuration for the lifecycle coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookConfig {
    /// Widen `tinyint`/`smallint` to `int` and `char`/`varchar` to `string`
    /// instead of rejecting them.
    pub schema_auto_conversion: bool,
    /// Prefix of `<prefix>.<namespace.table>` job-tracking keys.
    pub job_id_key_prefix: String,
    /// Registry property names renamed into the catalog namespace.
    pub property_aliases: HashMap<String, String>,
    /// Reader implementation for table-format tables.
    pub input_format: String,
    /// Writer implementation for table-format tables.
    pub output_format: String,
    /// Serializer implementation for table-format tables.
    pub serde_lib: String,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            schema_auto_conversion: false,
            job_id_key_prefix: DEFAULT_JOB_ID_KEY_PREFIX.to_string(),
            property_aliases: default_property_aliases(),
            input_format: DEFAULT_INPUT_FORMAT.to_string(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            serde_lib: DEFAULT_SERDE.to_string(),
        }
    }
}

/// Registry names that differ from their catalog counterparts.
#[must_use]
pub fn default_property_aliases() -> HashMap<String, String> {
    HashMap::from([("external.table.purge".to_string(), "gc.enabled".to_string())])
}

impl HookConfig {
    /// Loads configuration from environment variables.
    ///
    /// Supported variables:
    /// - `ARCO_METAHOOK_SCHEMA_AUTO_CONVERSION`
    /// - `ARCO_METAHOOK_JOB_ID_KEY_PREFIX`
    /// - `ARCO_METAHOOK_PROPERTY_ALIASES` (`from=to,from=to`)
    /// - `ARCO_METAHOOK_INPUT_FORMAT`
    /// - `ARCO_METAHOOK_OUTPUT_FORMAT`
    /// - `ARCO_METAHOOK_SERDE`
    ///
    /// # Errors
    ///
    /// Returns an error if any environment variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is present but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |name: &str| lookup(name).and_then(|v| non_empty(&v));

        if let Some(value) = var("ARCO_METAHOOK_SCHEMA_AUTO_CONVERSION") {
            config.schema_auto_conversion =
                parse_bool("ARCO_METAHOOK_SCHEMA_AUTO_CONVERSION", &value)?;
        }
        if let Some(prefix) = var("ARCO_METAHOOK_JOB_ID_KEY_PREFIX") {
            config.job_id_key_prefix = prefix;
        }
        if let Some(aliases) = var("ARCO_METAHOOK_PROPERTY_ALIASES") {
            config.property_aliases = parse_aliases("ARCO_METAHOOK_PROPERTY_ALIASES", &aliases)?;
        }
        if let Some(format) = var("ARCO_METAHOOK_INPUT_FORMAT") {
            config.input_format = format;
        }
        if let Some(format) = var("ARCO_METAHOOK_OUTPUT_FORMAT") {
            config.output_format = format;
        }
        if let Some(serde_lib) = var("ARCO_METAHOOK_SERDE") {
            config.serde_lib = serde_lib;
        }

        Ok(config)
    }

    /// Enables or disables schema auto-conversion.
    #[must_use]
    pub fn with_schema_auto_conversion(mut self, enabled: bool) -> Self {
        self.schema_auto_conversion = enabled;
        self
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    let value = value.trim().to_ascii_lowercase();
    match value.as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => Err(Error::InvalidInput(format!(
            "{name} must be a boolean (true/false/1/0)"
        ))),
    }
}

fn parse_aliases(name: &str, value: &str) -> Result<HashMap<String, String>> {
    let mut aliases = HashMap::new();
    for pair in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((from, to)) = pair.split_once('=') else {
            return Err(Error::InvalidInput(format!(
                "{name} entries must look like from=to (got {pair})"
            )));
        };
        let (from, to) = (from.trim(), to.trim());
        if from.is_empty() || to.is_empty() {
            return Err(Error::InvalidInput(format!(
                "{name} entries must name both sides (got {pair})"
            )));
        }
        aliases.insert(from.to_string(), to.to_string());
    }
    Ok(aliases)
}
