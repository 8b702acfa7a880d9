//! Hook error types and status reporting.
//!
//! Every failure surfaced to the registry carries a SQL state and a vendor
//! error code so the host can render it without inspecting variants.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for hook operations.
pub type HookResult<T> = Result<T, HookError>;

/// Informational message attached to every error status report.
pub const DEFAULT_INFO_MESSAGE: &str = "Server-side error; please check metastore logs.";

/// Errors raised by the lifecycle hook and its collaborators.
#[derive(Debug, Error)]
pub enum HookError {
    /// Mutually exclusive options, missing location and similar input errors.
    #[error("Validation failed: {message}")]
    Validation {
        /// Human-readable error message.
        message: String,
    },

    /// The registry table cannot be migrated in place. Never retryable.
    #[error("Migration not allowed for table {table}: {reason}")]
    MigrationNotAllowed {
        /// Fully qualified table name.
        table: String,
        /// Every violated eligibility condition.
        reason: String,
    },

    /// A registry column type has no catalog equivalent.
    #[error("Unsupported schema: {message}")]
    Schema {
        /// Human-readable error message.
        message: String,
    },

    /// Schema, partition spec or metadata JSON could not be (de)serialized.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Human-readable error message.
        message: String,
    },

    /// The table catalog rejected or failed a call.
    #[error("Catalog error: {message}")]
    Catalog {
        /// Human-readable error message.
        message: String,
    },

    /// A file-IO call failed.
    #[error("File IO error on {path}: {message}")]
    Io {
        /// Path the operation was applied to.
        path: String,
        /// Human-readable error message.
        message: String,
    },

    /// Job commit failed and the job was aborted cleanly.
    #[error("Unable to commit job {job_id}: {source}")]
    CommitFailed {
        /// Job whose commit failed.
        job_id: String,
        /// The original commit failure.
        #[source]
        source: Box<HookError>,
    },

    /// Job commit failed and so did the abort; data files may be left behind.
    #[error("Unable to commit and abort job {job_id}: commit failed: {commit}; abort failed: {abort}")]
    CommitAndAbortFailed {
        /// Job whose commit failed.
        job_id: String,
        /// The original commit failure.
        #[source]
        commit: Box<HookError>,
        /// The failure raised by the abort attempt.
        abort: Box<HookError>,
    },

    /// Unexpected failure.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
    },
}

impl HookError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates an unsupported-schema error.
    #[must_use]
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a catalog error.
    #[must_use]
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    /// Creates a file-IO error for `path`.
    #[must_use]
    pub fn io(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the SQL state reported to registry clients.
    #[must_use]
    pub const fn sql_state(&self) -> &'static str {
        match self {
            Self::Validation { .. } | Self::MigrationNotAllowed { .. } => "42000",
            Self::Schema { .. } => "0A000",
            Self::Serialization { .. } => "22000",
            Self::Catalog { .. } => "08S01",
            Self::Io { .. } => "58030",
            Self::CommitFailed { .. } | Self::CommitAndAbortFailed { .. } => "40000",
            Self::Internal { .. } => "XX000",
        }
    }

    /// Returns the vendor error code reported to registry clients.
    #[must_use]
    pub const fn error_code(&self) -> i32 {
        match self {
            Self::Validation { .. } => 10001,
            Self::MigrationNotAllowed { .. } => 10002,
            Self::Schema { .. } => 10003,
            Self::Serialization { .. } => 10004,
            Self::Catalog { .. } => 20001,
            Self::Io { .. } => 20002,
            Self::CommitFailed { .. } => 30001,
            Self::CommitAndAbortFailed { .. } => 30002,
            Self::Internal { .. } => 40000,
        }
    }

    /// Returns true when re-running the statement may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Catalog { .. } | Self::Io { .. } | Self::CommitFailed { .. }
        )
    }
}

impl From<arco_core::Error> for HookError {
    fn from(err: arco_core::Error) -> Self {
        let arco_core::Error::InvalidInput(message) = err;
        Self::Validation { message }
    }
}

impl From<serde_json::Error> for HookError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

/// Outcome class of a [`StatusReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusKind {
    /// The statement succeeded.
    Success,
    /// The statement failed.
    Error,
}

/// Wire representation of a statement outcome returned to registry clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Outcome class.
    pub status: StatusKind,
    /// SQL state, absent for errors raised outside the hook.
    #[serde(rename = "sql-state", skip_serializing_if = "Option::is_none")]
    pub sql_state: Option<String>,
    /// Vendor error code (0 when unknown).
    #[serde(rename = "error-code")]
    pub error_code: i32,
    /// Human-readable error message.
    #[serde(rename = "error-message", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Additional informational lines.
    #[serde(rename = "info-messages", default)]
    pub info_messages: Vec<String>,
}

impl StatusReport {
    /// Report for a successful statement.
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: StatusKind::Success,
            sql_state: None,
            error_code: 0,
            error_message: None,
            info_messages: Vec::new(),
        }
    }

    /// Converts any error into a report.
    ///
    /// Hook errors keep their SQL state and code; other errors carry only
    /// their message.
    #[must_use]
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        if let Some(hook) = err.downcast_ref::<HookError>() {
            return Self::from(hook);
        }
        Self {
            status: StatusKind::Error,
            sql_state: None,
            error_code: 0,
            error_message: Some(err.to_string()),
            info_messages: vec![DEFAULT_INFO_MESSAGE.to_string()],
        }
    }
}

impl From<&HookError> for StatusReport {
    fn from(err: &HookError) -> Self {
        Self {
            status: StatusKind::Error,
            sql_state: Some(err.sql_state().to_string()),
            error_code: err.error_code(),
            error_message: Some(err.to_string()),
            info_messages: vec![DEFAULT_INFO_MESSAGE.to_string()],
        }
    }
}
