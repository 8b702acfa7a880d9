//! Write-job commit protocol.
//!
//! The execution engine records the job id of each write under
//! `<prefix>.<namespace.table>`. Commit runs exactly once; on failure the
//! job is aborted exactly once and the outcome is reported as either a
//! recoverable [`HookError::CommitFailed`] or, when the abort fails too, a
//! [`HookError::CommitAndAbortFailed`] that may leave orphaned data files.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arco_core::observability::job_span;
use tracing::{error, info};

use crate::error::{HookError, HookResult};
use crate::metrics;
use crate::types::TableIdent;

/// Engine job identifier of the form `job_<tracker>_<sequence>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId {
    /// Tracker (cluster start) identifier.
    pub tracker: String,
    /// Job sequence number within the tracker.
    pub sequence: u32,
}

impl JobId {
    /// Parses `job_<tracker>_<sequence>`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the value is malformed.
    pub fn parse(value: &str) -> HookResult<Self> {
        let malformed = || HookError::validation(format!("Malformed job id '{value}'"));
        let mut parts = value.split('_');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("job"), Some(tracker), Some(sequence), None)
                if !tracker.is_empty()
                    && !sequence.is_empty()
                    && sequence.bytes().all(|b| b.is_ascii_digit()) =>
            {
                Ok(Self {
                    tracker: tracker.to_string(),
                    sequence: sequence.parse().map_err(|_| malformed())?,
                })
            }
            _ => Err(malformed()),
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job_{}_{:04}", self.tracker, self.sequence)
    }
}

/// Final state reported to [`OutputCommitter::abort_job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// The job failed.
    Failed,
}

/// What the committer needs to finish a write job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobContext {
    /// Job being committed.
    pub job_id: JobId,
    /// Target table.
    pub table: TableIdent,
    /// Target table location.
    pub table_location: String,
}

/// Finalizes or discards the output of a write job.
pub trait OutputCommitter: Send + Sync + 'static {
    /// Publishes the job's output.
    ///
    /// # Errors
    ///
    /// Returns any failure; the caller will abort the job.
    fn commit_job(&self, context: &JobContext) -> HookResult<()>;

    /// Discards the job's output.
    ///
    /// # Errors
    ///
    /// Returns any failure; uncleaned files may remain.
    fn abort_job(&self, context: &JobContext, state: JobState) -> HookResult<()>;
}

/// Job-tracking metadata published by the execution engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobTracking(HashMap<String, String>);

impl JobTracking {
    /// Creates empty tracking metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the job id of a write to `table`.
    pub fn record(&mut self, prefix: &str, table: &TableIdent, job_id: &JobId) {
        self.0
            .insert(Self::key(prefix, table), job_id.to_string());
    }

    /// Resolves the job id recorded for `table`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if no id is recorded or it is malformed.
    pub fn job_id(&self, prefix: &str, table: &TableIdent) -> HookResult<JobId> {
        let key = Self::key(prefix, table);
        let raw = self
            .0
            .get(&key)
            .ok_or_else(|| HookError::validation(format!("No job id recorded under {key}")))?;
        JobId::parse(raw)
    }

    fn key(prefix: &str, table: &TableIdent) -> String {
        format!("{prefix}.{table}")
    }
}

impl From<HashMap<String, String>> for JobTracking {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

/// Runs the commit-or-abort protocol for a write job.
#[derive(Clone)]
pub struct JobCommitCoordinator {
    committer: Arc<dyn OutputCommitter>,
    key_prefix: String,
}

impl fmt::Debug for JobCommitCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobCommitCoordinator")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

impl JobCommitCoordinator {
    /// Creates a coordinator resolving job ids under `key_prefix`.
    #[must_use]
    pub fn new(committer: Arc<dyn OutputCommitter>, key_prefix: impl Into<String>) -> Self {
        Self {
            committer,
            key_prefix: key_prefix.into(),
        }
    }

    /// Commits the write job recorded for `table`, aborting it once if the
    /// commit fails. Never retries.
    ///
    /// # Errors
    ///
    /// - validation error if the location or job id is missing or malformed;
    /// - [`HookError::CommitFailed`] if commit failed and abort succeeded;
    /// - [`HookError::CommitAndAbortFailed`] if both failed.
    pub fn commit(
        &self,
        table: &TableIdent,
        table_location: Option<&str>,
        tracking: &JobTracking,
    ) -> HookResult<()> {
        let table_location =
            table_location.ok_or_else(|| HookError::validation("Table location not set"))?;
        let job_id = tracking.job_id(&self.key_prefix, table)?;
        let context = JobContext {
            job_id,
            table: table.clone(),
            table_location: table_location.to_string(),
        };
        let job = context.job_id.to_string();
        let span = job_span(&job, &context.table.to_string());
        let _guard = span.enter();

        let Err(commit_err) = self.committer.commit_job(&context) else {
            info!("committed job");
            metrics::record_job_commit("committed");
            return Ok(());
        };

        error!(error = %commit_err, "error while trying to commit job, aborting it");
        match self.committer.abort_job(&context, JobState::Failed) {
            Ok(()) => {
                metrics::record_job_commit("aborted");
                Err(HookError::CommitFailed {
                    job_id: job,
                    source: Box::new(commit_err),
                })
            }
            Err(abort_err) => {
                error!(
                    error = %abort_err,
                    "error while trying to abort failed job, there might be uncleaned data files"
                );
                metrics::record_job_commit("abort_failed");
                Err(HookError::CommitAndAbortFailed {
                    job_id: job,
                    commit: Box::new(commit_err),
                    abort: Box::new(abort_err),
                })
            }
        }
    }
}
