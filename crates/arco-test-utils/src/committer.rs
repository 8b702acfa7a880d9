//! Scripted output committer.

use std::sync::Mutex;

use arco_metahook::OutputCommitter;
use arco_metahook::committer::{JobContext, JobState};
use arco_metahook::error::{HookError, HookResult};

/// Record of a committer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitterCall {
    /// `commit_job`.
    Commit(JobContext),
    /// `abort_job`.
    Abort(JobContext, JobState),
}

/// [`OutputCommitter`] whose commit and abort outcomes are fixed up front.
#[derive(Debug, Default)]
pub struct ScriptedCommitter {
    commit_error: Option<String>,
    abort_error: Option<String>,
    calls: Mutex<Vec<CommitterCall>>,
}

impl ScriptedCommitter {
    /// A committer whose calls all succeed.
    pub fn succeeding() -> Self {
        Self::default()
    }

    /// Makes `commit_job` fail with `message`.
    #[must_use]
    pub fn failing_commit(mut self, message: impl Into<String>) -> Self {
        self.commit_error = Some(message.into());
        self
    }

    /// Makes `abort_job` fail with `message`.
    #[must_use]
    pub fn failing_abort(mut self, message: impl Into<String>) -> Self {
        self.abort_error = Some(message.into());
        self
    }

    /// Returns all recorded calls.
    pub fn calls(&self) -> Vec<CommitterCall> {
        self.calls.lock().expect("lock").clone()
    }

    /// Number of `commit_job` calls.
    pub fn commit_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, CommitterCall::Commit(_)))
            .count()
    }

    /// Number of `abort_job` calls.
    pub fn abort_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, CommitterCall::Abort(..)))
            .count()
    }
}

impl OutputCommitter for ScriptedCommitter {
    fn commit_job(&self, context: &JobContext) -> HookResult<()> {
        self.calls
            .lock()
            .expect("lock")
            .push(CommitterCall::Commit(context.clone()));
        match &self.commit_error {
            Some(message) => Err(HookError::io(&context.table_location, message.clone())),
            None => Ok(()),
        }
    }

    fn abort_job(&self, context: &JobContext, state: JobState) -> HookResult<()> {
        self.calls
            .lock()
            .expect("lock")
            .push(CommitterCall::Abort(context.clone(), state));
        match &self.abort_error {
            Some(message) => Err(HookError::io(&context.table_location, message.clone())),
            None => Ok(()),
        }
    }
}
