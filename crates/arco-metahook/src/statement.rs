//! Host-side statement driver.
//!
//! Runs a registry action between the hook phases: `pre`, the action, then
//! `commit`. When the action fails, `rollback` runs instead of `commit` and
//! the action's error is returned; a failing rollback is only logged.

use tracing::warn;

use crate::committer::JobTracking;
use crate::error::{HookError, HookResult, StatusReport};
use crate::hook::MetaHook;
use crate::legacy::{EnvironmentContext, LegacyPartition, LegacyTable};

/// Drives statements through a [`MetaHook`].
#[derive(Debug)]
pub struct StatementDriver<'h, H> {
    hook: &'h H,
}

fn log_rollback_failure(phase: &str, table: &LegacyTable, result: HookResult<()>) {
    if let Err(err) = result {
        warn!(phase, table = %table.ident(), error = %err, "rollback failed");
    }
}

impl<'h, H: MetaHook> StatementDriver<'h, H> {
    /// Creates a driver over `hook`.
    #[must_use]
    pub fn new(hook: &'h H) -> Self {
        Self { hook }
    }

    /// `CREATE TABLE`: `registry` persists the (rewritten) record.
    ///
    /// # Errors
    ///
    /// Returns the first failure of `pre_create`, the registry action or
    /// `commit_create`.
    pub fn create_table<R>(
        &self,
        table: &mut LegacyTable,
        registry: impl FnOnce(&LegacyTable) -> HookResult<R>,
    ) -> HookResult<R> {
        let state = self.hook.pre_create(table)?;
        let output = match registry(table) {
            Ok(output) => output,
            Err(err) => {
                log_rollback_failure(
                    "rollback_create",
                    table,
                    self.hook.rollback_create(table, state),
                );
                return Err(err);
            }
        };
        self.hook.commit_create(table, state)?;
        Ok(output)
    }

    /// `DROP TABLE`: `registry` removes the record.
    ///
    /// # Errors
    ///
    /// Returns the failure of `pre_drop` or the registry action. Cleanup
    /// after a successful registry drop never fails the statement.
    pub fn drop_table<R>(
        &self,
        table: &LegacyTable,
        delete_data: bool,
        registry: impl FnOnce(&LegacyTable) -> HookResult<R>,
    ) -> HookResult<R> {
        let state = self.hook.pre_drop(table)?;
        match registry(table) {
            Ok(output) => {
                self.hook.commit_drop(table, state, delete_data);
                Ok(output)
            }
            Err(err) => {
                log_rollback_failure(
                    "rollback_drop",
                    table,
                    self.hook.rollback_drop(table, state),
                );
                Err(err)
            }
        }
    }

    /// `ALTER TABLE`: `registry` persists the altered record and returns the
    /// table's partitions.
    ///
    /// # Errors
    ///
    /// Returns the first failure of `pre_alter`, the registry action or
    /// `commit_alter`.
    pub fn alter_table(
        &self,
        table: &mut LegacyTable,
        context: &mut EnvironmentContext,
        registry: impl FnOnce(
            &LegacyTable,
            &EnvironmentContext,
        ) -> HookResult<Vec<LegacyPartition>>,
    ) -> HookResult<()> {
        let state = self.hook.pre_alter(table, context)?;
        match registry(table, context) {
            Ok(partitions) => self.hook.commit_alter(table, &partitions, state),
            Err(err) => {
                log_rollback_failure(
                    "rollback_alter",
                    table,
                    self.hook.rollback_alter(table, state),
                );
                Err(err)
            }
        }
    }

    /// `INSERT`: `write` runs the write job; its tracking metadata is handed
    /// to `commit_insert`.
    ///
    /// # Errors
    ///
    /// Returns the first failure of `pre_insert`, the write or
    /// `commit_insert`.
    pub fn insert_table(
        &self,
        table: &LegacyTable,
        overwrite: bool,
        write: impl FnOnce(&LegacyTable) -> HookResult<JobTracking>,
    ) -> HookResult<()> {
        self.hook.pre_insert(table, overwrite)?;
        let tracking = match write(table) {
            Ok(tracking) => tracking,
            Err(err) => {
                log_rollback_failure(
                    "rollback_insert",
                    table,
                    self.hook.rollback_insert(table, overwrite),
                );
                return Err(err);
            }
        };
        self.hook.commit_insert(table, overwrite, &tracking)
    }
}

/// Converts a statement outcome into the report returned to clients.
#[must_use]
pub fn status_of<T>(result: &Result<T, HookError>) -> StatusReport {
    match result {
        Ok(_) => StatusReport::success(),
        Err(err) => StatusReport::from(err),
    }
}
