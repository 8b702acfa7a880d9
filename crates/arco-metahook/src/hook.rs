//! The metastore hook capability.
//!
//! Every lifecycle operation runs as `pre_* -> registry action -> commit_*`,
//! with `rollback_*` replacing `commit_*` when the statement fails. The state
//! returned by `pre_*` is moved into exactly one of `commit_*` or
//! `rollback_*`, so per-statement data never outlives its statement.

use crate::committer::JobTracking;
use crate::error::HookResult;
use crate::legacy::{EnvironmentContext, LegacyPartition, LegacyTable};

/// Hook invoked by the registry around table lifecycle operations.
pub trait MetaHook: Send + Sync {
    /// State carried from `pre_create` to `commit_create`/`rollback_create`.
    type CreateState;
    /// State carried from `pre_drop` to `commit_drop`/`rollback_drop`.
    type DropState;
    /// State carried from `pre_alter` to `commit_alter`/`rollback_alter`.
    type AlterState;

    /// Runs before the registry creates `table`; may rewrite the record.
    ///
    /// # Errors
    ///
    /// Any error aborts the create before the registry is touched.
    fn pre_create(&self, table: &mut LegacyTable) -> HookResult<Self::CreateState>;

    /// Runs after the registry created `table`.
    ///
    /// # Errors
    ///
    /// Returns catalog failures.
    fn commit_create(&self, table: &LegacyTable, state: Self::CreateState) -> HookResult<()>;

    /// Runs when the create failed after `pre_create`.
    ///
    /// # Errors
    ///
    /// Implementations may report cleanup failures.
    fn rollback_create(&self, _table: &LegacyTable, _state: Self::CreateState) -> HookResult<()> {
        Ok(())
    }

    /// Runs before the registry drops `table`.
    ///
    /// # Errors
    ///
    /// Any error aborts the drop before the registry is touched.
    fn pre_drop(&self, table: &LegacyTable) -> HookResult<Self::DropState>;

    /// Runs after the registry dropped `table`. Cannot fail: the registry
    /// record is already gone.
    fn commit_drop(&self, table: &LegacyTable, state: Self::DropState, delete_data: bool);

    /// Runs when the drop failed after `pre_drop`.
    ///
    /// # Errors
    ///
    /// Implementations may report cleanup failures.
    fn rollback_drop(&self, _table: &LegacyTable, _state: Self::DropState) -> HookResult<()> {
        Ok(())
    }

    /// Runs before the registry alters `table`; may rewrite the record and
    /// the environment context.
    ///
    /// # Errors
    ///
    /// Any error aborts the alter before the registry is touched.
    fn pre_alter(
        &self,
        table: &mut LegacyTable,
        context: &mut EnvironmentContext,
    ) -> HookResult<Self::AlterState>;

    /// Runs after the registry altered `table`; `partitions` are the
    /// table's registry partitions.
    ///
    /// # Errors
    ///
    /// Returns catalog, IO and validation failures.
    fn commit_alter(
        &self,
        table: &LegacyTable,
        partitions: &[LegacyPartition],
        state: Self::AlterState,
    ) -> HookResult<()>;

    /// Runs when the alter failed after `pre_alter`.
    ///
    /// # Errors
    ///
    /// Implementations may report cleanup failures.
    fn rollback_alter(&self, _table: &LegacyTable, _state: Self::AlterState) -> HookResult<()> {
        Ok(())
    }

    /// Runs before a write job targets `table`.
    ///
    /// # Errors
    ///
    /// Any error aborts the insert.
    fn pre_insert(&self, _table: &LegacyTable, _overwrite: bool) -> HookResult<()> {
        Ok(())
    }

    /// Runs after the write job finished writing to `table`.
    ///
    /// # Errors
    ///
    /// Returns commit protocol failures.
    fn commit_insert(
        &self,
        table: &LegacyTable,
        overwrite: bool,
        tracking: &JobTracking,
    ) -> HookResult<()>;

    /// Runs when the write job failed.
    ///
    /// # Errors
    ///
    /// Implementations may report cleanup failures.
    fn rollback_insert(&self, _table: &LegacyTable, _overwrite: bool) -> HookResult<()> {
        Ok(())
    }
}
