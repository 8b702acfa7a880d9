//! Insert-commit tests: commit once, abort once on failure, never retry.

use std::collections::HashMap;

use arco_metahook::committer::{JobState, JobTracking};
use arco_metahook::config::DEFAULT_JOB_ID_KEY_PREFIX;
use arco_metahook::{HookConfig, HookError, MetaHook};
use arco_test_utils::{
    CommitterCall, LegacyTableBuilder, ScriptedCommitter, TestContext, assert_validation_error,
    init_test_logging,
};

const JOB: &str = "job_1700000000000_0007";

fn context(committer: ScriptedCommitter) -> TestContext {
    TestContext::build(false, committer, HookConfig::default())
}

#[test]
fn test_successful_commit_runs_once() {
    init_test_logging();
    let ctx = TestContext::standalone();
    let table = LegacyTableBuilder::new("db", "t").build();
    let tracking = ctx.tracking(&table.ident(), JOB);

    ctx.hook
        .commit_insert(&table, false, &tracking)
        .expect("commit");

    let calls = ctx.committer.calls();
    assert_eq!(calls.len(), 1);
    let CommitterCall::Commit(job) = &calls[0] else {
        panic!("expected commit, got {calls:?}");
    };
    assert_eq!(job.job_id.to_string(), JOB);
    assert_eq!(job.table.to_string(), "db.t");
    assert_eq!(job.table_location, "mem://warehouse/db/t");
}

#[test]
fn test_failed_commit_is_aborted_once() {
    let ctx = context(ScriptedCommitter::succeeding().failing_commit("rename failed"));
    let table = LegacyTableBuilder::new("db", "t").build();
    let tracking = ctx.tracking(&table.ident(), JOB);

    let err = ctx
        .hook
        .commit_insert(&table, true, &tracking)
        .expect_err("commit fails");

    match &err {
        HookError::CommitFailed { job_id, source } => {
            assert_eq!(job_id, JOB);
            assert!(source.to_string().contains("rename failed"));
        }
        other => panic!("expected CommitFailed, got {other:?}"),
    }
    assert!(err.is_retryable());
    assert_eq!(ctx.committer.commit_count(), 1);
    assert_eq!(ctx.committer.abort_count(), 1);
    assert!(
        ctx.committer
            .calls()
            .iter()
            .any(|c| matches!(c, CommitterCall::Abort(_, JobState::Failed)))
    );
}

#[test]
fn test_failed_abort_reports_both_errors() {
    let ctx = context(
        ScriptedCommitter::succeeding()
            .failing_commit("rename failed")
            .failing_abort("cleanup failed"),
    );
    let table = LegacyTableBuilder::new("db", "t").build();
    let tracking = ctx.tracking(&table.ident(), JOB);

    let err = ctx
        .hook
        .commit_insert(&table, false, &tracking)
        .expect_err("commit fails");

    let HookError::CommitAndAbortFailed { job_id, commit, abort } = &err else {
        panic!("expected CommitAndAbortFailed, got {err:?}");
    };
    assert_eq!(job_id, JOB);
    assert!(commit.to_string().contains("rename failed"));
    assert!(abort.to_string().contains("cleanup failed"));
    assert!(!err.is_retryable());
    assert_eq!(ctx.committer.commit_count(), 1);
    assert_eq!(ctx.committer.abort_count(), 1);
}

#[test]
fn test_missing_job_id_is_a_validation_error() {
    let ctx = TestContext::standalone();
    let table = LegacyTableBuilder::new("db", "t").build();

    let result = ctx.hook.commit_insert(&table, false, &JobTracking::new());

    assert_validation_error(&result);
    assert!(ctx.committer.calls().is_empty());
}

#[test]
fn test_job_id_of_another_table_is_not_used() {
    let ctx = TestContext::standalone();
    let table = LegacyTableBuilder::new("db", "t").build();
    let other = LegacyTableBuilder::new("db", "other").build();
    let tracking = ctx.tracking(&other.ident(), JOB);

    let result = ctx.hook.commit_insert(&table, false, &tracking);

    assert_validation_error(&result);
}

#[test]
fn test_malformed_job_id_is_a_validation_error() {
    let ctx = TestContext::standalone();
    let table = LegacyTableBuilder::new("db", "t").build();
    let tracking = JobTracking::from(HashMap::from([(
        format!("{DEFAULT_JOB_ID_KEY_PREFIX}.db.t"),
        "attempt_17_0001_m_000000_0".to_string(),
    )]));

    let result = ctx.hook.commit_insert(&table, false, &tracking);

    assert_validation_error(&result);
    assert!(ctx.committer.calls().is_empty());
}

#[test]
fn test_missing_location_is_a_validation_error() {
    let ctx = TestContext::standalone();
    let table = LegacyTableBuilder::new("db", "t").location(None).build();
    let tracking = ctx.tracking(&table.ident(), JOB);

    let result = ctx.hook.commit_insert(&table, false, &tracking);

    assert_validation_error(&result);
    assert!(ctx.committer.calls().is_empty());
}

#[test]
fn test_custom_key_prefix() {
    let config = HookConfig {
        job_id_key_prefix: "engine.job".to_string(),
        ..HookConfig::default()
    };
    let ctx = TestContext::build(false, ScriptedCommitter::succeeding(), config);
    let table = LegacyTableBuilder::new("db", "t").build();
    let tracking = JobTracking::from(HashMap::from([(
        "engine.job.db.t".to_string(),
        JOB.to_string(),
    )]));

    ctx.hook
        .commit_insert(&table, false, &tracking)
        .expect("commit");

    assert_eq!(ctx.committer.commit_count(), 1);
}
