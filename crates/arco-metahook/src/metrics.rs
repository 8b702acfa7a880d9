//! Metrics for lifecycle phases and job commits.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};

/// Phase duration histogram.
pub const METAHOOK_PHASE_DURATION: &str = "metahook_phase_duration_seconds";

/// Catalog tables created or adopted at create time.
pub const METAHOOK_TABLES_CREATED_TOTAL: &str = "metahook_tables_created_total";

/// In-place migrations by outcome.
pub const METAHOOK_MIGRATIONS_TOTAL: &str = "metahook_migrations_total";

/// Errors absorbed while cleaning up dropped tables.
pub const METAHOOK_DROP_CLEANUP_FAILURES_TOTAL: &str = "metahook_drop_cleanup_failures_total";

/// Job commits by outcome.
pub const METAHOOK_JOB_COMMITS_TOTAL: &str = "metahook_job_commits_total";

static METRICS_REGISTERED: OnceLock<()> = OnceLock::new();

/// Registers metric descriptions.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn register_metrics() {
    METRICS_REGISTERED.get_or_init(|| {
        describe_histogram!(
            METAHOOK_PHASE_DURATION,
            "Duration of metastore hook phases in seconds"
        );
        describe_counter!(
            METAHOOK_TABLES_CREATED_TOTAL,
            "Total number of catalog tables created or adopted"
        );
        describe_counter!(
            METAHOOK_MIGRATIONS_TOTAL,
            "Total number of in-place table migrations"
        );
        describe_counter!(
            METAHOOK_DROP_CLEANUP_FAILURES_TOTAL,
            "Total number of errors suppressed during drop cleanup"
        );
        describe_counter!(
            METAHOOK_JOB_COMMITS_TOTAL,
            "Total number of write job commits"
        );
    });
}

/// Records the duration and outcome of a phase.
pub fn record_phase(phase: &'static str, ok: bool, elapsed: Duration) {
    register_metrics();
    let labels = [
        ("phase", phase.to_string()),
        ("outcome", if ok { "ok" } else { "error" }.to_string()),
    ];
    histogram!(METAHOOK_PHASE_DURATION, &labels).record(elapsed.as_secs_f64());
}

/// Records a table creation; `mode` is `created` or `adopted`.
pub fn record_table_created(mode: &'static str, native: bool) {
    register_metrics();
    let labels = [("mode", mode.to_string()), ("native", native.to_string())];
    counter!(METAHOOK_TABLES_CREATED_TOTAL, &labels).increment(1);
}

/// Records a migration; `outcome` is `staged`, `imported` or `rejected`.
pub fn record_migration(outcome: &'static str) {
    register_metrics();
    counter!(METAHOOK_MIGRATIONS_TOTAL, "outcome" => outcome).increment(1);
}

/// Records an error absorbed by drop cleanup.
pub fn record_drop_cleanup_failure(native: bool) {
    register_metrics();
    counter!(METAHOOK_DROP_CLEANUP_FAILURES_TOTAL, "native" => native.to_string()).increment(1);
}

/// Records a job commit; `outcome` is `committed`, `aborted` or
/// `abort_failed`.
pub fn record_job_commit(outcome: &'static str) {
    register_metrics();
    counter!(METAHOOK_JOB_COMMITS_TOTAL, "outcome" => outcome).increment(1);
}
