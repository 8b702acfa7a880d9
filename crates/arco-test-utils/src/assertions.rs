//! Custom assertion helpers for integration tests.

use std::fmt::Debug;

use arco_metahook::HookError;

/// Asserts that a result failed with a validation error.
///
/// # Panics
///
/// Panics if the result succeeded or failed with another error.
pub fn assert_validation_error<T: Debug>(result: &Result<T, HookError>) {
    assert!(
        matches!(result, Err(HookError::Validation { .. })),
        "Expected validation error, got {result:?}"
    );
}

/// Asserts that a registry record is unchanged.
///
/// # Panics
///
/// Panics if `before` and `after` differ.
pub fn assert_unchanged<T: PartialEq + Debug>(before: &T, after: &T) {
    assert_eq!(before, after, "Expected record to be left unchanged");
}

/// Asserts that `last` is the final path in `deleted`.
///
/// # Panics
///
/// Panics if `deleted` is empty or ends with another path.
pub fn assert_deleted_last(deleted: &[String], last: &str) {
    assert_eq!(
        deleted.last().map(String::as_str),
        Some(last),
        "Expected {last} to be deleted last, deletions were {deleted:?}"
    );
}
