//! Observability infrastructure for Arco.
//!
//! Structured logging with consistent spans. This module provides
//! initialization helpers and span constructors shared by every hook phase.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times;
/// subsequent calls are no-ops.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `arco_metahook=debug`)
///
/// # Example
///
/// ```rust
/// use arco_core::observability::{init_logging, LogFormat};
///
/// init_logging(LogFormat::Pretty);
/// ```
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        // A host process may already own the global subscriber.
        let result = match format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .try_init(),
        };
        if result.is_err() {
            tracing::debug!("global tracing subscriber already installed");
        }
    });
}

/// Creates a span for a table lifecycle phase with standard fields.
///
/// # Example
///
/// ```rust
/// use arco_core::observability::lifecycle_span;
///
/// let span = lifecycle_span("pre_create", "sales", "orders");
/// let _guard = span.enter();
/// // ... run the phase
/// ```
#[must_use]
pub fn lifecycle_span(phase: &str, namespace: &str, table: &str) -> Span {
    tracing::info_span!(
        "lifecycle",
        phase = phase,
        namespace = namespace,
        table = table,
    )
}

/// Creates a span for a write-job commit.
#[must_use]
pub fn job_span(job_id: &str, table: &str) -> Span {
    tracing::info_span!("job_commit", job_id = job_id, table = table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_succeeds() {
        // Should not panic (uses Once internally)
        init_logging(LogFormat::Pretty);
        init_logging(LogFormat::Json); // Second call should be no-op
    }

    #[test]
    fn test_span_helper_creates_span() {
        let span = lifecycle_span("pre_alter", "sales", "orders");
        let _guard = span.enter();
        tracing::info!("test message in span");
    }

    #[test]
    fn test_job_span_creates_span() {
        let span = job_span("job_1700000000000_0001", "sales.orders");
        let _guard = span.enter();
        tracing::info!("job message");
    }
}
