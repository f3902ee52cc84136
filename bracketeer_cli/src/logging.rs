//! Structured logging configuration.
//!
//! The library logs through the `log` facade; those records are picked up
//! by the tracing subscriber installed here.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Slow-operation threshold for whole commands
const SLOW_OPERATION_MS: u64 = 1000;

/// Slow-query threshold for single storage calls
const SLOW_QUERY_MS: u64 = 100;

/// Initialize structured logging
///
/// Log levels come from `RUST_LOG` (default `info,sqlx=warn`). Output goes
/// to stderr so command output on stdout stays clean.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::debug!("Structured logging initialized");
}

/// Log performance metric
///
/// # Arguments
///
/// * `operation` - Operation name
/// * `duration_ms` - Duration in milliseconds
/// * `metadata` - Additional metadata
pub fn log_performance(operation: &str, duration_ms: u64, metadata: Option<&str>) {
    if duration_ms > SLOW_OPERATION_MS {
        tracing::warn!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "PERFORMANCE: Slow operation"
        );
    } else {
        tracing::debug!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "Performance metric"
        );
    }
}

/// Log a storage call
///
/// # Arguments
///
/// * `operation` - Repository operation, e.g. `read_matches`
/// * `tournament_id` - Tournament the call was about, if any
/// * `duration_ms` - Duration in milliseconds
pub fn log_database_operation(operation: &str, tournament_id: Option<i64>, duration_ms: u64) {
    if duration_ms > SLOW_QUERY_MS {
        tracing::warn!(
            operation = operation,
            tournament_id = tournament_id,
            duration_ms = duration_ms,
            "Slow database operation detected"
        );
    } else {
        tracing::debug!(
            operation = operation,
            tournament_id = tournament_id,
            duration_ms = duration_ms,
            "Database operation"
        );
    }
}
