//! Time limits for storage calls.
//!
//! Every PostgreSQL round trip made by the repository goes through
//! [`with_timeout`] so a stalled connection surfaces as an error.

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// Default timeout for single queries
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Error type for bounded storage calls
#[derive(Debug, thiserror::Error)]
pub enum TimeoutError {
    /// Operation did not finish in time
    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    /// Operation finished with a database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for bounded storage calls
pub type TimeoutResult<T> = Result<T, TimeoutError>;

/// Run a database future, failing if it takes longer than `duration`
///
/// # Example
///
/// ```no_run
/// use bracketeer::db::timeouts::{DEFAULT_QUERY_TIMEOUT, with_timeout};
/// # use sqlx::PgPool;
/// # async fn example(pool: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
///
/// let row = with_timeout(
///     DEFAULT_QUERY_TIMEOUT,
///     sqlx::query("SELECT name FROM tournaments WHERE id = $1")
///         .bind(1_i64)
///         .fetch_optional(pool),
/// )
/// .await?;
///
/// # Ok(())
/// # }
/// ```
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> TimeoutResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match timeout(duration, future).await {
        Ok(result) => result.map_err(TimeoutError::Database),
        Err(_) => Err(TimeoutError::Timeout(duration)),
    }
}
