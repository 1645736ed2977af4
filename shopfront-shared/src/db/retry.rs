/// Retry policy for connection-level database failures
///
/// Catalogue queries are retried once when the failure looks like a dropped
/// or timed-out connection. Anything else (missing rows, constraint
/// violations, bad input) is returned to the caller straight away.
///
/// # Example
///
/// ```no_run
/// use shopfront_shared::db::retry::{with_retry, RetryPolicy};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let count: i64 = with_retry(&RetryPolicy::default(), "count_products", || {
///     sqlx::query_scalar("SELECT COUNT(*) FROM products").fetch_one(&pool)
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```

use std::future::Future;
use std::io::ErrorKind;
use std::time::Duration;

/// How many times, and how long apart, a transient failure is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Fixed pause before each retry
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }
}

/// Returns true when `err` means the connection was lost, reset or timed out
///
/// Postgres reports these as SQLSTATE class `08` (connection exception) or
/// `57P01`..`57P03` (server shutting down / unavailable).
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(io) => matches!(
            io.kind(),
            ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::ConnectionRefused
                | ErrorKind::BrokenPipe
                | ErrorKind::TimedOut
                | ErrorKind::UnexpectedEof
        ),
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .map(|code| is_transient_sqlstate(&code))
            .unwrap_or(false),
        _ => false,
    }
}

fn is_transient_sqlstate(code: &str) -> bool {
    code.starts_with("08") || matches!(code, "57P01" | "57P02" | "57P03")
}

/// Runs `operation`, retrying it according to `policy` on transient errors
///
/// `operation` is called again from scratch for every attempt, so it must not
/// hold on to a connection from a previous try.
///
/// # Errors
///
/// Returns the first non-transient error, or the last transient error once the
/// retries are used up.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_retries && is_transient(&err) => {
                attempt += 1;

                tracing::warn!(
                    operation = %operation,
                    attempt = attempt,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %err,
                    "Transient database error, retrying"
                );

                tokio::time::sleep(policy.delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
