//! Database Retry Logic
//!
//! Re-runs a whole transactional operation when SQLite reports a transient
//! conflict: a busy/locked database, a stale WAL read snapshot, or a
//! uniqueness violation raised by a concurrent writer.
//!
//! **Algorithm:**
//! 1. Attempt operation
//! 2. If successful, return result
//! 3. If transient error:
//!    a. If attempts remain: log WARN, back off (exponential + jitter), retry
//!    b. Otherwise: log ERROR, return [`Error::Conflict`]
//! 4. If other error: return error immediately (no retry)

use idlk_common::config::ResolverConfig;
use idlk_common::{Error, Result};
use rand::Rng;
use std::future::Future;
use std::time::{Duration, Instant};

/// SQLite result codes that indicate lock contention (primary and extended)
const TRANSIENT_SQLITE_CODES: &[&str] = &[
    "5",   // SQLITE_BUSY
    "6",   // SQLITE_LOCKED
    "261", // SQLITE_BUSY_RECOVERY
    "262", // SQLITE_LOCKED_SHAREDCACHE
    "517", // SQLITE_BUSY_SNAPSHOT
    "773", // SQLITE_BUSY_TIMEOUT
];

/// Bounded retry schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}

/// Whether `err` is worth retrying from the start of the transaction
pub fn is_transient(err: &Error) -> bool {
    let db_err = match err {
        Error::Database(sqlx::Error::Database(db_err)) => db_err,
        _ => return false,
    };

    if db_err.is_unique_violation() {
        return true;
    }

    if let Some(code) = db_err.code() {
        if TRANSIENT_SQLITE_CODES.contains(&code.as_ref()) {
            return true;
        }
    }

    let message = db_err.message();
    message.contains("database is locked") || message.contains("database table is locked")
}

/// Retry an operation with exponential backoff while it fails transiently.
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., "identity resolve")
/// * `policy` - Attempt bound and backoff range
/// * `operation` - Closure producing a fresh attempt each call
pub async fn retry_transient<F, Fut, T>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let start_time = Instant::now();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;
    let mut backoff = policy.initial_backoff;

    loop {
        attempt += 1;

        if attempt > 1 {
            tracing::debug!(operation = operation_name, attempt, "Retrying database operation");
        }

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    let elapsed_ms = start_time.elapsed().as_millis();
                    if elapsed_ms > 2000 {
                        tracing::warn!(
                            operation = operation_name,
                            attempt,
                            elapsed_ms = elapsed_ms,
                            "Database operation succeeded after significant retry period (>2s)"
                        );
                    } else {
                        tracing::debug!(
                            operation = operation_name,
                            attempt,
                            elapsed_ms = elapsed_ms,
                            "Database operation succeeded after retry"
                        );
                    }
                }
                return Ok(result);
            }
            Err(err) => {
                if !is_transient(&err) {
                    return Err(err);
                }

                let elapsed = start_time.elapsed();

                if attempt >= max_attempts {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = elapsed.as_millis(),
                        error = %err,
                        "Database operation failed: retry attempts exhausted"
                    );
                    return Err(Error::Conflict(format!(
                        "{} still conflicting after {} attempts ({} ms elapsed): {}",
                        operation_name,
                        attempt,
                        elapsed.as_millis(),
                        err
                    )));
                }

                let delay = with_jitter(backoff);

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    elapsed_ms = elapsed.as_millis(),
                    backoff_ms = delay.as_millis(),
                    error = %err,
                    "Transient database conflict, will retry after backoff"
                );

                tokio::time::sleep(delay).await;

                backoff = (backoff * 2).min(policy.max_backoff);
            }
        }
    }
}

/// Add up to 50% random jitter so colliding callers fall out of lockstep
fn with_jitter(base: Duration) -> Duration {
    let half_ms = (base.as_millis() / 2) as u64;
    if half_ms == 0 {
        return base;
    }
    base + Duration::from_millis(rand::thread_rng().gen_range(0..=half_ms))
}
