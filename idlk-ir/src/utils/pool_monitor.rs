//! Connection pool monitoring utilities
//!
//! Instrumented transaction wrapper that tracks connection acquisition and
//! hold times, for diagnosing pool saturation and long write locks.

use idlk_common::{Error, Result};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::time::Instant;

/// Monitored transaction wrapper that logs acquisition and release timing
///
/// Dropping it without calling [`commit`](Self::commit) rolls the
/// transaction back.
pub struct MonitoredTransaction {
    tx: Option<Transaction<'static, Sqlite>>,
    caller: &'static str,
    acquired_at: Instant,
}

impl MonitoredTransaction {
    fn new(tx: Transaction<'static, Sqlite>, caller: &'static str, acquired_at: Instant) -> Self {
        Self {
            tx: Some(tx),
            caller,
            acquired_at,
        }
    }

    /// Connection to run statements on inside this transaction
    pub fn conn(&mut self) -> Result<&mut SqliteConnection> {
        match self.tx.as_mut() {
            Some(tx) => Ok(&mut **tx),
            None => Err(Error::Internal(format!(
                "transaction for {} already finished",
                self.caller
            ))),
        }
    }

    /// Commit the transaction and log release timing
    pub async fn commit(mut self) -> Result<()> {
        let held_ms = self.acquired_at.elapsed().as_millis();
        let tx = self
            .tx
            .take()
            .ok_or_else(|| Error::Internal(format!("transaction for {} already finished", self.caller)))?;

        tx.commit().await?;

        if held_ms > 2000 {
            tracing::warn!(
                caller = self.caller,
                held_ms = held_ms,
                "LONG TRANSACTION - write lock held for an extended period"
            );
        } else {
            tracing::debug!(
                caller = self.caller,
                held_ms = held_ms,
                "Connection released (commit)"
            );
        }

        Ok(())
    }

    /// Roll back the transaction and log release timing
    pub async fn rollback(mut self) -> Result<()> {
        let held_ms = self.acquired_at.elapsed().as_millis();
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }

        tracing::debug!(
            caller = self.caller,
            held_ms = held_ms,
            "Connection released (rollback)"
        );
        Ok(())
    }
}

impl Drop for MonitoredTransaction {
    fn drop(&mut self) {
        // Still holding the transaction here means an error path skipped commit;
        // sqlx rolls it back when `tx` drops.
        if self.tx.is_some() {
            tracing::debug!(
                caller = self.caller,
                held_ms = self.acquired_at.elapsed().as_millis(),
                "Connection released (drop, rolled back)"
            );
        }
    }
}

/// Begin a monitored transaction with connection pool timing logs
pub async fn begin_monitored(pool: &SqlitePool, caller: &'static str) -> Result<MonitoredTransaction> {
    let start = Instant::now();

    tracing::trace!(caller = caller, "Connection acquisition requested");

    let tx = pool.begin().await?;

    let wait_ms = start.elapsed().as_millis();
    if wait_ms > 1000 {
        tracing::warn!(
            caller = caller,
            wait_ms = wait_ms,
            "SLOW CONNECTION ACQUISITION - Pool may be saturated (all connections in use)"
        );
    } else {
        tracing::trace!(caller = caller, wait_ms = wait_ms, "Connection acquired");
    }

    Ok(MonitoredTransaction::new(tx, caller, Instant::now()))
}
