//! Database initialization
//!
//! Opens (creating if needed) the contact database and brings its schema up
//! to date. Every pool connection gets the same pragmas through
//! `SqliteConnectOptions`, so WAL, foreign keys and the busy timeout hold no
//! matter which connection a transaction lands on.

use crate::config::DatabaseConfig;
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Initialize database connection pool and create tables if needed
pub async fn init_database(db_path: &Path, config: &DatabaseConfig) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        // WAL lets readers proceed while one writer commits
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    info!(
        max_connections = config.max_connections,
        busy_timeout_ms = config.busy_timeout_ms,
        "Database pool ready"
    );

    Ok(pool)
}

/// Open a private in-memory database with the full schema
///
/// Limited to one connection that is never recycled: each `sqlite::memory:`
/// connection is its own database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Create base tables and run pending migrations (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_contacts_table(pool).await?;

    crate::db::migrations::run_migrations(pool).await?;
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the contacts table
///
/// Timestamps are UTC microseconds. The CHECK constraints pin down the
/// per-row rules: at least one identifying field, and `linked_id` present
/// exactly when the row is a secondary.
pub async fn create_contacts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT,
            phone_number TEXT,
            link_precedence TEXT NOT NULL CHECK (link_precedence IN ('primary', 'secondary')),
            linked_id INTEGER REFERENCES contacts(id),
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            CHECK (email IS NOT NULL OR phone_number IS NOT NULL),
            CHECK (
                (link_precedence = 'primary' AND linked_id IS NULL)
                OR (link_precedence = 'secondary' AND linked_id IS NOT NULL)
            )
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_contacts_email ON contacts(email)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_contacts_phone_number ON contacts(phone_number)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_contacts_linked_id ON contacts(linked_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_contacts_created_at ON contacts(created_at, id)")
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_database_has_contacts_table() {
        let pool = init_memory_database().await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contacts")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_create_schema_idempotent() {
        let pool = init_memory_database().await.unwrap();
        create_schema(&pool).await.unwrap();
        create_schema(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_contact_without_fields_rejected() {
        let pool = init_memory_database().await.unwrap();

        let result = sqlx::query(
            "INSERT INTO contacts (email, phone_number, link_precedence, created_at, updated_at)
             VALUES (NULL, NULL, 'primary', 1, 1)",
        )
        .execute(&pool)
        .await;

        assert!(result.is_err(), "CHECK should reject a contact with no email or phone");
    }

    #[tokio::test]
    async fn test_secondary_requires_linked_id() {
        let pool = init_memory_database().await.unwrap();

        let result = sqlx::query(
            "INSERT INTO contacts (email, link_precedence, created_at, updated_at)
             VALUES ('a@x.com', 'secondary', 1, 1)",
        )
        .execute(&pool)
        .await;

        assert!(result.is_err(), "CHECK should reject a secondary without linked_id");
    }
}
