//! Database schema migrations
//!
//! Versioned, idempotent schema changes applied after the base tables exist.
//! Applied versions are recorded in `schema_version`.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - databases in the field already ran them
//! 2. **Always add new migrations** - one function per schema change
//! 3. **Check before altering** - every migration must be safe to re-run

use crate::{Error, Result};
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Name of the unique index guarding against duplicate fingerprints
pub const FINGERPRINT_INDEX: &str = "idx_contacts_fingerprint";

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    Ok(())
}

/// Migration v1: unique (email, phone_number) fingerprint
///
/// Two concurrent first sightings of the same fingerprint must not both
/// become primaries. NULLs are folded to '' because SQLite treats NULLs as
/// distinct inside UNIQUE indexes.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    let duplicates: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM (
            SELECT 1 FROM contacts
            GROUP BY IFNULL(email, ''), IFNULL(phone_number, '')
            HAVING COUNT(*) > 1
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if duplicates > 0 {
        return Err(Error::Internal(format!(
            "Migration v1: contacts table holds {} duplicated (email, phone_number) fingerprints; \
             resolve them before upgrading",
            duplicates
        )));
    }

    let sql = format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {} ON contacts(IFNULL(email, ''), IFNULL(phone_number, ''))",
        FINGERPRINT_INDEX
    );
    sqlx::query(&sql).execute(pool).await?;

    info!("  ✓ Created {} unique index", FINGERPRINT_INDEX);
    Ok(())
}
