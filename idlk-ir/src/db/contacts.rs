//! Contact store
//!
//! Query, insert and update primitives over the `contacts` table. Every
//! mutation goes through a [`ContactTx`], so a caller's whole
//! match/merge/insert sequence commits or rolls back as one unit.

use chrono::{DateTime, Utc};
use idlk_common::db::{Contact, LinkPrecedence, CONTACT_COLUMNS};
use idlk_common::{time, Error, Result};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::BTreeSet;

use crate::utils::pool_monitor::{begin_monitored, MonitoredTransaction};

/// Handle to the contact table, cheap to clone
#[derive(Clone)]
pub struct ContactStore {
    pool: SqlitePool,
}

impl ContactStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Open a transaction scope; `caller` labels its timing logs
    pub async fn begin(&self, caller: &'static str) -> Result<ContactTx> {
        Ok(ContactTx {
            tx: begin_monitored(&self.pool, caller).await?,
        })
    }

    /// Load one contact outside any transaction
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Contact>> {
        let sql = format!("SELECT {} FROM contacts WHERE id = ?", CONTACT_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(Contact::from_row).transpose()
    }
}

/// Transaction-scoped contact operations
///
/// Results are always ordered by `(created_at, id)`.
pub struct ContactTx {
    tx: MonitoredTransaction,
}

impl ContactTx {
    /// Contacts whose email equals `email` or whose phone equals `phone_number`
    ///
    /// An absent argument contributes no predicate; both absent matches nothing.
    pub async fn find_by_email_or_phone(
        &mut self,
        email: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<Vec<Contact>> {
        if email.is_none() && phone_number.is_none() {
            return Ok(Vec::new());
        }

        // `column = NULL` is never true, so an unbound side simply drops out
        let sql = format!(
            "SELECT {} FROM contacts WHERE email = ? OR phone_number = ? ORDER BY created_at, id",
            CONTACT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(email)
            .bind(phone_number)
            .fetch_all(self.tx.conn()?)
            .await?;

        rows.iter().map(Contact::from_row).collect()
    }

    pub async fn find_by_ids(&mut self, ids: &BTreeSet<i64>) -> Result<Vec<Contact>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM contacts WHERE id IN (", CONTACT_COLUMNS));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY created_at, id");

        let rows = builder.build().fetch_all(self.tx.conn()?).await?;
        rows.iter().map(Contact::from_row).collect()
    }

    /// The primary `root_id` together with every contact linked to it
    pub async fn find_component(&mut self, root_id: i64) -> Result<Vec<Contact>> {
        let sql = format!(
            "SELECT {} FROM contacts WHERE id = ? OR linked_id = ? ORDER BY created_at, id",
            CONTACT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(root_id)
            .bind(root_id)
            .fetch_all(self.tx.conn()?)
            .await?;

        rows.iter().map(Contact::from_row).collect()
    }

    /// Insert a contact stamped with the current time
    pub async fn insert(
        &mut self,
        email: Option<&str>,
        phone_number: Option<&str>,
        precedence: LinkPrecedence,
        linked_id: Option<i64>,
    ) -> Result<Contact> {
        self.insert_at(email, phone_number, precedence, linked_id, time::now())
            .await
    }

    /// Insert a contact with an explicit creation time
    pub async fn insert_at(
        &mut self,
        email: Option<&str>,
        phone_number: Option<&str>,
        precedence: LinkPrecedence,
        linked_id: Option<i64>,
        created_at: DateTime<Utc>,
    ) -> Result<Contact> {
        if email.is_none() && phone_number.is_none() {
            return Err(Error::NoIdentifyingField);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO contacts (email, phone_number, link_precedence, linked_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(email)
        .bind(phone_number)
        .bind(precedence.as_str())
        .bind(linked_id)
        .bind(time::to_micros(&created_at))
        .bind(time::to_micros(&created_at))
        .execute(self.tx.conn()?)
        .await?;

        // Read back through the stored representation (microsecond precision)
        let stamp = time::from_micros(time::to_micros(&created_at))?;
        Ok(Contact {
            id: result.last_insert_rowid(),
            email: email.map(str::to_string),
            phone_number: phone_number.map(str::to_string),
            link_precedence: precedence,
            linked_id,
            created_at: stamp,
            updated_at: stamp,
        })
    }

    /// Set precedence and parent of one contact
    pub async fn update_precedence(
        &mut self,
        id: i64,
        precedence: LinkPrecedence,
        linked_id: Option<i64>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE contacts SET link_precedence = ?, linked_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(precedence.as_str())
        .bind(linked_id)
        .bind(time::to_micros(&time::now()))
        .bind(id)
        .execute(self.tx.conn()?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("contact {}", id)));
        }
        Ok(())
    }

    /// Point every contact linked to `old_primary_id` at `new_primary_id`
    ///
    /// Returns the number of contacts moved.
    pub async fn reparent_children(&mut self, old_primary_id: i64, new_primary_id: i64) -> Result<u64> {
        let result = sqlx::query("UPDATE contacts SET linked_id = ?, updated_at = ? WHERE linked_id = ?")
            .bind(new_primary_id)
            .bind(time::to_micros(&time::now()))
            .bind(old_primary_id)
            .execute(self.tx.conn()?)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await
    }

    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await
    }
}
