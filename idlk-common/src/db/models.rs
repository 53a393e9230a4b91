//! Database models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::{time, Error, Result};

/// Column list matching [`Contact::from_row`]
pub const CONTACT_COLUMNS: &str =
    "id, email, phone_number, link_precedence, linked_id, created_at, updated_at";

/// Position of a contact within its identity component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPrecedence {
    Primary,
    Secondary,
}

impl LinkPrecedence {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkPrecedence::Primary => "primary",
            LinkPrecedence::Secondary => "secondary",
        }
    }
}

impl fmt::Display for LinkPrecedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkPrecedence {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "primary" => Ok(LinkPrecedence::Primary),
            "secondary" => Ok(LinkPrecedence::Secondary),
            other => Err(Error::Internal(format!("Unknown link precedence: {}", other))),
        }
    }
}

/// A single contact fingerprint (email and/or phone number)
///
/// A secondary always carries `linked_id` pointing at the primary of its
/// component; a primary never does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: i64,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub link_precedence: LinkPrecedence,
    pub linked_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    pub fn is_primary(&self) -> bool {
        self.link_precedence == LinkPrecedence::Primary
    }

    /// Id of the primary this contact belongs to (itself, for a primary)
    pub fn primary_id(&self) -> i64 {
        match self.link_precedence {
            LinkPrecedence::Primary => self.id,
            LinkPrecedence::Secondary => self.linked_id.unwrap_or(self.id),
        }
    }

    /// Decode a row selected with [`CONTACT_COLUMNS`]
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        let precedence: String = row.try_get("link_precedence")?;
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            phone_number: row.try_get("phone_number")?,
            link_precedence: precedence.parse()?,
            linked_id: row.try_get("linked_id")?,
            created_at: time::from_micros(row.try_get("created_at")?)?,
            updated_at: time::from_micros(row.try_get("updated_at")?)?,
        })
    }
}
