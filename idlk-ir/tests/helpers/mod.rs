//! Shared fixtures for idlk-ir integration tests
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use idlk_common::config::{DatabaseConfig, NoveltyMode, ResolverConfig};
use idlk_common::db::{init_database, init_memory_database, Contact, LinkPrecedence, CONTACT_COLUMNS};
use idlk_ir::db::ContactStore;
use idlk_ir::resolver::IdentityResolver;
use std::collections::HashMap;
use tempfile::TempDir;

/// Single-connection in-memory store
pub async fn memory_store() -> ContactStore {
    ContactStore::new(init_memory_database().await.expect("memory database"))
}

/// On-disk store with a full connection pool; keep the TempDir alive
pub async fn disk_store() -> (TempDir, ContactStore) {
    let dir = TempDir::new().expect("temp dir");
    let pool = init_database(&dir.path().join("idlk.db"), &DatabaseConfig::default())
        .await
        .expect("disk database");
    (dir, ContactStore::new(pool))
}

pub fn resolver(store: ContactStore, novelty: NoveltyMode) -> IdentityResolver {
    let config = ResolverConfig {
        novelty,
        ..ResolverConfig::default()
    };
    IdentityResolver::new(store, &config)
}

/// Resolver that tolerates heavy contention
pub fn patient_resolver(store: ContactStore) -> IdentityResolver {
    let config = ResolverConfig {
        max_attempts: 50,
        initial_backoff_ms: 5,
        max_backoff_ms: 100,
        novelty: NoveltyMode::Exact,
    };
    IdentityResolver::new(store, &config)
}

pub fn ts(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

pub async fn seed_primary(
    store: &ContactStore,
    email: Option<&str>,
    phone: Option<&str>,
    created_at: DateTime<Utc>,
) -> Contact {
    let mut tx = store.begin("seed").await.unwrap();
    let contact = tx
        .insert_at(email, phone, LinkPrecedence::Primary, None, created_at)
        .await
        .unwrap();
    tx.commit().await.unwrap();
    contact
}

pub async fn seed_secondary(
    store: &ContactStore,
    email: Option<&str>,
    phone: Option<&str>,
    primary_id: i64,
    created_at: DateTime<Utc>,
) -> Contact {
    let mut tx = store.begin("seed").await.unwrap();
    let contact = tx
        .insert_at(email, phone, LinkPrecedence::Secondary, Some(primary_id), created_at)
        .await
        .unwrap();
    tx.commit().await.unwrap();
    contact
}

pub async fn all_contacts(store: &ContactStore) -> Vec<Contact> {
    let sql = format!("SELECT {} FROM contacts ORDER BY created_at, id", CONTACT_COLUMNS);
    let rows = sqlx::query(&sql).fetch_all(store.pool()).await.unwrap();
    rows.iter().map(|row| Contact::from_row(row).unwrap()).collect()
}

/// Check every graph rule over the whole table
///
/// Depth-1 forest, one primary per component which is its oldest member,
/// and no email or phone shared between components.
pub async fn assert_graph_invariants(store: &ContactStore) {
    let contacts = all_contacts(store).await;
    let by_id: HashMap<i64, &Contact> = contacts.iter().map(|c| (c.id, c)).collect();

    for contact in &contacts {
        assert!(
            contact.email.is_some() || contact.phone_number.is_some(),
            "contact {} has no identifying field",
            contact.id
        );

        match contact.link_precedence {
            LinkPrecedence::Primary => assert!(contact.linked_id.is_none()),
            LinkPrecedence::Secondary => {
                let parent_id = contact.linked_id.expect("secondary without parent");
                let parent = by_id.get(&parent_id).expect("dangling parent");
                assert!(
                    parent.is_primary(),
                    "contact {} links to secondary {}",
                    contact.id,
                    parent_id
                );
                assert!(
                    (parent.created_at, parent.id) < (contact.created_at, contact.id),
                    "primary {} is younger than its secondary {}",
                    parent.id,
                    contact.id
                );
            }
        }
    }

    let mut owner_of_email: HashMap<&str, i64> = HashMap::new();
    let mut owner_of_phone: HashMap<&str, i64> = HashMap::new();
    for contact in &contacts {
        let owner = contact.primary_id();
        if let Some(email) = contact.email.as_deref() {
            let seen = *owner_of_email.entry(email).or_insert(owner);
            assert_eq!(seen, owner, "email {} shared by components {} and {}", email, seen, owner);
        }
        if let Some(phone) = contact.phone_number.as_deref() {
            let seen = *owner_of_phone.entry(phone).or_insert(owner);
            assert_eq!(seen, owner, "phone {} shared by components {} and {}", phone, seen, owner);
        }
    }
}
