//! Identity resolution
//!
//! [`IdentityResolver::resolve`] matches a submitted (email, phone) pair
//! against stored contacts, merges every component it touches under the
//! oldest primary, records the pair if it is new, and returns the resulting
//! [`IdentityView`]. Each attempt runs in a single transaction; transient
//! conflicts re-run the whole attempt.

pub mod fact;
pub mod merge;
pub mod view;

pub use fact::ContactFact;
pub use view::IdentityView;

use idlk_common::config::{NoveltyMode, ResolverConfig};
use idlk_common::db::LinkPrecedence;
use idlk_common::{Error, Result};
use tracing::debug;

use crate::db::{ContactStore, ContactTx};
use crate::utils::db_retry::{retry_transient, RetryPolicy};

/// Resolves contact facts into identity components
pub struct IdentityResolver {
    store: ContactStore,
    policy: RetryPolicy,
    novelty: NoveltyMode,
}

impl IdentityResolver {
    pub fn new(store: ContactStore, config: &ResolverConfig) -> Self {
        Self {
            store,
            policy: RetryPolicy::from_config(config),
            novelty: config.novelty,
        }
    }

    pub fn store(&self) -> &ContactStore {
        &self.store
    }

    /// Resolve `email` / `phone_number` into the identity they belong to
    ///
    /// Blank values count as absent. Fails with
    /// [`Error::NoIdentifyingField`] before touching the store when both
    /// are absent, and with [`Error::Conflict`] when every retry collided.
    pub async fn resolve(&self, email: Option<&str>, phone_number: Option<&str>) -> Result<IdentityView> {
        let fact = ContactFact::new(email, phone_number)?;
        let fact = &fact;

        retry_transient("identity resolve", &self.policy, move || self.resolve_once(fact)).await
    }

    async fn resolve_once(&self, fact: &ContactFact) -> Result<IdentityView> {
        let mut tx = self.store.begin("identity_resolve").await?;
        // An early return drops `tx`, rolling the attempt back
        let view = self.resolve_in(&mut tx, fact).await?;
        tx.commit().await?;
        Ok(view)
    }

    async fn resolve_in(&self, tx: &mut ContactTx, fact: &ContactFact) -> Result<IdentityView> {
        let matched = tx
            .find_by_email_or_phone(fact.email(), fact.phone_number())
            .await?;

        if matched.is_empty() {
            let contact = tx
                .insert(fact.email(), fact.phone_number(), LinkPrecedence::Primary, None)
                .await?;
            debug!(contact_id = contact.id, "Created primary contact");
            return Ok(IdentityView::from_component(&contact, &[]));
        }

        let primaries = merge::collect_primaries(tx, &matched).await?;
        let (root, losers) = primaries
            .split_first()
            .ok_or_else(|| Error::Internal("matched contacts without a primary".to_string()))?;

        for loser in losers {
            merge::merge_into(tx, root, loser).await?;
        }

        let mut component = tx.find_component(root.id).await?;

        if !component.iter().any(|c| fact.is_recorded_by(c, self.novelty)) {
            let contact = tx
                .insert(
                    fact.email(),
                    fact.phone_number(),
                    LinkPrecedence::Secondary,
                    Some(root.id),
                )
                .await?;
            debug!(
                contact_id = contact.id,
                primary_id = root.id,
                "Created secondary contact"
            );
            component.push(contact);
        }

        Ok(IdentityView::from_component(root, &component))
    }
}
