//! Component merging
//!
//! When one submission touches several components, the oldest primary
//! becomes the root and every other primary is demoted beneath it. The
//! demoted primary's own secondaries are re-parented onto the root so every
//! secondary keeps pointing straight at a primary.

use idlk_common::db::{Contact, LinkPrecedence};
use idlk_common::{Error, Result};
use std::collections::BTreeSet;
use tracing::info;

use crate::db::ContactTx;

/// Primaries implicated by `matched`, oldest first
///
/// A matched secondary contributes its parent. A parent that reads back as
/// a secondary is followed one more hop; anything deeper is a broken graph.
pub async fn collect_primaries(tx: &mut ContactTx, matched: &[Contact]) -> Result<Vec<Contact>> {
    let mut candidate_ids = BTreeSet::new();
    for contact in matched {
        candidate_ids.insert(parent_of(contact)?);
    }

    let mut primaries = Vec::with_capacity(candidate_ids.len());
    let mut stale_ids = BTreeSet::new();
    for candidate in tx.find_by_ids(&candidate_ids).await? {
        if candidate.is_primary() {
            primaries.push(candidate);
        } else {
            stale_ids.insert(parent_of(&candidate)?);
        }
    }

    for parent in tx.find_by_ids(&stale_ids).await? {
        if !parent.is_primary() {
            return Err(Error::Internal(format!(
                "contact {} is a secondary linked to secondary {}",
                parent.id,
                parent.linked_id.unwrap_or_default()
            )));
        }
        primaries.push(parent);
    }

    primaries.sort_by_key(|c| (c.created_at, c.id));
    primaries.dedup_by_key(|c| c.id);

    if primaries.is_empty() {
        return Err(Error::Internal(format!(
            "no primary found for {} matched contacts",
            matched.len()
        )));
    }
    Ok(primaries)
}

/// Demote `loser` under `root` and flatten its children onto `root`
///
/// Returns the number of children moved.
pub async fn merge_into(tx: &mut ContactTx, root: &Contact, loser: &Contact) -> Result<u64> {
    tx.update_precedence(loser.id, LinkPrecedence::Secondary, Some(root.id))
        .await?;
    let moved = tx.reparent_children(loser.id, root.id).await?;

    info!(
        root_id = root.id,
        demoted_id = loser.id,
        reparented = moved,
        "Merged identity components"
    );
    Ok(moved)
}

fn parent_of(contact: &Contact) -> Result<i64> {
    match contact.link_precedence {
        LinkPrecedence::Primary => Ok(contact.id),
        LinkPrecedence::Secondary => contact
            .linked_id
            .ok_or_else(|| Error::Internal(format!("secondary contact {} has no parent", contact.id))),
    }
}
