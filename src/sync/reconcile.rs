//! Merges a freshly fetched [`FeedDocument`] into the stored [`FeedRecord`].
//!
//! Reconciliation is pure: no I/O, no failure modes. Metadata follows the
//! document, user flags follow the stored record, and items are additive
//! only. An item already known by identity is left exactly as stored, and
//! an item the document stopped listing is kept.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::domain::{DocumentItem, FeedDocument, FeedRecord, ItemRecord};

/// Result of one reconciliation.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub feed: FeedRecord,
    /// Identities of the items this call added, in document order.
    pub added: Vec<String>,
}

pub fn reconcile(
    existing: Option<&FeedRecord>,
    incoming: &FeedDocument,
    source_url: &str,
) -> Reconciliation {
    reconcile_at(existing, incoming, source_url, Utc::now())
}

/// [`reconcile`] with an explicit clock.
pub fn reconcile_at(
    existing: Option<&FeedRecord>,
    incoming: &FeedDocument,
    source_url: &str,
    now: DateTime<Utc>,
) -> Reconciliation {
    let mut feed = match existing {
        Some(stored) => stored.clone(),
        None => FeedRecord::new(source_url, now),
    };

    feed.title = incoming.title.clone();
    feed.description = incoming.description.clone();
    feed.image_url = incoming.image_url.clone();
    feed.last_updated_at = now;

    let mut known: HashSet<String> = feed.items.iter().map(|item| item.identity.clone()).collect();
    let mut added = Vec::new();

    for doc_item in &incoming.items {
        let identity = match doc_item.stable_guid() {
            Some(guid) => guid.to_string(),
            None => ItemRecord::generated_identity(),
        };

        if !known.insert(identity.clone()) {
            continue;
        }

        feed.items.push(item_record(&feed.identity, identity.clone(), doc_item));
        added.push(identity);
    }

    Reconciliation { feed, added }
}

fn item_record(feed_identity: &str, identity: String, doc_item: &DocumentItem) -> ItemRecord {
    ItemRecord {
        identity,
        feed_identity: feed_identity.to_string(),
        title: doc_item.title.clone(),
        description: doc_item.description.clone(),
        image_url: doc_item.image_url.clone(),
        link: doc_item.link.clone(),
        published_at: doc_item.published_at,
    }
}
