//! Decides when a sync cycle warrants a "new articles" notification.
//!
//! At most one request is produced per feed per cycle, however many items
//! arrived.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use serde::Deserialize;

use crate::config::NotificationConfig;
use crate::domain::{FeedRecord, ItemRecord};
use crate::notify::{NotificationRequest, FEED_ID_KEY};

/// How an item after the sync is matched against the items before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemComparison {
    /// Match on title text. Two different articles sharing a title are
    /// treated as the same item, and untitled items match each other.
    #[default]
    Title,
    /// Match on item identity (GUID or generated id).
    Identity,
}

impl ItemComparison {
    fn key<'a>(&self, item: &'a ItemRecord) -> Option<&'a str> {
        match self {
            ItemComparison::Title => item.title.as_deref(),
            ItemComparison::Identity => Some(item.identity.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationDecider {
    comparison: ItemComparison,
    body: String,
    trigger_delay: Duration,
}

impl NotificationDecider {
    pub fn new(comparison: ItemComparison, body: impl Into<String>, trigger_delay: Duration) -> Self {
        Self {
            comparison,
            body: body.into(),
            trigger_delay,
        }
    }

    pub fn from_config(config: &NotificationConfig) -> Self {
        Self::new(config.comparison, config.body.clone(), config.delay())
    }

    pub fn comparison(&self) -> ItemComparison {
        self.comparison
    }

    /// Items in `after` with no counterpart in `before`.
    pub fn new_items<'a>(&self, before: &[ItemRecord], after: &'a [ItemRecord]) -> Vec<&'a ItemRecord> {
        let known: HashSet<Option<&str>> = before.iter().map(|item| self.comparison.key(item)).collect();

        after
            .iter()
            .filter(|item| !known.contains(&self.comparison.key(item)))
            .collect()
    }

    pub fn decide(
        &self,
        before: &[ItemRecord],
        after: &[ItemRecord],
        feed: &FeedRecord,
    ) -> Vec<NotificationRequest> {
        if !feed.is_notifications_enabled {
            return Vec::new();
        }

        let fresh = self.new_items(before, after);
        if fresh.is_empty() {
            return Vec::new();
        }

        tracing::debug!(
            feed = %feed.identity,
            new_items = fresh.len(),
            comparison = ?self.comparison,
            "new items detected"
        );

        let mut payload = BTreeMap::new();
        payload.insert(FEED_ID_KEY.to_string(), feed.identity.clone());

        vec![NotificationRequest {
            title: feed.display_title().to_string(),
            body: self.body.clone(),
            payload,
            trigger_delay: self.trigger_delay,
        }]
    }
}

impl Default for NotificationDecider {
    fn default() -> Self {
        Self::from_config(&NotificationConfig::default())
    }
}
